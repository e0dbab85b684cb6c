// Copyright 2025-Present Datadog, Inc. https://www.datadoghq.com/
// SPDX-License-Identifier: Apache-2.0

use crate::address::Address;
use crate::arch::FrameLayout;
use crate::memory::MemoryReader;
use crate::symbols::{ClosestSymbol, SymbolLookup};
use std::fmt;

/// Borrowed handle on the services attached to one target.
///
/// Frames keep a copy of the session, never ownership of what it points to: the memory reader
/// and symbol lookup must outlive every frame derived from them, which the `'a` lifetime
/// enforces. Any serialization of access to the target is the reader's business.
#[derive(Clone, Copy)]
pub struct Session<'a> {
    memory: &'a dyn MemoryReader,
    symbols: &'a dyn SymbolLookup,
    layout: FrameLayout,
}

impl<'a> Session<'a> {
    pub fn new(
        memory: &'a dyn MemoryReader,
        symbols: &'a dyn SymbolLookup,
        layout: FrameLayout,
    ) -> Self {
        Self {
            memory,
            symbols,
            layout,
        }
    }

    pub fn layout(&self) -> FrameLayout {
        self.layout
    }

    /// Reads the address stored `offset_units` address-size units away from `base`.
    pub fn address_at(&self, base: Address, offset_units: i64) -> Option<Address> {
        base.get_address_at(self.memory, &self.layout, offset_units)
    }

    /// Nearest-symbol lookup straight from the symbol service, with no object-file parsing.
    pub fn raw_nearest_symbol(&self, addr: Address) -> Option<ClosestSymbol> {
        self.symbols.nearest_symbol_before(addr.value())
    }
}

impl fmt::Debug for Session<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Session")
            .field("layout", &self.layout)
            .finish_non_exhaustive()
    }
}
