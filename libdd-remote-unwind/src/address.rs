// Copyright 2025-Present Datadog, Inc. https://www.datadoghq.com/
// SPDX-License-Identifier: Apache-2.0

//! Target-address values.
//!
//! An [`Address`] is a location in the *target* address space, never a pointer that can be
//! dereferenced by the host. Absent/null addresses are expressed as `Option<Address>`, so an
//! `Address` is always non-zero.

use crate::arch::FrameLayout;
use crate::memory::MemoryReader;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::num::NonZeroU64;
use tracing::trace;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Address(NonZeroU64);

impl Address {
    /// Returns `None` for the null address.
    pub const fn new(value: u64) -> Option<Self> {
        match NonZeroU64::new(value) {
            Some(v) => Some(Self(v)),
            None => None,
        }
    }

    pub const fn value(self) -> u64 {
        self.0.get()
    }

    pub fn less_than(self, other: Address) -> bool {
        self < other
    }

    pub fn less_than_or_equal(self, other: Address) -> bool {
        self <= other
    }

    /// Byte displacement. Overflow or landing on zero yields `None`.
    pub fn add_bytes(self, offset: i64) -> Option<Address> {
        Address::new(self.value().checked_add_signed(offset)?)
    }

    /// Displacement in units of the target's address size.
    pub fn add_units(self, units: i64, address_size: usize) -> Option<Address> {
        let size = i64::try_from(address_size).ok()?;
        self.add_bytes(units.checked_mul(size)?)
    }

    /// Reads the address-sized value stored at `self + offset_units * address_size`.
    ///
    /// A failed read and a stored null pointer are both reported as `None`; callers cannot
    /// continue in either case.
    pub fn get_address_at(
        self,
        memory: &dyn MemoryReader,
        layout: &FrameLayout,
        offset_units: i64,
    ) -> Option<Address> {
        let slot = self.add_units(offset_units, layout.address_size)?;
        match memory.read_word(slot.value(), layout.address_size) {
            Ok(word) => Address::new(word),
            Err(error) => {
                trace!(%slot, %error, "target memory read failed");
                None
            }
        }
    }
}

impl fmt::Display for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:#018x}", self.value())
    }
}

impl fmt::LowerHex for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::LowerHex::fmt(&self.value(), f)
    }
}

impl From<Address> for u64 {
    fn from(addr: Address) -> Self {
        addr.value()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::memory::SnapshotMemory;

    fn addr(value: u64) -> Address {
        Address::new(value).unwrap()
    }

    #[test]
    fn test_null_is_absent() {
        assert_eq!(Address::new(0), None);
        assert_eq!(Address::new(0x10).map(Address::value), Some(0x10));
    }

    #[test]
    fn test_ordering_is_unsigned() {
        let low = addr(0x1000);
        let high = addr(0xffff_ffff_ffff_f000);
        assert!(low.less_than(high));
        assert!(!high.less_than(low));
        assert!(low.less_than_or_equal(low));
        assert!(!low.less_than(low));
    }

    #[test]
    fn test_arithmetic_in_units() {
        let base = addr(0x2000);
        assert_eq!(base.add_units(-2, 8), Some(addr(0x1ff0)));
        assert_eq!(base.add_units(1, 4), Some(addr(0x2004)));
        assert_eq!(base.add_units(-0x400, 8), None);
        assert_eq!(addr(u64::MAX - 4).add_units(1, 8), None);
        assert_eq!(addr(8).add_bytes(-16), None);
    }

    #[test]
    fn test_get_address_at() {
        let mut memory = SnapshotMemory::new();
        memory.add_words(0x1ff0, &[0x3000, 0]).unwrap();
        let fp = addr(0x2000);
        let layout = FrameLayout::RISCV64;

        assert_eq!(fp.get_address_at(&memory, &layout, -2), Some(addr(0x3000)));
        // A stored null pointer and an unmapped slot are indistinguishable.
        assert_eq!(fp.get_address_at(&memory, &layout, -1), None);
        assert_eq!(fp.get_address_at(&memory, &layout, 4), None);
    }

    #[test]
    fn test_display() {
        assert_eq!(addr(0x4000).to_string(), "0x0000000000004000");
        assert_eq!(format!("{:#x}", addr(0x4000)), "0x4000");
    }
}
