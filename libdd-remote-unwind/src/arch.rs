// Copyright 2025-Present Datadog, Inc. https://www.datadoghq.com/
// SPDX-License-Identifier: Apache-2.0

//! Per-architecture frame link layouts.
//!
//! Every supported architecture links frames the same way: the frame pointer anchors a save
//! area holding the caller's frame pointer and the return address at fixed offsets. Only the
//! offsets, the word size and the stack alignment differ, so the sender algorithm is written
//! once against [`FrameLayout`].

use crate::address::Address;
use crate::context::Register;
use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FrameLayout {
    /// Size in bytes of a target address.
    pub address_size: usize,
    /// Offset, in address-size units from the frame pointer, of the saved caller frame pointer.
    pub link_offset: i64,
    /// Offset, in address-size units from the frame pointer, of the return address.
    pub return_address_offset: i64,
    /// Required frame pointer alignment, in address-size units.
    pub alignment_units: u64,
}

impl FrameLayout {
    /// The prologue stores `ra` at `fp - 8` and the caller's `fp` at `fp - 16`.
    pub const RISCV64: FrameLayout = FrameLayout {
        address_size: 8,
        link_offset: -2,
        return_address_offset: -1,
        alignment_units: 2,
    };

    /// Same save area as riscv64. Slots are read as full 8-byte words.
    pub const RISCV32: FrameLayout = FrameLayout {
        address_size: 8,
        link_offset: -2,
        return_address_offset: -1,
        alignment_units: 2,
    };

    /// x29 points at the saved {x29, x30} pair.
    pub const AARCH64: FrameLayout = FrameLayout {
        address_size: 8,
        link_offset: 0,
        return_address_offset: 1,
        alignment_units: 2,
    };

    /// rbp points at the saved rbp, the return address sits right above it.
    pub const X86_64: FrameLayout = FrameLayout {
        address_size: 8,
        link_offset: 0,
        return_address_offset: 1,
        alignment_units: 2,
    };

    pub fn alignment_bytes(&self) -> u64 {
        self.alignment_units
            .saturating_mul(self.address_size as u64)
    }

    /// A zero alignment never matches, so a malformed layout stops every walk.
    pub fn is_aligned(&self, addr: Address) -> bool {
        addr.value()
            .checked_rem(self.alignment_bytes())
            .is_some_and(|rem| rem == 0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Arch {
    Riscv64,
    Riscv32,
    Aarch64,
    X86_64,
}

impl Arch {
    pub const ALL: [Arch; 4] = [Arch::Riscv64, Arch::Riscv32, Arch::Aarch64, Arch::X86_64];

    pub const fn layout(self) -> FrameLayout {
        match self {
            Arch::Riscv64 => FrameLayout::RISCV64,
            Arch::Riscv32 => FrameLayout::RISCV32,
            Arch::Aarch64 => FrameLayout::AARCH64,
            Arch::X86_64 => FrameLayout::X86_64,
        }
    }

    /// The architecture this crate was compiled for, if it has a frame-pointer layout.
    pub const fn host() -> Option<Arch> {
        if cfg!(target_arch = "x86_64") {
            Some(Arch::X86_64)
        } else if cfg!(target_arch = "aarch64") {
            Some(Arch::Aarch64)
        } else if cfg!(target_arch = "riscv64") {
            Some(Arch::Riscv64)
        } else if cfg!(target_arch = "riscv32") {
            Some(Arch::Riscv32)
        } else {
            None
        }
    }

    /// ABI name of the register backing `register`.
    pub const fn register_name(self, register: Register) -> &'static str {
        match (self, register) {
            (Arch::Riscv64 | Arch::Riscv32, Register::StackPointer) => "sp",
            (Arch::Riscv64 | Arch::Riscv32, Register::FramePointer) => "fp",
            (Arch::Riscv64 | Arch::Riscv32, Register::ProgramCounter) => "pc",
            (Arch::Aarch64, Register::StackPointer) => "sp",
            (Arch::Aarch64, Register::FramePointer) => "x29",
            (Arch::Aarch64, Register::ProgramCounter) => "pc",
            (Arch::X86_64, Register::StackPointer) => "rsp",
            (Arch::X86_64, Register::FramePointer) => "rbp",
            (Arch::X86_64, Register::ProgramCounter) => "rip",
        }
    }
}

impl fmt::Display for Arch {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Arch::Riscv64 => "riscv64",
            Arch::Riscv32 => "riscv32",
            Arch::Aarch64 => "aarch64",
            Arch::X86_64 => "x86_64",
        };
        f.write_str(name)
    }
}
