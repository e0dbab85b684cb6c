// Copyright 2025-Present Datadog, Inc. https://www.datadoghq.com/
// SPDX-License-Identifier: Apache-2.0

use crate::address::Address;
use crate::cframe::FramePointerFrame;
use crate::session::Session;
use serde::{Deserialize, Serialize};

/// The registers the unwinder cares about, independent of their per-architecture names.
/// See [`crate::Arch::register_name`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Register {
    StackPointer,
    FramePointer,
    ProgramCounter,
}

/// Read-only view of a target thread's registers at the moment of unwinding.
pub trait ThreadContext {
    fn register_as_address(&self, register: Register) -> Option<Address>;

    fn stack_pointer(&self) -> Option<Address> {
        self.register_as_address(Register::StackPointer)
    }
}

impl<T: ThreadContext + ?Sized> ThreadContext for &T {
    fn register_as_address(&self, register: Register) -> Option<Address> {
        (**self).register_as_address(register)
    }
}

/// Registers captured from a stopped thread, a signal context or a core dump note.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct RegisterSnapshot {
    pub sp: Option<Address>,
    pub fp: Option<Address>,
    pub pc: Option<Address>,
}

impl RegisterSnapshot {
    pub fn new(sp: u64, fp: u64, pc: u64) -> Self {
        Self {
            sp: Address::new(sp),
            fp: Address::new(fp),
            pc: Address::new(pc),
        }
    }

    /// The innermost frame of the thread, or `None` when no program counter was captured.
    pub fn initial_frame<'a>(&self, session: Session<'a>) -> Option<FramePointerFrame<'a>> {
        Some(FramePointerFrame::new(session, self.fp, self.pc?))
    }
}

impl ThreadContext for RegisterSnapshot {
    fn register_as_address(&self, register: Register) -> Option<Address> {
        match register {
            Register::StackPointer => self.sp,
            Register::FramePointer => self.fp,
            Register::ProgramCounter => self.pc,
        }
    }
}
