// Copyright 2025-Present Datadog, Inc. https://www.datadoghq.com/
// SPDX-License-Identifier: Apache-2.0

#![cfg_attr(not(test), deny(clippy::panic))]
#![cfg_attr(not(test), deny(clippy::unwrap_used))]
#![cfg_attr(not(test), deny(clippy::expect_used))]
#![cfg_attr(not(test), deny(clippy::todo))]
#![cfg_attr(not(test), deny(clippy::unimplemented))]

//! Frame-pointer unwinding of live or dumped processes.
//!
//! Given a thread's registers, the unwinder reconstructs its native call chain by following
//! the frame-pointer linked save areas on the stack. It never executes code in the target and
//! never parses object or debug files: memory is read through a [`MemoryReader`] and frames
//! are decorated through a [`SymbolLookup`], both supplied by the caller.
//!
//! The target's memory is untrusted. Every step validates the frame pointer before and after
//! reading it, so walks over corrupt or foreign stacks end early instead of looping or
//! faulting. See [`FramePointerFrame::sender_outcome`] for the rules.
//!
//! ```
//! use libdd_remote_unwind::*;
//!
//! // riscv64: caller fp at fp - 16, return address at fp - 8.
//! let mut memory = SnapshotMemory::new();
//! memory.add_words(0x1ff0, &[0x3000, 0x4000])?;
//! let session = Session::new(&memory, &NoSymbols, Arch::Riscv64.layout());
//!
//! let thread = RegisterSnapshot::new(0x1000, 0x2000, 0x5000);
//! let frame = thread.initial_frame(session).unwrap();
//! let caller = frame.sender(&thread).unwrap();
//! assert_eq!(caller.frame_base(), Address::new(0x3000));
//! assert_eq!(caller.pc(), Address::new(0x4000).unwrap());
//! # Ok::<(), anyhow::Error>(())
//! ```

mod address;
mod arch;
mod cframe;
mod configuration;
mod context;
mod memory;
mod session;
mod stacktrace;
mod symbols;
mod walker;

pub use address::Address;
pub use arch::{Arch, FrameLayout};
pub use cframe::{CFrame, FramePointerFrame, Termination};
pub use configuration::{UnwindConfiguration, DEFAULT_MAX_FRAMES, MAX_FRAMES_LIMIT};
pub use context::{Register, RegisterSnapshot, ThreadContext};
#[cfg(target_os = "linux")]
pub use memory::ProcessMemory;
pub use memory::{MemoryError, MemoryReader, SnapshotMemory};
pub use session::Session;
pub use stacktrace::{StackFrame, StackTrace};
pub use symbols::{
    demangle_symbol, ClosestSymbol, NoSymbols, SymbolLookup, SymbolMapError, SymbolTable,
};
pub use walker::{StackWalker, Walk};
