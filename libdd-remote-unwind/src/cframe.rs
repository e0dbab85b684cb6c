// Copyright 2025-Present Datadog, Inc. https://www.datadoghq.com/
// SPDX-License-Identifier: Apache-2.0

//! Native call frames and the frame-pointer sender algorithm.
//!
//! A frame is an immutable `(fp, pc)` snapshot. Finding its caller reads two words from the
//! frame's save area and applies a fixed sequence of gates; any gate failing ends the walk.
//! The gates make the walk terminate on corrupt or foreign stacks: the frame pointer has to be
//! on the live stack, aligned, and strictly increasing from one frame to the next.

use crate::address::Address;
use crate::context::ThreadContext;
use crate::session::Session;
use crate::symbols::ClosestSymbol;
use std::fmt;
use tracing::debug;

/// One level of a native call stack.
pub trait CFrame: Sized {
    /// The executing (or, for callers, about to resume) instruction.
    fn pc(&self) -> Address;

    /// Base used to locate locals of this frame.
    fn frame_base(&self) -> Option<Address>;

    /// Nearest symbol at or before [`CFrame::pc`], for display.
    fn nearest_symbol(&self) -> Option<ClosestSymbol>;

    /// The caller's frame, or `None` at the end of the chain.
    ///
    /// Reaching the outermost frame and detecting a corrupt chain look the same here.
    fn sender(&self, thread: &dyn ThreadContext) -> Option<Self>;
}

/// Why no sender frame could be produced.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum Termination {
    #[error("frame pointer is null")]
    NullFramePointer,
    #[error("thread context has no stack pointer")]
    MissingStackPointer,
    #[error("frame pointer {fp} is below the stack pointer {sp}")]
    BelowStackPointer { fp: Address, sp: Address },
    #[error("frame pointer {fp} is not aligned to {alignment} bytes")]
    Misaligned { fp: Address, alignment: u64 },
    #[error("caller frame pointer of frame {fp} is unreadable")]
    UnreadableLink { fp: Address },
    #[error("caller frame pointer {next} does not advance past {fp}")]
    NonIncreasingLink { fp: Address, next: Address },
    #[error("return address of frame {fp} is unreadable")]
    UnreadableReturnAddress { fp: Address },
}

/// A frame found by following saved frame pointers.
#[derive(Clone, Copy)]
pub struct FramePointerFrame<'a> {
    session: Session<'a>,
    fp: Option<Address>,
    pc: Address,
}

impl<'a> FramePointerFrame<'a> {
    /// Always succeeds. The frame is only checked when its sender is computed.
    pub fn new(session: Session<'a>, fp: Option<Address>, pc: Address) -> Self {
        Self { session, fp, pc }
    }

    /// Computes the caller frame, reporting why the chain ends when it does.
    ///
    /// Performs no memory reads unless the frame pointer is non-null, at or above the stack
    /// pointer and aligned; then at most two. If a live target changes its stack between
    /// the two reads the result is unspecified.
    pub fn sender_outcome(&self, thread: &dyn ThreadContext) -> Result<Self, Termination> {
        let fp = self.fp.ok_or(Termination::NullFramePointer)?;
        let sp = thread
            .stack_pointer()
            .ok_or(Termination::MissingStackPointer)?;
        if fp.less_than(sp) {
            return Err(Termination::BelowStackPointer { fp, sp });
        }

        let layout = self.session.layout();
        if !layout.is_aligned(fp) {
            return Err(Termination::Misaligned {
                fp,
                alignment: layout.alignment_bytes(),
            });
        }

        let next_fp = self
            .session
            .address_at(fp, layout.link_offset)
            .ok_or(Termination::UnreadableLink { fp })?;
        if next_fp.less_than_or_equal(fp) {
            return Err(Termination::NonIncreasingLink { fp, next: next_fp });
        }

        let next_pc = self
            .session
            .address_at(fp, layout.return_address_offset)
            .ok_or(Termination::UnreadableReturnAddress { fp })?;

        Ok(Self::new(self.session, Some(next_fp), next_pc))
    }
}

impl CFrame for FramePointerFrame<'_> {
    fn pc(&self) -> Address {
        self.pc
    }

    fn frame_base(&self) -> Option<Address> {
        self.fp
    }

    fn nearest_symbol(&self) -> Option<ClosestSymbol> {
        self.session.raw_nearest_symbol(self.pc)
    }

    fn sender(&self, thread: &dyn ThreadContext) -> Option<Self> {
        self.sender_outcome(thread)
            .inspect_err(|reason| debug!(pc = %self.pc, %reason, "no sender frame"))
            .ok()
    }
}

impl PartialEq for FramePointerFrame<'_> {
    fn eq(&self, other: &Self) -> bool {
        self.fp == other.fp && self.pc == other.pc
    }
}

impl Eq for FramePointerFrame<'_> {}

impl fmt::Debug for FramePointerFrame<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FramePointerFrame")
            .field("fp", &self.fp)
            .field("pc", &self.pc)
            .finish()
    }
}
