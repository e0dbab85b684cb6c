// Copyright 2025-Present Datadog, Inc. https://www.datadoghq.com/
// SPDX-License-Identifier: Apache-2.0

//! Frame-chain driver: follows senders from a thread's innermost frame.
//!
//! The sender gates already guarantee termination, since frame pointers must strictly
//! increase. The frame limit bounds how long a well-formed but very deep chain is followed.

use crate::cframe::{CFrame, FramePointerFrame, Termination};
use crate::configuration::UnwindConfiguration;
use crate::context::ThreadContext;
use crate::session::Session;
use crate::stacktrace::{StackFrame, StackTrace};
use tracing::{debug, warn};

#[derive(Debug, Clone)]
pub struct StackWalker<'a> {
    session: Session<'a>,
    config: UnwindConfiguration,
}

impl<'a> StackWalker<'a> {
    /// Fails when the session was set up for a different architecture than `config`.
    pub fn new(session: Session<'a>, config: &UnwindConfiguration) -> anyhow::Result<Self> {
        anyhow::ensure!(
            session.layout() == config.arch().layout(),
            "Session frame layout does not match the configured {} architecture",
            config.arch()
        );
        Ok(Self {
            session,
            config: config.clone(),
        })
    }

    /// Yields `root` and then each sender, innermost first.
    pub fn walk<'w>(
        &self,
        thread: &'w dyn ThreadContext,
        root: FramePointerFrame<'a>,
    ) -> Walk<'a, 'w> {
        Walk {
            thread,
            next: Some(root),
            remaining: self.config.max_frames(),
            termination: None,
            truncated: false,
        }
    }

    pub fn collect_trace(
        &self,
        thread: &dyn ThreadContext,
        root: FramePointerFrame<'a>,
    ) -> StackTrace {
        let mut walk = self.walk(thread, root);
        let frames: Vec<StackFrame> = walk.by_ref().map(|f| self.describe(&f)).collect();
        debug!(
            frames = frames.len(),
            truncated = walk.truncated(),
            "collected native stack trace"
        );
        let termination = walk.termination().map(|t| t.to_string());
        let mut trace = StackTrace::from_frames(frames, walk.truncated(), termination);
        if self.config.demangle_names() {
            trace.demangle_names();
        }
        trace
    }

    fn describe(&self, frame: &FramePointerFrame<'a>) -> StackFrame {
        let mut out = StackFrame {
            ip: Some(frame.pc().to_string()),
            fp: frame.frame_base().map(|fp| fp.to_string()),
            ..StackFrame::new()
        };
        if self.config.resolve_symbols() {
            match frame.nearest_symbol() {
                Some(symbol) => {
                    out.function = Some(symbol.name);
                    out.symbol_offset = Some(symbol.offset);
                }
                None => out.comments.push("No symbol found for ip".to_string()),
            }
        }
        out
    }
}

/// Iterator over the frames of one thread. See [`StackWalker::walk`].
pub struct Walk<'a, 'w> {
    thread: &'w dyn ThreadContext,
    next: Option<FramePointerFrame<'a>>,
    remaining: usize,
    termination: Option<Termination>,
    truncated: bool,
}

impl Walk<'_, '_> {
    /// Why the chain ended, once it has.
    pub fn termination(&self) -> Option<Termination> {
        self.termination
    }

    /// Whether the frame limit stopped the walk while senders remained.
    pub fn truncated(&self) -> bool {
        self.truncated
    }
}

impl<'a> Iterator for Walk<'a, '_> {
    type Item = FramePointerFrame<'a>;

    fn next(&mut self) -> Option<Self::Item> {
        let frame = self.next.take()?;
        if self.remaining == 0 {
            warn!(pc = %frame.pc(), "frame limit reached, stack trace truncated");
            self.truncated = true;
            return None;
        }
        self.remaining -= 1;

        match frame.sender_outcome(self.thread) {
            Ok(sender) => self.next = Some(sender),
            Err(reason) => {
                debug!(pc = %frame.pc(), %reason, "end of frame chain");
                self.termination = Some(reason);
            }
        }
        Some(frame)
    }
}
