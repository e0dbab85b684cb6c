// Copyright 2025-Present Datadog, Inc. https://www.datadoghq.com/
// SPDX-License-Identifier: Apache-2.0

use crate::arch::Arch;
use serde::{Deserialize, Serialize};

/// Default bound on the number of frames collected for one thread.
pub const DEFAULT_MAX_FRAMES: usize = 128;

/// Largest accepted frame bound.
pub const MAX_FRAMES_LIMIT: usize = 4096;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UnwindConfiguration {
    arch: Arch,
    // Bounds chains that are long but well-formed; malformed ones stop on their own.
    max_frames: usize,
    // Whether to demangle symbol names in stack traces
    demangle_names: bool,
    resolve_symbols: bool,
}

impl UnwindConfiguration {
    pub fn new(
        arch: Arch,
        max_frames: usize,
        demangle_names: bool,
        resolve_symbols: bool,
    ) -> anyhow::Result<Self> {
        anyhow::ensure!(max_frames > 0, "max_frames must be positive");
        anyhow::ensure!(
            max_frames <= MAX_FRAMES_LIMIT,
            "max_frames ({max_frames}) exceeds the limit of {MAX_FRAMES_LIMIT}"
        );
        anyhow::ensure!(
            resolve_symbols || !demangle_names,
            "Cannot demangle names without resolving symbols"
        );
        Ok(Self {
            arch,
            max_frames,
            demangle_names,
            resolve_symbols,
        })
    }

    /// Deserializes and validates a configuration.
    pub fn from_json(json: &str) -> anyhow::Result<Self> {
        use anyhow::Context;
        let raw: Self = serde_json::from_str(json).context("Invalid unwind configuration")?;
        Self::new(
            raw.arch,
            raw.max_frames,
            raw.demangle_names,
            raw.resolve_symbols,
        )
    }

    pub fn arch(&self) -> Arch {
        self.arch
    }

    pub fn max_frames(&self) -> usize {
        self.max_frames
    }

    pub fn demangle_names(&self) -> bool {
        self.demangle_names
    }

    pub fn resolve_symbols(&self) -> bool {
        self.resolve_symbols
    }

    pub fn set_arch(&mut self, arch: Arch) {
        self.arch = arch;
    }

    pub fn set_max_frames(&mut self, max_frames: usize) -> anyhow::Result<()> {
        *self = Self::new(
            self.arch,
            max_frames,
            self.demangle_names,
            self.resolve_symbols,
        )?;
        Ok(())
    }
}

impl Default for UnwindConfiguration {
    fn default() -> Self {
        Self {
            arch: Arch::host().unwrap_or(Arch::Riscv64),
            max_frames: DEFAULT_MAX_FRAMES,
            demangle_names: true,
            resolve_symbols: true,
        }
    }
}
