// Copyright 2025-Present Datadog, Inc. https://www.datadoghq.com/
// SPDX-License-Identifier: Apache-2.0

//! Access to target memory.
//!
//! Readers must accept arbitrary, possibly bogus, addresses and report failure as a value: the
//! unwinder walks untrusted stacks and must never take the host down with it.

use std::collections::BTreeMap;

#[derive(Debug, thiserror::Error)]
pub enum MemoryError {
    #[error("No mapped memory at {addr:#x}")]
    Unmapped { addr: u64 },
    #[error("Short read at {addr:#x}: wanted {wanted} bytes, got {got}")]
    ShortRead { addr: u64, wanted: usize, got: usize },
    #[error("Unsupported word size: {0}")]
    UnsupportedWordSize(usize),
    #[cfg(target_os = "linux")]
    #[error("Failed to read target memory at {addr:#x}: {source}")]
    Os {
        addr: u64,
        #[source]
        source: nix::Error,
    },
}

pub trait MemoryReader {
    /// Reads one little-endian word of `size` bytes (4 or 8) at `addr`.
    fn read_word(&self, addr: u64, size: usize) -> Result<u64, MemoryError>;
}

impl<T: MemoryReader + ?Sized> MemoryReader for &T {
    fn read_word(&self, addr: u64, size: usize) -> Result<u64, MemoryError> {
        (**self).read_word(addr, size)
    }
}

fn check_word_size(size: usize) -> Result<(), MemoryError> {
    match size {
        4 | 8 => Ok(()),
        _ => Err(MemoryError::UnsupportedWordSize(size)),
    }
}

fn decode_word(bytes: &[u8]) -> Result<u64, MemoryError> {
    match bytes.len() {
        4 => {
            let mut buf = [0u8; 4];
            buf.copy_from_slice(bytes);
            Ok(u32::from_le_bytes(buf) as u64)
        }
        8 => {
            let mut buf = [0u8; 8];
            buf.copy_from_slice(bytes);
            Ok(u64::from_le_bytes(buf))
        }
        len => Err(MemoryError::UnsupportedWordSize(len)),
    }
}

/// A frozen image of some regions of target memory, e.g. the stack captured in a core dump.
#[derive(Debug, Clone, Default)]
pub struct SnapshotMemory {
    regions: BTreeMap<u64, Vec<u8>>,
}

impl SnapshotMemory {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_region(&mut self, base: u64, bytes: Vec<u8>) -> anyhow::Result<()> {
        anyhow::ensure!(!bytes.is_empty(), "Empty region at {base:#x}");
        let end = base
            .checked_add(bytes.len() as u64)
            .ok_or_else(|| anyhow::anyhow!("Region at {base:#x} overflows the address space"))?;

        if let Some((prev_base, prev)) = self.regions.range(..=base).next_back() {
            anyhow::ensure!(
                prev_base + prev.len() as u64 <= base,
                "Region at {base:#x} overlaps region at {prev_base:#x}"
            );
        }
        if let Some((next_base, _)) = self.regions.range(base..).next() {
            anyhow::ensure!(
                end <= *next_base,
                "Region at {base:#x} overlaps region at {next_base:#x}"
            );
        }
        self.regions.insert(base, bytes);
        Ok(())
    }

    /// Adds a region holding `words` as consecutive little-endian 8-byte values.
    pub fn add_words(&mut self, base: u64, words: &[u64]) -> anyhow::Result<()> {
        let bytes = words.iter().flat_map(|w| w.to_le_bytes()).collect();
        self.add_region(base, bytes)
    }

    pub fn region_count(&self) -> usize {
        self.regions.len()
    }

    fn region_containing(&self, addr: u64) -> Option<(u64, &[u8])> {
        let (base, bytes) = self.regions.range(..=addr).next_back()?;
        let offset = addr - base;
        (offset < bytes.len() as u64).then_some((*base, bytes.as_slice()))
    }
}

impl MemoryReader for SnapshotMemory {
    fn read_word(&self, addr: u64, size: usize) -> Result<u64, MemoryError> {
        check_word_size(size)?;
        let (base, bytes) = self
            .region_containing(addr)
            .ok_or(MemoryError::Unmapped { addr })?;
        let offset = (addr - base) as usize;
        let available = bytes.len() - offset;
        if available < size {
            return Err(MemoryError::ShortRead {
                addr,
                wanted: size,
                got: available,
            });
        }
        decode_word(&bytes[offset..offset + size])
    }
}

#[cfg(target_os = "linux")]
pub use process::ProcessMemory;

#[cfg(target_os = "linux")]
mod process {
    use super::{check_word_size, decode_word, MemoryError, MemoryReader};
    use nix::sys::uio::{process_vm_readv, RemoteIoVec};
    use nix::unistd::Pid;
    use std::io::IoSliceMut;

    /// Reads the memory of a live process with `process_vm_readv`, one syscall per word.
    ///
    /// Requires the same permissions as ptrace. The target keeps running unless the caller
    /// stops it, so consecutive reads may observe different stack contents.
    #[derive(Debug, Clone, Copy)]
    pub struct ProcessMemory {
        pid: Pid,
    }

    impl ProcessMemory {
        pub fn new(pid: i32) -> Self {
            Self {
                pid: Pid::from_raw(pid),
            }
        }

        pub fn pid(&self) -> i32 {
            self.pid.as_raw()
        }
    }

    impl MemoryReader for ProcessMemory {
        fn read_word(&self, addr: u64, size: usize) -> Result<u64, MemoryError> {
            check_word_size(size)?;
            let base = usize::try_from(addr).map_err(|_| MemoryError::Unmapped { addr })?;
            let mut buf = [0u8; 8];
            let got = {
                let mut local = [IoSliceMut::new(&mut buf[..size])];
                let remote = [RemoteIoVec { base, len: size }];
                process_vm_readv(self.pid, &mut local, &remote)
                    .map_err(|source| MemoryError::Os { addr, source })?
            };
            if got != size {
                return Err(MemoryError::ShortRead {
                    addr,
                    wanted: size,
                    got,
                });
            }
            decode_word(&buf[..size])
        }
    }
}
