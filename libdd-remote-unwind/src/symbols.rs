// Copyright 2025-Present Datadog, Inc. https://www.datadoghq.com/
// SPDX-License-Identifier: Apache-2.0

//! Native symbol lookup without object-file parsing.
//!
//! Symbols here only decorate frames for display. The sender algorithm never consults them.

use anyhow::Context;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;
use symbolic_common::Name;
use symbolic_demangle::{Demangle, DemangleOptions};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClosestSymbol {
    pub name: String,
    /// Distance from the start of the symbol.
    pub offset: u64,
}

impl fmt::Display for ClosestSymbol {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.offset == 0 {
            f.write_str(&self.name)
        } else {
            write!(f, "{}+{:#x}", self.name, self.offset)
        }
    }
}

pub trait SymbolLookup {
    /// Nearest symbol starting at or before `addr`. Having no symbol is not an error.
    fn nearest_symbol_before(&self, addr: u64) -> Option<ClosestSymbol>;
}

impl<T: SymbolLookup + ?Sized> SymbolLookup for &T {
    fn nearest_symbol_before(&self, addr: u64) -> Option<ClosestSymbol> {
        (**self).nearest_symbol_before(addr)
    }
}

/// Lookup used when symbolization is unavailable or disabled.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoSymbols;

impl SymbolLookup for NoSymbols {
    fn nearest_symbol_before(&self, _addr: u64) -> Option<ClosestSymbol> {
        None
    }
}

#[derive(Debug, thiserror::Error)]
pub enum SymbolMapError {
    #[error("I/O error reading symbol map: {0}")]
    Io(#[from] std::io::Error),
    #[error("Malformed symbol map line {line}: {reason}")]
    Malformed { line: usize, reason: &'static str },
}

#[derive(Debug, Clone, PartialEq, Eq)]
struct SymbolEntry {
    name: String,
    size: Option<u64>,
}

/// Address-ordered symbol table.
#[derive(Debug, Clone, Default)]
pub struct SymbolTable {
    entries: BTreeMap<u64, SymbolEntry>,
}

impl SymbolTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// A later symbol at the same start address replaces the earlier one, matching how JITs
    /// recycle code space.
    pub fn insert(&mut self, start: u64, size: Option<u64>, name: impl Into<String>) {
        let entry = SymbolEntry {
            name: name.into(),
            size: size.filter(|s| *s != 0),
        };
        self.entries.insert(start, entry);
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Parses the perf map text format JIT runtimes write to `/tmp/perf-<pid>.map`:
    /// one `<hex start> <hex size> <name>` entry per line.
    pub fn from_perf_map(reader: impl BufRead) -> Result<Self, SymbolMapError> {
        let mut table = Self::new();
        for (idx, line) in reader.lines().enumerate() {
            let line = line?;
            let line = line.trim();
            if line.is_empty() {
                continue;
            }
            let (start, size, name) =
                parse_perf_map_line(line).map_err(|reason| SymbolMapError::Malformed {
                    line: idx + 1,
                    reason,
                })?;
            table.insert(start, Some(size), name);
        }
        Ok(table)
    }

    pub fn load_perf_map(path: impl AsRef<Path>) -> anyhow::Result<Self> {
        let path = path.as_ref();
        let file = File::open(path).with_context(|| format!("Failed to open {}", path.display()))?;
        let table = Self::from_perf_map(BufReader::new(file))
            .with_context(|| format!("Failed to parse {}", path.display()))?;
        tracing::debug!(path = %path.display(), symbols = table.len(), "loaded perf map");
        Ok(table)
    }

    pub fn load_perf_map_for_pid(pid: i32) -> anyhow::Result<Self> {
        Self::load_perf_map(format!("/tmp/perf-{pid}.map"))
    }
}

impl SymbolLookup for SymbolTable {
    fn nearest_symbol_before(&self, addr: u64) -> Option<ClosestSymbol> {
        let (start, entry) = self.entries.range(..=addr).next_back()?;
        let offset = addr - start;
        if entry.size.is_some_and(|size| offset >= size) {
            return None;
        }
        Some(ClosestSymbol {
            name: entry.name.clone(),
            offset,
        })
    }
}

fn parse_hex(s: &str) -> Option<u64> {
    let digits = s
        .strip_prefix("0x")
        .or_else(|| s.strip_prefix("0X"))
        .unwrap_or(s);
    u64::from_str_radix(digits, 16).ok()
}

fn parse_perf_map_line(line: &str) -> Result<(u64, u64, &str), &'static str> {
    let mut parts = line.splitn(3, char::is_whitespace);
    let start = parts.next().and_then(parse_hex).ok_or("invalid start address")?;
    let size = parts.next().and_then(parse_hex).ok_or("invalid size")?;
    let name = parts
        .next()
        .map(str::trim)
        .filter(|name| !name.is_empty())
        .ok_or("missing symbol name")?;
    Ok((start, size, name))
}

/// Returns the demangled form of `name`, or `None` when it is not mangled.
pub fn demangle_symbol(name: &str) -> Option<String> {
    Name::from(name)
        .demangle(DemangleOptions::name_only())
        .filter(|demangled| demangled != name)
}
