// Copyright 2025-Present Datadog, Inc. https://www.datadoghq.com/
// SPDX-License-Identifier: Apache-2.0

use crate::symbols::demangle_symbol;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct StackTrace {
    pub format: String,
    pub frames: Vec<StackFrame>,
    /// The walk was cut short by the frame limit.
    pub incomplete: bool,
    /// Why the last frame has no sender.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub termination: Option<String>,
}

const FORMAT_STRING: &str = "Datadog Remote Unwind 1.0";

impl StackTrace {
    pub fn empty() -> Self {
        Self {
            format: FORMAT_STRING.to_string(),
            frames: vec![],
            incomplete: false,
            termination: None,
        }
    }

    pub fn from_frames(
        frames: Vec<StackFrame>,
        incomplete: bool,
        termination: Option<String>,
    ) -> Self {
        Self {
            format: FORMAT_STRING.to_string(),
            frames,
            incomplete,
            termination,
        }
    }

    pub fn demangle_names(&mut self) {
        for frame in &mut self.frames {
            frame.demangle_name();
        }
    }
}

impl Default for StackTrace {
    fn default() -> Self {
        Self::empty()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema, Default)]
pub struct StackFrame {
    // Absolute addresses
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ip: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fp: Option<String>,

    // Symbol Info
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub function: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub symbol_offset: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mangled_name: Option<String>,

    // Additional Info
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub comments: Vec<String>,
}

impl StackFrame {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn demangle_name(&mut self) {
        if let Some(name) = self.function.take() {
            match demangle_symbol(&name) {
                Some(demangled) => {
                    self.mangled_name = Some(name);
                    self.function = Some(demangled);
                }
                None => {
                    self.function = Some(name);
                }
            }
        }
    }
}
