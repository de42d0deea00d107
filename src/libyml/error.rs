// Copyright notice and licensing information.
// These lines indicate the copyright of the software and its licensing terms.
// SPDX-License-Identifier: Apache-2.0 OR MIT indicates dual licensing under Apache 2.0 or MIT licenses.
// Copyright © 2026 yaml_bind, Schema-Driven YAML Binding for Rust. All rights reserved.

//! Problem extraction from the raw parser and emitter states.

use crate::error::{new, Error, ErrorImpl, Location};
use std::ffi::{c_char, CStr};
use std::fmt::{self, Display};
#[allow(clippy::unsafe_removed_from_name)]
use libyml as sys;

/// A position in the YAML input.
#[derive(Copy, Clone, Debug, Default)]
pub(crate) struct Mark {
    /// Byte index, 0-based.
    pub index: u64,
    /// Line, 0-based.
    pub line: u64,
    /// Column, 0-based.
    pub column: u64,
}

impl Mark {
    pub(crate) fn from_sys(sys: sys::YamlMarkT) -> Self {
        Mark {
            index: sys.index,
            line: sys.line,
            column: sys.column,
        }
    }

    pub(crate) fn location(self) -> Location {
        Location::new(self.index, self.line, self.column)
    }
}

impl Display for Mark {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.line != 0 || self.column != 0 {
            write!(f, "line {} column {}", self.line + 1, self.column + 1)
        } else {
            write!(f, "position {}", self.index)
        }
    }
}

unsafe fn problem_string(problem: *const c_char, fallback: &str) -> String {
    if problem.is_null() {
        fallback.to_string()
    } else {
        unsafe { CStr::from_ptr(problem) }
            .to_string_lossy()
            .into_owned()
    }
}

/// Builds the crate error for a failed parser.
///
/// # Safety
///
/// `parser` must point at an initialised parser state.
pub(crate) unsafe fn parse_error(parser: *const sys::YamlParserT) -> Error {
    let problem = unsafe {
        problem_string(
            (&(*parser)).problem.cast::<c_char>(),
            "parser failed but reported no problem",
        )
    };
    let mark = Mark::from_sys(unsafe { (&(*parser)).problem_mark });
    new(ErrorImpl::ParserError {
        problem,
        location: mark.location(),
    })
}

/// Builds the crate error for a failed emitter.
///
/// # Safety
///
/// `emitter` must point at an initialised emitter state.
pub(crate) unsafe fn emit_error(emitter: *const sys::YamlEmitterT) -> Error {
    let problem = unsafe {
        problem_string(
            (&(*emitter)).problem.cast::<c_char>(),
            "emitter failed but reported no problem",
        )
    };
    new(ErrorImpl::EmitterError { problem })
}
