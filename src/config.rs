// Copyright notice and licensing information.
// These lines indicate the copyright of the software and its licensing terms.
// SPDX-License-Identifier: Apache-2.0 OR MIT indicates dual licensing under Apache 2.0 or MIT licenses.
// Copyright © 2026 yaml_bind, Schema-Driven YAML Binding for Rust. All rights reserved.

//! Per-call configuration: allocator, logging, behaviour flags.

use std::ffi::c_void;
use std::fmt;
use std::ops::BitOr;
use std::ptr;

/// The client allocator callback.
///
/// Must follow standard realloc semantics: a null `ptr` allocates,
/// `new_size == 0` frees and returns null, anything else resizes and
/// returns the (possibly moved) region, or null on exhaustion.
pub type AllocFn = unsafe fn(ctx: *mut c_void, ptr: *mut c_void, new_size: usize) -> *mut c_void;

/// The client logger callback; receives pre-filtered messages.
pub type LogFn = fn(level: LogLevel, ctx: *mut c_void, args: fmt::Arguments<'_>);

/// Message severity, ordered least to most severe.
#[derive(Copy, Clone, Debug, PartialEq, Eq, PartialOrd, Ord)]
pub enum LogLevel {
    /// Engine tracing.
    Debug,
    /// Informational messages.
    Info,
    /// Normal but significant conditions.
    Notice,
    /// Recoverable problems, e.g. ignored extra documents.
    Warning,
    /// Failures; accompanies every returned error.
    Error,
}

impl LogLevel {
    fn to_log(self) -> log::Level {
        match self {
            LogLevel::Debug => log::Level::Debug,
            LogLevel::Info | LogLevel::Notice => log::Level::Info,
            LogLevel::Warning => log::Level::Warn,
            LogLevel::Error => log::Level::Error,
        }
    }
}

/// Behaviour flags applying to a whole call.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct ConfigFlags(u32);

impl ConfigFlags {
    /// No flags.
    pub const NONE: ConfigFlags = ConfigFlags(0);
    /// Consume mapping keys with no schema field instead of failing.
    pub const IGNORE_UNKNOWN_KEYS: ConfigFlags = ConfigFlags(1 << 0);
    /// Match names case-insensitively unless a schema value overrides.
    pub const CASE_INSENSITIVE: ConfigFlags = ConfigFlags(1 << 1);
    /// Reject documents containing aliases.
    pub const NO_ALIAS: ConfigFlags = ConfigFlags(1 << 2);
    /// Log a warning for every key consumed under
    /// [`IGNORE_UNKNOWN_KEYS`](Self::IGNORE_UNKNOWN_KEYS).
    pub const IGNORED_KEY_WARNING: ConfigFlags = ConfigFlags(1 << 3);
    /// Enable extended schema kinds (unions).
    pub const EXTENDED: ConfigFlags = ConfigFlags(1 << 4);

    /// Whether every flag in `other` is set in `self`.
    pub const fn contains(self, other: ConfigFlags) -> bool {
        self.0 & other.0 == other.0
    }

    /// The union of two flag sets, usable in constant expressions.
    pub const fn union(self, other: ConfigFlags) -> ConfigFlags {
        ConfigFlags(self.0 | other.0)
    }
}

impl BitOr for ConfigFlags {
    type Output = ConfigFlags;

    fn bitor(self, rhs: ConfigFlags) -> ConfigFlags {
        self.union(rhs)
    }
}

/// The per-call configuration record.
///
/// `Default` wires a realloc-backed allocator and routes log output to
/// the `log` crate at `Warning` and above.
#[derive(Copy, Clone, Debug)]
pub struct Config {
    /// Allocator for every heap region the engine owns.
    pub allocator: AllocFn,
    /// Opaque context handed back to `allocator`.
    pub alloc_ctx: *mut c_void,
    /// Logger; `None` routes messages to the `log` crate.
    pub logger: Option<LogFn>,
    /// Opaque context handed back to `logger`.
    pub log_ctx: *mut c_void,
    /// Messages below this level are dropped.
    pub log_level: LogLevel,
    /// Behaviour flags.
    pub flags: ConfigFlags,
    /// Opaque context handed back to schema validator callbacks.
    pub validation_ctx: *mut c_void,
}

impl Default for Config {
    fn default() -> Self {
        Config {
            allocator: default_allocator,
            alloc_ctx: ptr::null_mut(),
            logger: None,
            log_ctx: ptr::null_mut(),
            log_level: LogLevel::Warning,
            flags: ConfigFlags::NONE,
            validation_ctx: ptr::null_mut(),
        }
    }
}

impl Config {
    pub(crate) fn log(&self, level: LogLevel, args: fmt::Arguments<'_>) {
        if level < self.log_level {
            return;
        }
        match self.logger {
            Some(logger) => logger(level, self.log_ctx, args),
            None => log::log!(level.to_log(), "{}", args),
        }
    }

    pub(crate) fn case_insensitive(&self) -> bool {
        self.flags.contains(ConfigFlags::CASE_INSENSITIVE)
    }
}

/// Realloc-backed allocator used when the caller supplies none.
unsafe fn default_allocator(_ctx: *mut c_void, ptr: *mut c_void, new_size: usize) -> *mut c_void {
    if new_size == 0 {
        if !ptr.is_null() {
            unsafe { libc::free(ptr) };
        }
        std::ptr::null_mut()
    } else {
        unsafe { libc::realloc(ptr, new_size) }
    }
}
