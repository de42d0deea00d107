// Copyright notice and licensing information.
// These lines indicate the copyright of the software and its licensing terms.
// SPDX-License-Identifier: Apache-2.0 OR MIT indicates dual licensing under Apache 2.0 or MIT licenses.
// Copyright © 2026 yaml_bind, Schema-Driven YAML Binding for Rust. All rights reserved.

//! # yaml_bind
//!
//! Schema-driven, bidirectional binding between YAML documents and
//! native in-memory data structures.
//!
//! A caller authors a declarative [`Schema`] describing the shape and
//! layout of a native value: scalars, strings, mappings, sequences,
//! pointers, flag sets and bitfields. Against that schema the crate can
//! [load](load_str) a YAML document into a freshly allocated value,
//! [save](save_string) a value back to YAML, [copy()] a value into an
//! independent deep clone, and [free()] everything the loader or cloner
//! allocated.
//!
//! All four operations share one traversal engine: an explicit stack
//! machine that walks the schema in lockstep with a libyaml event
//! stream (on load) or with the value's memory layout (on save, copy
//! and free). YAML anchors and aliases are handled on load by recording
//! and replaying event sub-streams, so aliased nodes load as
//! independent allocations.
//!
//! Memory comes from a caller-configurable allocator callback, and a
//! failed operation releases everything it allocated before returning:
//! the caller's output pointer is only written on success.
//!
//! ## Example
//!
//! ```
//! use core::mem::offset_of;
//! use std::ffi::c_void;
//! use std::ptr;
//! use yaml_bind::{Config, Field, Schema, SchemaFlags};
//!
//! #[repr(C)]
//! struct Target {
//!     answer: i32,
//! }
//!
//! let fields = [Field::new(
//!     "answer",
//!     offset_of!(Target, answer),
//!     Schema::int(SchemaFlags::NONE, 4),
//! )];
//! let schema = Schema::mapping(
//!     SchemaFlags::POINTER,
//!     core::mem::size_of::<Target>(),
//!     &fields,
//! );
//!
//! let config = Config::default();
//! let mut root: *mut c_void = ptr::null_mut();
//! unsafe {
//!     yaml_bind::load_str(&config, &schema, "answer: 42\n", &mut root, None).unwrap();
//!     assert_eq!((*(root as *const Target)).answer, 42);
//!     yaml_bind::free(&config, &schema, &mut root, None);
//! }
//! assert!(root.is_null());
//! ```

#![deny(missing_docs)]
#![doc(html_root_url = "https://docs.rs/yaml_bind")]

use std::borrow::Cow;
use std::ffi::c_void;
use std::fs::File;
use std::io;
use std::path::Path;

mod anchor;
/// Per-call configuration: allocator, logging, behaviour flags.
pub mod config;
mod copy;
/// Error and result types.
pub mod error;
mod free;
mod libyml;
mod load;
mod mem;
/// Byte-packing primitives shared by every driver.
pub mod primitive;
mod save;
/// The schema model describing native value layouts.
pub mod schema;
mod stack;
mod util;

pub use crate::config::{AllocFn, Config, ConfigFlags, LogFn, LogLevel};
pub use crate::error::{Error, ErrorImpl, Location, Result};
pub use crate::schema::{
    BitDef, BoolValidator, DataValidator, EnumEntry, Field, FloatValidator, IntValidator, Schema,
    SchemaFlags, SchemaKind, SequenceDefault, StringValidator, UintValidator,
};

use crate::error::{new, ErrorImpl as Impl};

/// Argument validation shared by the entry points: the top-level value
/// must be pointer-flagged and loadable, and a sequence count is
/// supplied exactly when the top-level schema is a variable-length
/// sequence.
pub(crate) fn check_top_level(schema: &Schema<'_>, has_seq_count: bool) -> Result<()> {
    if !schema.flags.contains(SchemaFlags::POINTER) {
        return Err(new(Impl::TopLevelNonPtr));
    }
    if matches!(schema.kind, SchemaKind::Ignore) {
        return Err(new(Impl::BadTopLevelType));
    }
    let needs_count = matches!(schema.kind, SchemaKind::Sequence { .. });
    if needs_count != has_seq_count {
        return Err(new(Impl::BadParamSeqCount));
    }
    Ok(())
}

/// Loads the first YAML document in `input` into a freshly allocated
/// value described by `schema`.
///
/// On success the root pointer is stored through `data_out` (which must
/// hold null on entry) and, when the top-level schema is a sequence,
/// the entry count through `seq_count_out`. On failure neither is
/// written and nothing is left allocated.
///
/// # Safety
///
/// `schema` must accurately describe the native layouts it references:
/// sizes, offsets and any default-value pointers. The loaded tree must
/// later be released with [`free()`] under the same schema.
pub unsafe fn load_str(
    config: &Config,
    schema: &Schema<'_>,
    input: &str,
    data_out: &mut *mut c_void,
    seq_count_out: Option<&mut u64>,
) -> Result<()> {
    load::load(
        config,
        schema,
        Cow::Borrowed(input.as_bytes()),
        data_out,
        seq_count_out,
    )
}

/// Loads the first YAML document in `input`; see [`load_str`].
///
/// # Safety
///
/// As for [`load_str`].
pub unsafe fn load_slice(
    config: &Config,
    schema: &Schema<'_>,
    input: &[u8],
    data_out: &mut *mut c_void,
    seq_count_out: Option<&mut u64>,
) -> Result<()> {
    load::load(config, schema, Cow::Borrowed(input), data_out, seq_count_out)
}

/// Reads `reader` to its end and loads the first YAML document; see
/// [`load_str`].
///
/// # Safety
///
/// As for [`load_str`].
pub unsafe fn load_reader<R>(
    config: &Config,
    schema: &Schema<'_>,
    mut reader: R,
    data_out: &mut *mut c_void,
    seq_count_out: Option<&mut u64>,
) -> Result<()>
where
    R: io::Read,
{
    let mut buffer = Vec::new();
    if let Err(io_error) = reader.read_to_end(&mut buffer) {
        return Err(new(Impl::FileOpen(io_error)));
    }
    load::load(config, schema, Cow::Owned(buffer), data_out, seq_count_out)
}

/// Loads the first YAML document in the file at `path`; see
/// [`load_str`].
///
/// # Safety
///
/// As for [`load_str`].
pub unsafe fn load_file(
    config: &Config,
    schema: &Schema<'_>,
    path: impl AsRef<Path>,
    data_out: &mut *mut c_void,
    seq_count_out: Option<&mut u64>,
) -> Result<()> {
    let bytes = std::fs::read(path).map_err(|io_error| new(Impl::FileOpen(io_error)))?;
    load::load(config, schema, Cow::Owned(bytes), data_out, seq_count_out)
}

/// Serializes the value rooted at `data` to YAML through `writer`.
///
/// `seq_count` is required exactly when the top-level schema is a
/// variable-length sequence.
///
/// # Safety
///
/// `data` must be a live value laid out as `schema` describes, with
/// `seq_count` its true entry count for a top-level sequence.
pub unsafe fn save_writer<'a, W>(
    config: &'a Config,
    schema: &Schema<'_>,
    data: *const c_void,
    seq_count: Option<u64>,
    writer: W,
) -> Result<()>
where
    W: io::Write + 'a,
{
    save::save(config, schema, data, seq_count, Box::new(writer))
}

/// Serializes the value rooted at `data` into an in-memory buffer; see
/// [`save_writer`].
///
/// # Safety
///
/// As for [`save_writer`].
pub unsafe fn save_vec(
    config: &Config,
    schema: &Schema<'_>,
    data: *const c_void,
    seq_count: Option<u64>,
) -> Result<Vec<u8>> {
    let mut buffer = Vec::new();
    save::save(config, schema, data, seq_count, Box::new(&mut buffer))?;
    Ok(buffer)
}

/// Serializes the value rooted at `data` into a `String`; see
/// [`save_writer`].
///
/// # Safety
///
/// As for [`save_writer`].
pub unsafe fn save_string(
    config: &Config,
    schema: &Schema<'_>,
    data: *const c_void,
    seq_count: Option<u64>,
) -> Result<String> {
    let buffer = save_vec(config, schema, data, seq_count)?;
    String::from_utf8(buffer).map_err(|_| new(Impl::InternalError))
}

/// Serializes the value rooted at `data` into the file at `path`; see
/// [`save_writer`].
///
/// # Safety
///
/// As for [`save_writer`].
pub unsafe fn save_file(
    config: &Config,
    schema: &Schema<'_>,
    data: *const c_void,
    seq_count: Option<u64>,
    path: impl AsRef<Path>,
) -> Result<()> {
    let file = File::create(path).map_err(|io_error| new(Impl::FileOpen(io_error)))?;
    save::save(config, schema, data, seq_count, Box::new(file))
}

/// Deep-clones the value rooted at `src` into independent storage.
///
/// For a pointer-flagged top-level schema, `*dst` must hold null on
/// entry and receives the freshly allocated clone. For an embedded
/// (non-pointer) top level, `*dst` must point at caller storage of the
/// schema's size, which is filled only on success.
///
/// # Safety
///
/// `src` must be a live value laid out as `schema` describes;
/// `seq_count` rules are as for [`save_writer`]. A cloned pointer root
/// must later be released with [`free()`] under the same schema.
pub unsafe fn copy(
    config: &Config,
    schema: &Schema<'_>,
    src: *const c_void,
    seq_count: Option<u64>,
    dst: &mut *mut c_void,
) -> Result<()> {
    copy::copy(config, schema, src, seq_count, dst)
}

/// Releases the tree rooted at `*data` and nulls the slot.
///
/// A null `*data` is a no-op, so freeing twice is safe. `seq_count`
/// must repeat the count returned by the load for a top-level sequence
/// and be `None` otherwise; on a mismatch the call logs and releases
/// nothing rather than walk memory with the wrong count.
///
/// # Safety
///
/// `*data`, when non-null, must be a tree produced by a load or copy
/// against the same `schema`.
pub unsafe fn free(
    config: &Config,
    schema: &Schema<'_>,
    data: &mut *mut c_void,
    seq_count: Option<u64>,
) {
    if data.is_null() {
        return;
    }
    let needs_count = matches!(schema.kind, SchemaKind::Sequence { .. });
    if needs_count != seq_count.is_some() {
        config.log(
            LogLevel::Error,
            format_args!("free: sequence count argument mismatch; not releasing"),
        );
        return;
    }
    free::free_tree(config, schema, data, seq_count.unwrap_or(0));
}
