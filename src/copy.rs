// Copyright notice and licensing information.
// These lines indicate the copyright of the software and its licensing terms.
// SPDX-License-Identifier: Apache-2.0 OR MIT indicates dual licensing under Apache 2.0 or MIT licenses.
// Copyright © 2026 yaml_bind, Schema-Driven YAML Binding for Rust. All rights reserved.

//! The cloner driver: a schema-driven deep copy of a native value into
//! freshly allocated, fully independent storage.
//!
//! The walk mirrors the loader's stack discipline, with the source
//! value standing in for the event stream. Destination regions are
//! published into their parent slots before their contents are cloned,
//! so a failure leaves one reachable partial tree for the freer.

use crate::config::Config;
use crate::error::{new, Error, ErrorImpl, Result};
use crate::libyml::error::Mark;
use crate::primitive::{read_int, write_int};
use crate::schema::{resolve_union_variant, Field, Schema, SchemaKind};
use crate::stack::{Frame, FrameExtra, Stack, State};
use crate::{free, mem};
use std::ffi::{c_void, CStr};
use std::ptr;

fn internal() -> Error {
    new(ErrorImpl::InternalError)
}

/// Deep-clones `src` against `schema`.
///
/// Pointer-flagged top level: `*out` must be null and receives the new
/// root. Embedded top level: `*out` must point at caller storage of the
/// schema's size, which is filled only on success.
pub(crate) unsafe fn copy(
    config: &Config,
    schema: &Schema<'_>,
    src: *const c_void,
    seq_count: Option<u64>,
    out: &mut *mut c_void,
) -> Result<()> {
    if src.is_null() {
        return Err(new(ErrorImpl::BadParamNullData));
    }
    if matches!(schema.kind, SchemaKind::Ignore) {
        return Err(new(ErrorImpl::BadTopLevelType));
    }
    let needs_count = matches!(schema.kind, SchemaKind::Sequence { .. });
    if needs_count != seq_count.is_some() {
        return Err(new(ErrorImpl::BadParamSeqCount));
    }
    let top_count = top_level_count(schema, seq_count);

    if schema.is_pointer() {
        if !(*out).is_null() {
            return Err(new(ErrorImpl::DataTargetNonNull));
        }
        let mut root: *mut c_void = ptr::null_mut();
        let source_holder = src;
        let result = clone_value(
            config,
            schema,
            ptr::addr_of!(source_holder).cast::<u8>(),
            ptr::addr_of_mut!(root).cast::<u8>(),
            top_count,
        );
        match result {
            Ok(()) => {
                *out = root;
                Ok(())
            }
            Err(err) => {
                free::free_tree(config, schema, &mut root, top_count);
                Err(err)
            }
        }
    } else {
        if (*out).is_null() {
            return Err(new(ErrorImpl::BadParamNullData));
        }
        let size = match schema.kind {
            SchemaKind::Sequence { .. } | SchemaKind::SequenceFixed { .. } => {
                (top_count as usize) * schema.data_size
            }
            _ => schema.data_size,
        };
        // Clone into a temporary root first so a failure never leaves
        // the caller's storage half-written.
        let temp = mem::alloc_zeroed(config, size)?;
        match clone_value(config, schema, src.cast::<u8>(), temp, top_count) {
            Ok(()) => {
                ptr::copy_nonoverlapping(temp, (*out).cast::<u8>(), size);
                mem::release(config, temp);
                Ok(())
            }
            Err(err) => {
                free::free_children(config, schema, temp, top_count);
                mem::release(config, temp);
                Err(err)
            }
        }
    }
}

/// The count governing a top-level value, derived from the schema where
/// the caller does not supply one.
fn top_level_count(schema: &Schema<'_>, seq_count: Option<u64>) -> u64 {
    match schema.kind {
        SchemaKind::Sequence { .. } => seq_count.unwrap_or(0),
        SchemaKind::SequenceFixed { max, .. } => max,
        SchemaKind::Binary { max_len, .. } => max_len as u64,
        _ => 0,
    }
}

/// Clones one value from `src_slot` into `dst_slot` without cleanup on
/// failure: whatever was published stays reachable through `dst_slot`
/// for the caller's freer to collect.
pub(crate) unsafe fn clone_value<'s>(
    config: &Config,
    schema: &'s Schema<'s>,
    src_slot: *const u8,
    dst_slot: *mut u8,
    top_count: u64,
) -> Result<()> {
    let mut driver = Cloner {
        config,
        stack: Stack::new(),
    };
    driver.clone_node(schema, src_slot, dst_slot, top_count)?;
    driver.run()
}

struct Cloner<'c, 's> {
    config: &'c Config,
    stack: Stack<'s>,
}

impl<'c, 's> Cloner<'c, 's> {
    unsafe fn run(&mut self) -> Result<()> {
        while !self.stack.is_empty() {
            self.step()?;
        }
        Ok(())
    }

    unsafe fn step(&mut self) -> Result<()> {
        let Some(frame) = self.stack.top_mut() else {
            return Err(internal());
        };
        match &mut frame.extra {
            FrameExtra::Map {
                fields,
                field_index,
                only,
                ..
            } => {
                let fields: &'s [Field<'s>] = *fields;
                let position = *field_index;
                let selected = match only {
                    Some(variant) => {
                        if position == 0 {
                            Some(*variant)
                        } else {
                            None
                        }
                    }
                    None => {
                        if position < fields.len() {
                            Some(position)
                        } else {
                            None
                        }
                    }
                };
                let Some(current) = selected else {
                    self.stack.pop();
                    return Ok(());
                };
                *field_index = position + 1;
                let src_base = frame.data_in;
                let dst_base = frame.data_out;
                let field = &fields[current];
                if matches!(field.value.kind, SchemaKind::Ignore) {
                    // A clone cannot know what an ignored slot held;
                    // the destination stays zero-filled.
                    return Ok(());
                }
                let count = self.field_count(field, src_base)?;
                if field.count_size != 0
                    && matches!(
                        field.value.kind,
                        SchemaKind::Sequence { .. } | SchemaKind::Binary { .. }
                    )
                {
                    write_int(count, field.count_size, dst_base.add(field.count_offset))?;
                }
                self.clone_node(
                    &field.value,
                    src_base.add(field.data_offset),
                    dst_base.add(field.data_offset),
                    count,
                )
            }
            FrameExtra::Seq {
                index,
                count,
                buffer_in,
                buffer_out,
                stride,
                ..
            } => {
                if *index >= *count {
                    self.stack.pop();
                    return Ok(());
                }
                let offset = (*index as usize) * *stride;
                *index += 1;
                let src = buffer_in.add(offset);
                let dst = buffer_out.add(offset);
                let entry = match frame.schema.kind {
                    SchemaKind::Sequence { entry, .. }
                    | SchemaKind::SequenceFixed { entry, .. } => entry,
                    _ => return Err(internal()),
                };
                let entry_count = match entry.kind {
                    SchemaKind::SequenceFixed { max, .. } => max,
                    SchemaKind::Binary { max_len, .. } => max_len as u64,
                    _ => 0,
                };
                self.clone_node(entry, src, dst, entry_count)
            }
            _ => Err(internal()),
        }
    }

    /// The count governing `field` in the source structure.
    unsafe fn field_count(&self, field: &Field<'s>, src_base: *const u8) -> Result<u64> {
        match field.value.kind {
            SchemaKind::Sequence { .. } => {
                if field.count_size == 0 {
                    return Err(new(ErrorImpl::InvalidDataSize));
                }
                read_int(field.count_size, src_base.add(field.count_offset))
            }
            SchemaKind::SequenceFixed { max, .. } => Ok(max),
            SchemaKind::Binary { max_len, .. } => {
                if field.count_size != 0 {
                    read_int(field.count_size, src_base.add(field.count_offset))
                } else {
                    Ok(max_len as u64)
                }
            }
            _ => Ok(0),
        }
    }

    unsafe fn clone_node(
        &mut self,
        schema: &'s Schema<'s>,
        src_slot: *const u8,
        dst_slot: *mut u8,
        count: u64,
    ) -> Result<()> {
        let (src_data, dst_data) = if schema.is_pointer() {
            let src_data = *src_slot.cast::<*const u8>();
            if src_data.is_null() {
                return Ok(());
            }
            let size = match schema.kind {
                SchemaKind::String { .. } => {
                    CStr::from_ptr(src_data.cast()).to_bytes().len() + 1
                }
                SchemaKind::Binary { .. } => count as usize,
                SchemaKind::Sequence { .. } | SchemaKind::SequenceFixed { .. } => {
                    (count as usize) * schema.data_size
                }
                _ => schema.data_size,
            };
            let dst_data = mem::alloc_zeroed(self.config, size)?;
            *dst_slot.cast::<*mut u8>() = dst_data;
            (src_data, dst_data)
        } else {
            (src_slot, dst_slot)
        };
        match schema.kind {
            SchemaKind::Int { .. }
            | SchemaKind::Uint { .. }
            | SchemaKind::Bool { .. }
            | SchemaKind::Enum { .. }
            | SchemaKind::Float { .. }
            | SchemaKind::Flags { .. }
            | SchemaKind::Bitfield { .. } => {
                ptr::copy_nonoverlapping(src_data, dst_data, schema.data_size);
                Ok(())
            }
            SchemaKind::String { .. } => {
                let length = CStr::from_ptr(src_data.cast()).to_bytes().len();
                ptr::copy_nonoverlapping(src_data, dst_data, length + 1);
                Ok(())
            }
            SchemaKind::Binary { .. } => {
                ptr::copy_nonoverlapping(src_data, dst_data, count as usize);
                Ok(())
            }
            SchemaKind::Ignore => Ok(()),
            SchemaKind::Mapping { fields, .. } => {
                self.push_map(schema, fields, src_data, dst_data, None);
                Ok(())
            }
            SchemaKind::Union {
                fields,
                discriminant,
            } => {
                let ancestors = self.stack.frames_top_down().filter_map(|frame| {
                    matches!(frame.extra, FrameExtra::Map { .. })
                        .then_some((frame.schema, frame.data_in))
                });
                let variant = resolve_union_variant(fields, discriminant, ancestors)?;
                self.push_map(schema, fields, src_data, dst_data, Some(variant));
                Ok(())
            }
            SchemaKind::Sequence { .. } | SchemaKind::SequenceFixed { .. } => {
                self.stack.push(Frame {
                    state: State::InSequence,
                    schema,
                    data_in: src_data,
                    data_out: dst_data,
                    mark: Mark::default(),
                    extra: FrameExtra::Seq {
                        index: 0,
                        count,
                        count_out: ptr::null_mut(),
                        count_size: 0,
                        buffer_in: src_data,
                        buffer_out: dst_data,
                        stride: schema.data_size,
                        slot_out: ptr::null_mut(),
                    },
                });
                Ok(())
            }
        }
    }

    fn push_map(
        &mut self,
        schema: &'s Schema<'s>,
        fields: &'s [Field<'s>],
        src_data: *const u8,
        dst_data: *mut u8,
        only: Option<usize>,
    ) {
        self.stack.push(Frame {
            state: State::InMappingKey,
            schema,
            data_in: src_data,
            data_out: dst_data,
            mark: Mark::default(),
            extra: FrameExtra::Map {
                fields,
                seen: crate::stack::FieldBits::new(fields.len()),
                field_index: 0,
                only,
            },
        });
    }
}
