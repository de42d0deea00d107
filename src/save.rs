// Copyright notice and licensing information.
// These lines indicate the copyright of the software and its licensing terms.
// SPDX-License-Identifier: Apache-2.0 OR MIT indicates dual licensing under Apache 2.0 or MIT licenses.
// Copyright © 2026 yaml_bind, Schema-Driven YAML Binding for Rust. All rights reserved.

//! The saver driver: typed reads of a native value in, emitter events
//! out.
//!
//! The same stack sequences the traversal, but with no incoming events
//! to react to each step is driven by the top frame's progress: a
//! mapping frame emits its next field, a sequence frame its next entry,
//! and an exhausted frame emits its end event and pops.

use crate::config::Config;
use crate::error::{new, Error, ErrorImpl, Location, Result};
use crate::libyml::emitter::{Emitter, Event, Scalar, ScalarStyle};
use crate::libyml::error::Mark;
use crate::primitive::{read_int, sign_pad};
use crate::schema::{resolve_union_variant, Field, Schema, SchemaFlags, SchemaKind};
use crate::stack::{Frame, FrameExtra, Stack, State};
use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine as _;
use std::ffi::{c_void, CStr};
use std::io;
use std::ptr;

const TAG_BOOL: &str = "tag:yaml.org,2002:bool";
const TAG_INT: &str = "tag:yaml.org,2002:int";
const TAG_FLOAT: &str = "tag:yaml.org,2002:float";
const TAG_STR: &str = "tag:yaml.org,2002:str";

fn invalid() -> Error {
    new(ErrorImpl::InvalidValue(Location::none()))
}

fn internal() -> Error {
    new(ErrorImpl::InternalError)
}

/// Serializes the value rooted at `data` to YAML through `write`.
pub(crate) unsafe fn save<'c>(
    config: &'c Config,
    schema: &Schema<'_>,
    data: *const c_void,
    seq_count: Option<u64>,
    write: Box<dyn io::Write + 'c>,
) -> Result<()> {
    crate::check_top_level(schema, seq_count.is_some())?;
    if data.is_null() {
        return Err(new(ErrorImpl::BadParamNullData));
    }
    let top_count = match schema.kind {
        SchemaKind::Sequence { .. } => seq_count.unwrap_or(0),
        SchemaKind::SequenceFixed { max, .. } => max,
        SchemaKind::Binary { max_len, .. } => max_len as u64,
        _ => 0,
    };
    let mut driver = Saver {
        emitter: Emitter::new(write)?,
        stack: Stack::new(),
    };
    match driver.run(schema, data, top_count) {
        Ok(()) => Ok(()),
        Err(err) => {
            config.log(
                crate::config::LogLevel::Error,
                format_args!("save failed: {}", err),
            );
            driver.stack.log_backtrace(config);
            Err(err)
        }
    }
}

struct Saver<'c, 's> {
    emitter: Emitter<'c>,
    stack: Stack<'s>,
}

impl<'c, 's> Saver<'c, 's> {
    unsafe fn run(
        &mut self,
        schema: &'s Schema<'s>,
        data: *const c_void,
        top_count: u64,
    ) -> Result<()> {
        self.emitter.emit(Event::StreamStart)?;
        self.emitter.emit(Event::DocumentStart)?;
        let root_holder: *const c_void = data;
        self.write_value(schema, ptr::addr_of!(root_holder).cast::<u8>(), top_count)?;
        while !self.stack.is_empty() {
            self.step()?;
        }
        self.emitter.emit(Event::DocumentEnd)?;
        self.emitter.emit(Event::StreamEnd)?;
        self.emitter.flush()
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
                    Some(variant) => (position == 0).then_some(*variant),
                    None => (position < fields.len()).then_some(position),
                };
                let Some(current) = selected else {
                    self.stack.pop();
                    return self.emitter.emit(Event::MappingEnd);
                };
                *field_index = position + 1;
                let data_in = frame.data_in;
                let field = &fields[current];
                if matches!(field.value.kind, SchemaKind::Ignore) {
                    return Ok(());
                }
                let slot = data_in.add(field.data_offset);
                if field.value.is_pointer()
                    && (*slot.cast::<*const u8>()).is_null()
                    && field.value.flags.contains(SchemaFlags::OPTIONAL)
                {
                    // Absent optional value; the key is withheld too.
                    return Ok(());
                }
                let count = field_count(field, data_in);
                self.emit_scalar(TAG_STR, field.key, ScalarStyle::Any)?;
                self.write_value(&field.value, slot, count)
            }
            FrameExtra::Seq {
                index,
                count,
                buffer_in,
                stride,
                ..
            } => {
                if *index >= *count {
                    self.stack.pop();
                    return self.emitter.emit(Event::SequenceEnd);
                }
                let offset = (*index as usize) * *stride;
                *index += 1;
                let slot = buffer_in.add(offset);
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
                self.write_value(entry, slot, entry_count)
            }
            _ => Err(internal()),
        }
    }

    /// Emits one value of `schema` read from `slot`; composite kinds
    /// emit their start event and push a frame.
    unsafe fn write_value(
        &mut self,
        schema: &'s Schema<'s>,
        slot: *const u8,
        count: u64,
    ) -> Result<()> {
        let data = if schema.is_pointer() {
            let data = *slot.cast::<*const u8>();
            if data.is_null() {
                // A null pointer reads back as null under the schema's
                // null-scalar flags.
                return self.emit_scalar(TAG_STR, "", ScalarStyle::Plain);
            }
            data
        } else {
            slot
        };
        match schema.kind {
            SchemaKind::Int { .. } => {
                let raw = read_int(schema.data_size, data)?;
                let value = sign_pad(raw, schema.data_size);
                let mut buffer = itoa::Buffer::new();
                self.emit_scalar(TAG_INT, buffer.format(value), ScalarStyle::Plain)
            }
            SchemaKind::Uint { .. } => {
                let value = read_int(schema.data_size, data)?;
                let mut buffer = itoa::Buffer::new();
                self.emit_scalar(TAG_INT, buffer.format(value), ScalarStyle::Plain)
            }
            SchemaKind::Bool { .. } => {
                let value = read_int(schema.data_size, data)?;
                let text = if value != 0 { "true" } else { "false" };
                self.emit_scalar(TAG_BOOL, text, ScalarStyle::Plain)
            }
            SchemaKind::Enum { entries, .. } => {
                let raw = read_int(schema.data_size, data)?;
                let value = sign_pad(raw, schema.data_size);
                match entries.iter().find(|entry| entry.value == value) {
                    Some(entry) => self.emit_scalar(TAG_STR, entry.name, ScalarStyle::Any),
                    None if !schema.flags.contains(SchemaFlags::STRICT) => {
                        let mut buffer = itoa::Buffer::new();
                        self.emit_scalar(TAG_INT, buffer.format(value), ScalarStyle::Plain)
                    }
                    None => Err(invalid()),
                }
            }
            SchemaKind::Float { .. } => self.write_float(schema, data),
            SchemaKind::String { .. } => {
                let text = CStr::from_ptr(data.cast()).to_string_lossy();
                self.emit_scalar(TAG_STR, &text, ScalarStyle::Any)
            }
            SchemaKind::Binary { .. } => {
                let raw = std::slice::from_raw_parts(data, count as usize);
                let encoded = BASE64.encode(raw);
                self.emit_scalar(TAG_STR, &encoded, ScalarStyle::Any)
            }
            SchemaKind::Flags { .. } => self.write_flags(schema, data),
            SchemaKind::Bitfield { .. } => self.write_bitfield(schema, data),
            SchemaKind::Mapping { fields, .. } => {
                self.emitter.emit(Event::MappingStart)?;
                self.push_map(schema, fields, data, None);
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
                self.emitter.emit(Event::MappingStart)?;
                self.push_map(schema, fields, data, Some(variant));
                Ok(())
            }
            SchemaKind::Sequence { .. } | SchemaKind::SequenceFixed { .. } => {
                self.emitter.emit(Event::SequenceStart)?;
                self.stack.push(Frame {
                    state: State::InSequence,
                    schema,
                    data_in: data,
                    data_out: ptr::null_mut(),
                    mark: Mark::default(),
                    extra: FrameExtra::Seq {
                        index: 0,
                        count,
                        count_out: ptr::null_mut(),
                        count_size: 0,
                        buffer_in: data,
                        buffer_out: ptr::null_mut(),
                        stride: schema.data_size,
                        slot_out: ptr::null_mut(),
                    },
                });
                Ok(())
            }
            SchemaKind::Ignore => Err(internal()),
        }
    }

    unsafe fn write_float(&mut self, schema: &Schema<'s>, data: *const u8) -> Result<()> {
        let value = match schema.data_size {
            4 => {
                let mut bytes = [0u8; 4];
                ptr::copy_nonoverlapping(data, bytes.as_mut_ptr(), 4);
                f64::from(f32::from_ne_bytes(bytes))
            }
            8 => {
                let mut bytes = [0u8; 8];
                ptr::copy_nonoverlapping(data, bytes.as_mut_ptr(), 8);
                f64::from_ne_bytes(bytes)
            }
            _ => return Err(new(ErrorImpl::InvalidDataSize)),
        };
        if value.is_nan() {
            return self.emit_scalar(TAG_FLOAT, ".nan", ScalarStyle::Plain);
        }
        if value.is_infinite() {
            let text = if value > 0.0 { ".inf" } else { "-.inf" };
            return self.emit_scalar(TAG_FLOAT, text, ScalarStyle::Plain);
        }
        let mut buffer = ryu::Buffer::new();
        let text = if schema.data_size == 4 {
            buffer.format(value as f32)
        } else {
            buffer.format(value)
        };
        self.emit_scalar(TAG_FLOAT, text, ScalarStyle::Plain)
    }

    unsafe fn write_flags(&mut self, schema: &Schema<'s>, data: *const u8) -> Result<()> {
        let SchemaKind::Flags { entries, .. } = schema.kind else {
            return Err(internal());
        };
        let value = read_int(schema.data_size, data)?;
        self.emitter.emit(Event::SequenceStart)?;
        let mut remaining = value;
        for entry in entries {
            let mask = entry.value as u64;
            if mask != 0 && remaining & mask == mask {
                self.emit_scalar(TAG_STR, entry.name, ScalarStyle::Any)?;
                remaining &= !mask;
            }
        }
        if remaining != 0 {
            if schema.flags.contains(SchemaFlags::STRICT) {
                return Err(invalid());
            }
            // Bits with no table entry survive as one trailing number.
            let mut buffer = itoa::Buffer::new();
            self.emit_scalar(TAG_INT, buffer.format(remaining), ScalarStyle::Plain)?;
        }
        self.emitter.emit(Event::SequenceEnd)
    }

    unsafe fn write_bitfield(&mut self, schema: &Schema<'s>, data: *const u8) -> Result<()> {
        let SchemaKind::Bitfield { bits, .. } = schema.kind else {
            return Err(internal());
        };
        let value = read_int(schema.data_size, data)?;
        self.emitter.emit(Event::MappingStart)?;
        for def in bits {
            let capacity = if def.bit_width >= 64 {
                u64::MAX
            } else {
                (1u64 << def.bit_width) - 1
            };
            let sub_value = (value >> def.bit_offset) & capacity;
            self.emit_scalar(TAG_STR, def.name, ScalarStyle::Any)?;
            let mut buffer = itoa::Buffer::new();
            self.emit_scalar(TAG_INT, buffer.format(sub_value), ScalarStyle::Plain)?;
        }
        self.emitter.emit(Event::MappingEnd)
    }

    fn push_map(
        &mut self,
        schema: &'s Schema<'s>,
        fields: &'s [Field<'s>],
        data: *const u8,
        only: Option<usize>,
    ) {
        self.stack.push(Frame {
            state: State::InMappingKey,
            schema,
            data_in: data,
            data_out: ptr::null_mut(),
            mark: Mark::default(),
            extra: FrameExtra::Map {
                fields,
                seen: crate::stack::FieldBits::new(fields.len()),
                field_index: 0,
                only,
            },
        });
    }

    fn emit_scalar(&mut self, tag: &'static str, value: &str, style: ScalarStyle) -> Result<()> {
        self.emitter.emit(Event::Scalar(Scalar {
            tag: Some(tag),
            value,
            style,
        }))
    }
}

/// The count governing `field` in the source structure.
unsafe fn field_count(field: &Field<'_>, parent_data: *const u8) -> u64 {
    match field.value.kind {
        SchemaKind::Sequence { .. } | SchemaKind::Binary { .. } if field.count_size != 0 => {
            read_int(field.count_size, parent_data.add(field.count_offset))
                .ok()
                .unwrap_or(0)
        }
        SchemaKind::SequenceFixed { max, .. } => max,
        SchemaKind::Binary { max_len, .. } => max_len as u64,
        _ => 0,
    }
}
