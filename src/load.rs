// Copyright notice and licensing information.
// These lines indicate the copyright of the software and its licensing terms.
// SPDX-License-Identifier: Apache-2.0 OR MIT indicates dual licensing under Apache 2.0 or MIT licenses.
// Copyright © 2026 yaml_bind, Schema-Driven YAML Binding for Rust. All rights reserved.

//! The loader driver: parser events in, typed writes to freshly
//! allocated native memory out.
//!
//! Dispatch is a match over the current stack state and the incoming
//! event. Every heap region is published into its parent slot the
//! moment it is allocated, so a failure at any depth hands one
//! reachable tree to the freer and the caller sees nothing.

use crate::anchor::EventSource;
use crate::config::{Config, ConfigFlags, LogLevel};
use crate::error::{new, Error, ErrorImpl, Result};
use crate::libyml::error::Mark;
use crate::libyml::parser::{Event, Parser, Scalar, ScalarStyle};
use crate::primitive::{fits_signed, unsigned_max, write_int};
use crate::schema::{EventClass, Field, Schema, SchemaFlags, SchemaKind, SequenceDefault};
use crate::stack::{Frame, FrameExtra, Stack, State};
use crate::{copy, free, mem, util};
use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine as _;
use std::borrow::Cow;
use std::ffi::c_void;
use std::ptr;

fn invalid_value(mark: Mark) -> Error {
    new(ErrorImpl::InvalidValue(mark.location()))
}

fn internal() -> Error {
    new(ErrorImpl::InternalError)
}

/// Loads one document from `input` into a freshly allocated value tree.
///
/// On success the root is stored through `data_out` and, for top-level
/// sequences, the entry count through `seq_count_out`. On failure both
/// are untouched and every allocation made along the way has been
/// released.
pub(crate) unsafe fn load(
    config: &Config,
    schema: &Schema<'_>,
    input: Cow<'_, [u8]>,
    data_out: &mut *mut c_void,
    mut seq_count_out: Option<&mut u64>,
) -> Result<()> {
    crate::check_top_level(schema, seq_count_out.is_some())?;
    if !(*data_out).is_null() {
        return Err(new(ErrorImpl::DataTargetNonNull));
    }

    let parser = Parser::new(input)?;
    let mut driver = Loader {
        config,
        schema,
        source: EventSource::new(config, parser),
        stack: Stack::new(),
        root: ptr::null_mut(),
        top_count: 0,
        done: false,
    };
    match driver.run() {
        Ok(()) => {
            *data_out = driver.root;
            if let Some(count) = seq_count_out.as_deref_mut() {
                *count = driver.top_count;
            }
            Ok(())
        }
        Err(err) => {
            driver.fail(&err);
            Err(err)
        }
    }
}

struct Loader<'c, 's, 'input> {
    config: &'c Config,
    schema: &'s Schema<'s>,
    source: EventSource<'c, 'input>,
    stack: Stack<'s>,
    root: *mut c_void,
    top_count: u64,
    done: bool,
}

impl<'c, 's, 'input> Loader<'c, 's, 'input> {
    unsafe fn run(&mut self) -> Result<()> {
        loop {
            let (event, mark) = self.source.next()?;
            self.dispatch(event, mark)?;
            if self.done {
                return Ok(());
            }
        }
    }

    /// Failure epilogue: log a backtrace and release the partial tree.
    fn fail(&mut self, err: &Error) {
        self.config
            .log(LogLevel::Error, format_args!("load failed: {}", err));
        self.stack.log_backtrace(self.config);
        if !self.root.is_null() {
            unsafe { free::free_tree(self.config, self.schema, &mut self.root, self.top_count) };
        }
    }

    fn pop(&mut self) {
        self.stack.pop();
        if self.stack.is_empty() {
            self.done = true;
        }
    }

    unsafe fn dispatch(&mut self, event: Event, mark: Mark) -> Result<()> {
        let Some(state) = self.stack.top().map(|frame| frame.state) else {
            return match event {
                Event::StreamStart => {
                    self.stack.push(Frame {
                        state: State::InStream,
                        schema: self.schema,
                        data_in: ptr::null(),
                        data_out: ptr::null_mut(),
                        mark,
                        extra: FrameExtra::Stream { docs_seen: 0 },
                    });
                    Ok(())
                }
                _ => Err(new(ErrorImpl::UnexpectedEvent(mark.location()))),
            };
        };
        match state {
            State::InStream => self.on_stream(event, mark),
            State::InDoc => self.on_doc(event, mark),
            State::InMappingKey => self.on_mapping_key(event, mark),
            State::InMappingValue => self.on_mapping_value(event, mark),
            State::InSequence => self.on_sequence(event, mark),
        }
    }

    unsafe fn on_stream(&mut self, event: Event, mark: Mark) -> Result<()> {
        match event {
            Event::DocumentStart => {
                let Some(frame) = self.stack.top_mut() else {
                    return Err(internal());
                };
                let FrameExtra::Stream { docs_seen } = &mut frame.extra else {
                    return Err(internal());
                };
                if *docs_seen == 0 {
                    *docs_seen = 1;
                    self.stack.push(Frame {
                        state: State::InDoc,
                        schema: self.schema,
                        data_in: ptr::null(),
                        data_out: ptr::null_mut(),
                        mark,
                        extra: FrameExtra::Doc,
                    });
                } else {
                    // Only the first document binds; stop here.
                    self.config.log(
                        LogLevel::Warning,
                        format_args!("ignoring additional document at {}", mark),
                    );
                    self.pop();
                }
                Ok(())
            }
            Event::StreamEnd => {
                self.pop();
                Ok(())
            }
            _ => Err(new(ErrorImpl::UnexpectedEvent(mark.location()))),
        }
    }

    unsafe fn on_doc(&mut self, event: Event, mark: Mark) -> Result<()> {
        match event {
            Event::DocumentEnd => {
                self.pop();
                Ok(())
            }
            Event::Scalar(_) | Event::SequenceStart(_) | Event::MappingStart(_) => {
                let slot = ptr::addr_of_mut!(self.root).cast::<u8>();
                self.read_value(self.schema, slot, None, event, mark)
            }
            _ => Err(new(ErrorImpl::UnexpectedEvent(mark.location()))),
        }
    }

    unsafe fn on_mapping_key(&mut self, event: Event, mark: Mark) -> Result<()> {
        match event {
            Event::Scalar(scalar) => self.mapping_key(scalar, mark),
            Event::MappingEnd => self.mapping_end(mark),
            _ => Err(new(ErrorImpl::UnexpectedEvent(mark.location()))),
        }
    }

    unsafe fn mapping_key(&mut self, scalar: Scalar, mark: Mark) -> Result<()> {
        let Some(frame) = self.stack.top_mut() else {
            return Err(internal());
        };
        let schema = frame.schema;
        let is_union = matches!(schema.kind, SchemaKind::Union { .. });
        let FrameExtra::Map {
            fields,
            seen,
            field_index,
            ..
        } = &mut frame.extra
        else {
            return Err(internal());
        };
        let fields: &'s [Field<'s>] = *fields;
        let insensitive = schema.names_case_insensitive(self.config.case_insensitive());
        let key = scalar.value.as_str();
        let position = fields.iter().position(|field| {
            if insensitive {
                util::caseless_eq(field.key, key)
            } else {
                field.key == key
            }
        });
        let Some(index) = position else {
            if self.config.flags.contains(ConfigFlags::IGNORE_UNKNOWN_KEYS) {
                if self.config.flags.contains(ConfigFlags::IGNORED_KEY_WARNING) {
                    self.config.log(
                        LogLevel::Warning,
                        format_args!("ignoring unknown key {:?} at {}", key, mark),
                    );
                }
                return self.consume_next_value();
            }
            return Err(new(ErrorImpl::InvalidKey {
                key: key.to_string(),
                location: mark.location(),
            }));
        };
        if is_union && seen.any() {
            // At most one union variant may be populated.
            return Err(new(ErrorImpl::UnexpectedEvent(mark.location())));
        }
        if seen.set(index) {
            // Duplicate key.
            return Err(new(ErrorImpl::UnexpectedEvent(mark.location())));
        }
        if matches!(fields[index].value.kind, SchemaKind::Ignore) {
            return self.consume_next_value();
        }
        *field_index = index;
        frame.state = State::InMappingValue;
        Ok(())
    }

    unsafe fn mapping_end(&mut self, mark: Mark) -> Result<()> {
        let Some(frame) = self.stack.top() else {
            return Err(internal());
        };
        let schema = frame.schema;
        let data_out = frame.data_out;
        let FrameExtra::Map { fields, seen, .. } = &frame.extra else {
            return Err(internal());
        };
        let fields: &'s [Field<'s>] = *fields;
        let is_union = matches!(schema.kind, SchemaKind::Union { .. });
        let mut absent = Vec::new();
        if !is_union {
            for (index, field) in fields.iter().enumerate() {
                if seen.get(index) || matches!(field.value.kind, SchemaKind::Ignore) {
                    continue;
                }
                if !field.value.flags.contains(SchemaFlags::OPTIONAL) {
                    return Err(new(ErrorImpl::MappingFieldMissing {
                        field: field.key.to_string(),
                        location: mark.location(),
                    }));
                }
                absent.push(index);
            }
        }
        for index in absent {
            self.materialize_missing(&fields[index], data_out, mark)?;
        }
        if let SchemaKind::Mapping {
            validate: Some(validate),
            ..
        } = schema.kind
        {
            if !validate(self.config.validation_ctx, data_out.cast_const().cast()) {
                return Err(invalid_value(mark));
            }
        }
        self.pop();
        Ok(())
    }

    unsafe fn on_mapping_value(&mut self, event: Event, mark: Mark) -> Result<()> {
        match event {
            Event::Scalar(_) | Event::SequenceStart(_) | Event::MappingStart(_) => {
                let Some(frame) = self.stack.top_mut() else {
                    return Err(internal());
                };
                let data_out = frame.data_out;
                let FrameExtra::Map {
                    fields,
                    field_index,
                    ..
                } = &frame.extra
                else {
                    return Err(internal());
                };
                let fields: &'s [Field<'s>] = *fields;
                let field = &fields[*field_index];
                frame.state = State::InMappingKey;
                let slot = data_out.add(field.data_offset);
                let count_slot = if field.count_size != 0 {
                    Some((data_out.add(field.count_offset), field.count_size))
                } else {
                    None
                };
                self.read_value(&field.value, slot, count_slot, event, mark)
            }
            _ => Err(new(ErrorImpl::UnexpectedEvent(mark.location()))),
        }
    }

    unsafe fn on_sequence(&mut self, event: Event, mark: Mark) -> Result<()> {
        match event {
            Event::SequenceEnd => self.sequence_end(mark),
            Event::Scalar(_) | Event::SequenceStart(_) | Event::MappingStart(_) => {
                self.sequence_entry(event, mark)
            }
            _ => Err(new(ErrorImpl::UnexpectedEvent(mark.location()))),
        }
    }

    unsafe fn sequence_entry(&mut self, event: Event, mark: Mark) -> Result<()> {
        let config = self.config;
        let Some(frame) = self.stack.top_mut() else {
            return Err(internal());
        };
        let schema = frame.schema;
        let (entry, max, fixed) = match schema.kind {
            SchemaKind::Sequence { entry, max, .. } => (entry, max, false),
            SchemaKind::SequenceFixed { entry, max, .. } => (entry, max, true),
            _ => return Err(internal()),
        };
        let pointer = schema.is_pointer();
        let FrameExtra::Seq {
            index,
            count,
            count_out,
            count_size,
            buffer_out,
            stride,
            slot_out,
            ..
        } = &mut frame.extra
        else {
            return Err(internal());
        };
        if *index + 1 > max {
            return Err(new(ErrorImpl::SequenceEntriesMax(mark.location())));
        }
        let entry_offset = (*index as usize) * *stride;
        let data_out = if pointer {
            if fixed {
                if buffer_out.is_null() {
                    let buffer = mem::alloc_zeroed(config, (max as usize) * *stride)?;
                    *buffer_out = buffer;
                    *slot_out.cast::<*mut u8>() = buffer;
                }
                buffer_out.add(entry_offset)
            } else {
                let grown = mem::grow(config, *buffer_out, entry_offset, entry_offset + *stride)?;
                *buffer_out = grown;
                *slot_out.cast::<*mut u8>() = grown;
                grown.add(entry_offset)
            }
        } else {
            buffer_out.add(entry_offset)
        };
        *index += 1;
        if !fixed {
            *count = *index;
            write_int(*count, *count_size, *count_out)?;
        }
        self.read_value(entry, data_out, None, event, mark)
    }

    unsafe fn sequence_end(&mut self, mark: Mark) -> Result<()> {
        let Some(frame) = self.stack.top() else {
            return Err(internal());
        };
        let (min, validate) = match frame.schema.kind {
            SchemaKind::Sequence { min, validate, .. }
            | SchemaKind::SequenceFixed { min, validate, .. } => (min, validate),
            _ => return Err(internal()),
        };
        let FrameExtra::Seq {
            index, buffer_out, ..
        } = &frame.extra
        else {
            return Err(internal());
        };
        if *index < min {
            return Err(new(ErrorImpl::SequenceEntriesMin(mark.location())));
        }
        if let Some(validate) = validate {
            if !validate(self.config.validation_ctx, buffer_out.cast_const().cast()) {
                return Err(invalid_value(mark));
            }
        }
        self.pop();
        Ok(())
    }

    /// Reads one value of `schema` at `slot`, consuming `event` and,
    /// for composite kinds, growing the stack.
    unsafe fn read_value(
        &mut self,
        schema: &'s Schema<'s>,
        slot: *mut u8,
        count_slot: Option<(*mut u8, usize)>,
        event: Event,
        mark: Mark,
    ) -> Result<()> {
        if let Event::Scalar(scalar) = &event {
            if schema.is_pointer() && scalar_loads_null(schema, scalar) {
                // The zero-filled slot already reads as null.
                return Ok(());
            }
        }
        match schema.class() {
            EventClass::Any => self.consume_ignored(event, mark),
            EventClass::Scalar => {
                let Event::Scalar(scalar) = event else {
                    return Err(invalid_value(mark));
                };
                match &schema.kind {
                    SchemaKind::String { .. } => self.read_string(schema, slot, &scalar, mark),
                    SchemaKind::Binary { .. } => {
                        self.read_binary(schema, slot, count_slot, &scalar, mark)
                    }
                    _ => {
                        let data = self.scalar_target(schema, slot)?;
                        match &schema.kind {
                            SchemaKind::Int { .. } => {
                                self.read_int_value(schema, data, &scalar, mark)
                            }
                            SchemaKind::Uint { .. } => {
                                self.read_uint_value(schema, data, &scalar, mark)
                            }
                            SchemaKind::Bool { .. } => {
                                self.read_bool_value(schema, data, &scalar, mark)
                            }
                            SchemaKind::Enum { .. } => {
                                self.read_enum_value(schema, data, &scalar, mark)
                            }
                            SchemaKind::Float { .. } => {
                                self.read_float_value(schema, data, &scalar, mark)
                            }
                            _ => Err(internal()),
                        }
                    }
                }
            }
            EventClass::Mapping => {
                let Event::MappingStart(_) = event else {
                    return Err(invalid_value(mark));
                };
                match &schema.kind {
                    SchemaKind::Bitfield { .. } => {
                        let data = self.scalar_target(schema, slot)?;
                        self.read_bitfield_value(schema, data, mark)
                    }
                    SchemaKind::Mapping { fields, .. } | SchemaKind::Union { fields, .. } => {
                        self.push_mapping(schema, fields, slot, mark)
                    }
                    _ => Err(internal()),
                }
            }
            EventClass::Sequence => {
                let Event::SequenceStart(_) = event else {
                    return Err(invalid_value(mark));
                };
                match &schema.kind {
                    SchemaKind::Flags { .. } => {
                        let data = self.scalar_target(schema, slot)?;
                        self.read_flags_value(schema, data, mark)
                    }
                    SchemaKind::Sequence { .. } | SchemaKind::SequenceFixed { .. } => {
                        self.push_sequence(schema, slot, mark)
                    }
                    _ => Err(internal()),
                }
            }
        }
    }

    /// Resolves the write target for a fixed-width value, allocating
    /// and publishing a region first when the schema is pointer-
    /// flagged.
    unsafe fn scalar_target(&mut self, schema: &Schema<'s>, slot: *mut u8) -> Result<*mut u8> {
        let width_ok = match schema.kind {
            SchemaKind::Float { .. } => schema.data_size == 4 || schema.data_size == 8,
            _ => (1..=8).contains(&schema.data_size),
        };
        if !width_ok {
            return Err(new(ErrorImpl::InvalidDataSize));
        }
        if schema.is_pointer() {
            let data = mem::alloc_zeroed(self.config, schema.data_size)?;
            *slot.cast::<*mut u8>() = data;
            Ok(data)
        } else {
            Ok(slot)
        }
    }

    unsafe fn read_int_value(
        &self,
        schema: &Schema<'s>,
        data: *mut u8,
        scalar: &Scalar,
        mark: Mark,
    ) -> Result<()> {
        let SchemaKind::Int {
            min, max, validate, ..
        } = schema.kind
        else {
            return Err(internal());
        };
        if let (Some(min), Some(max)) = (min, max) {
            if min > max {
                return Err(new(ErrorImpl::BadMinMaxSchema));
            }
        }
        let value = util::scan_int(&scalar.value).ok_or_else(|| invalid_value(mark))?;
        if min.is_some_and(|min| value < min) || max.is_some_and(|max| value > max) {
            return Err(invalid_value(mark));
        }
        if let Some(validate) = validate {
            if !validate(self.config.validation_ctx, value) {
                return Err(invalid_value(mark));
            }
        }
        if !fits_signed(value, schema.data_size) {
            return Err(invalid_value(mark));
        }
        write_int(value as u64, schema.data_size, data)
    }

    unsafe fn read_uint_value(
        &self,
        schema: &Schema<'s>,
        data: *mut u8,
        scalar: &Scalar,
        mark: Mark,
    ) -> Result<()> {
        let SchemaKind::Uint {
            min, max, validate, ..
        } = schema.kind
        else {
            return Err(internal());
        };
        if let (Some(min), Some(max)) = (min, max) {
            if min > max {
                return Err(new(ErrorImpl::BadMinMaxSchema));
            }
        }
        let value = util::scan_uint(&scalar.value).ok_or_else(|| invalid_value(mark))?;
        if min.is_some_and(|min| value < min) || max.is_some_and(|max| value > max) {
            return Err(invalid_value(mark));
        }
        if let Some(validate) = validate {
            if !validate(self.config.validation_ctx, value) {
                return Err(invalid_value(mark));
            }
        }
        if value > unsigned_max(schema.data_size) {
            return Err(invalid_value(mark));
        }
        write_int(value, schema.data_size, data)
    }

    unsafe fn read_bool_value(
        &self,
        schema: &Schema<'s>,
        data: *mut u8,
        scalar: &Scalar,
        mark: Mark,
    ) -> Result<()> {
        let SchemaKind::Bool { validate, .. } = schema.kind else {
            return Err(internal());
        };
        let value = !util::is_false_word(&scalar.value);
        if let Some(validate) = validate {
            if !validate(self.config.validation_ctx, value) {
                return Err(invalid_value(mark));
            }
        }
        write_int(u64::from(value), schema.data_size, data)
    }

    unsafe fn read_enum_value(
        &self,
        schema: &Schema<'s>,
        data: *mut u8,
        scalar: &Scalar,
        mark: Mark,
    ) -> Result<()> {
        let SchemaKind::Enum {
            entries, validate, ..
        } = schema.kind
        else {
            return Err(internal());
        };
        let insensitive = schema.names_case_insensitive(self.config.case_insensitive());
        let named = entries.iter().find(|entry| {
            if insensitive {
                util::caseless_eq(entry.name, &scalar.value)
            } else {
                entry.name == scalar.value
            }
        });
        let value = match named {
            Some(entry) => entry.value,
            None if !schema.flags.contains(SchemaFlags::STRICT) => {
                util::scan_int(&scalar.value).ok_or_else(|| invalid_value(mark))?
            }
            None => return Err(invalid_value(mark)),
        };
        if let Some(validate) = validate {
            if !validate(self.config.validation_ctx, value) {
                return Err(invalid_value(mark));
            }
        }
        if !fits_signed(value, schema.data_size) {
            return Err(invalid_value(mark));
        }
        write_int(value as u64, schema.data_size, data)
    }

    unsafe fn read_float_value(
        &self,
        schema: &Schema<'s>,
        data: *mut u8,
        scalar: &Scalar,
        mark: Mark,
    ) -> Result<()> {
        let SchemaKind::Float { validate, .. } = schema.kind else {
            return Err(internal());
        };
        let value = util::scan_float(&scalar.value).ok_or_else(|| invalid_value(mark))?;
        if let Some(validate) = validate {
            if !validate(self.config.validation_ctx, value) {
                return Err(invalid_value(mark));
            }
        }
        store_float(schema, data, value, mark)
    }

    unsafe fn read_string(
        &mut self,
        schema: &Schema<'s>,
        slot: *mut u8,
        scalar: &Scalar,
        mark: Mark,
    ) -> Result<()> {
        let SchemaKind::String {
            min_len,
            max_len,
            validate,
            ..
        } = schema.kind
        else {
            return Err(internal());
        };
        if min_len > max_len {
            return Err(new(ErrorImpl::BadMinMaxSchema));
        }
        let text = scalar.value.as_str();
        if text.len() < min_len {
            return Err(new(ErrorImpl::StringLengthMin(mark.location())));
        }
        if text.len() > max_len {
            return Err(new(ErrorImpl::StringLengthMax(mark.location())));
        }
        if let Some(validate) = validate {
            if !validate(self.config.validation_ctx, text) {
                return Err(invalid_value(mark));
            }
        }
        write_string(self.config, schema, slot, text, mark)
    }

    unsafe fn read_binary(
        &mut self,
        schema: &Schema<'s>,
        slot: *mut u8,
        count_slot: Option<(*mut u8, usize)>,
        scalar: &Scalar,
        mark: Mark,
    ) -> Result<()> {
        let SchemaKind::Binary { min_len, max_len } = schema.kind else {
            return Err(internal());
        };
        if min_len > max_len {
            return Err(new(ErrorImpl::BadMinMaxSchema));
        }
        if count_slot.is_none() && min_len != max_len {
            // Without a length slot the decoded size is unrecoverable.
            return Err(new(ErrorImpl::BadMinMaxSchema));
        }
        let decoded = BASE64
            .decode(scalar.value.as_bytes())
            .map_err(|_| invalid_value(mark))?;
        if decoded.len() < min_len {
            return Err(new(ErrorImpl::StringLengthMin(mark.location())));
        }
        if decoded.len() > max_len {
            return Err(new(ErrorImpl::StringLengthMax(mark.location())));
        }
        if schema.is_pointer() {
            let data = mem::alloc_zeroed(self.config, decoded.len())?;
            *slot.cast::<*mut u8>() = data;
            ptr::copy_nonoverlapping(decoded.as_ptr(), data, decoded.len());
        } else {
            if decoded.len() > schema.data_size {
                return Err(new(ErrorImpl::StringLengthMax(mark.location())));
            }
            ptr::copy_nonoverlapping(decoded.as_ptr(), slot, decoded.len());
        }
        if let Some((count_out, count_size)) = count_slot {
            write_int(decoded.len() as u64, count_size, count_out)?;
        }
        Ok(())
    }

    unsafe fn read_flags_value(
        &mut self,
        schema: &Schema<'s>,
        data: *mut u8,
        mark: Mark,
    ) -> Result<()> {
        let SchemaKind::Flags {
            entries, validate, ..
        } = schema.kind
        else {
            return Err(internal());
        };
        let insensitive = schema.names_case_insensitive(self.config.case_insensitive());
        let strict = schema.flags.contains(SchemaFlags::STRICT);
        let mut accumulator = 0u64;
        loop {
            let (event, entry_mark) = self.source.next()?;
            match event {
                Event::SequenceEnd => break,
                Event::Scalar(scalar) => {
                    let named = entries.iter().find(|entry| {
                        if insensitive {
                            util::caseless_eq(entry.name, &scalar.value)
                        } else {
                            entry.name == scalar.value
                        }
                    });
                    match named {
                        Some(entry) => accumulator |= entry.value as u64,
                        None if !strict => match util::scan_uint(&scalar.value) {
                            Some(bits) if bits <= unsigned_max(schema.data_size) => {
                                accumulator |= bits;
                            }
                            _ => return Err(invalid_value(entry_mark)),
                        },
                        None => return Err(invalid_value(entry_mark)),
                    }
                }
                _ => return Err(invalid_value(entry_mark)),
            }
        }
        if let Some(validate) = validate {
            if !validate(self.config.validation_ctx, accumulator) {
                return Err(invalid_value(mark));
            }
        }
        write_int(accumulator, schema.data_size, data)
    }

    unsafe fn read_bitfield_value(
        &mut self,
        schema: &Schema<'s>,
        data: *mut u8,
        mark: Mark,
    ) -> Result<()> {
        let SchemaKind::Bitfield { bits, validate, .. } = schema.kind else {
            return Err(internal());
        };
        let insensitive = schema.names_case_insensitive(self.config.case_insensitive());
        let mut accumulator = 0u64;
        loop {
            let (event, key_mark) = self.source.next()?;
            let key = match event {
                Event::MappingEnd => break,
                Event::Scalar(scalar) => scalar.value,
                _ => return Err(invalid_value(key_mark)),
            };
            let Some(def) = bits.iter().find(|def| {
                if insensitive {
                    util::caseless_eq(def.name, &key)
                } else {
                    def.name == key
                }
            }) else {
                return Err(new(ErrorImpl::InvalidKey {
                    key,
                    location: key_mark.location(),
                }));
            };
            if def.bit_width == 0
                || u32::from(def.bit_offset) + u32::from(def.bit_width)
                    > schema.data_size as u32 * 8
            {
                return Err(new(ErrorImpl::BadBitvalInSchema));
            }
            let (value_event, value_mark) = self.source.next()?;
            let Event::Scalar(value_scalar) = value_event else {
                return Err(invalid_value(value_mark));
            };
            let value =
                util::scan_uint(&value_scalar.value).ok_or_else(|| invalid_value(value_mark))?;
            let capacity = if def.bit_width >= 64 {
                u64::MAX
            } else {
                (1u64 << def.bit_width) - 1
            };
            if value > capacity {
                return Err(new(ErrorImpl::BadBitfieldValueCount(value_mark.location())));
            }
            accumulator |= value << def.bit_offset;
        }
        if let Some(validate) = validate {
            if !validate(self.config.validation_ctx, accumulator) {
                return Err(invalid_value(mark));
            }
        }
        write_int(accumulator, schema.data_size, data)
    }

    unsafe fn push_mapping(
        &mut self,
        schema: &'s Schema<'s>,
        fields: &'s [Field<'s>],
        slot: *mut u8,
        mark: Mark,
    ) -> Result<()> {
        let data = if schema.is_pointer() {
            let data = mem::alloc_zeroed(self.config, schema.data_size)?;
            *slot.cast::<*mut u8>() = data;
            data
        } else {
            slot
        };
        self.stack.push(Frame {
            state: State::InMappingKey,
            schema,
            data_in: ptr::null(),
            data_out: data,
            mark,
            extra: FrameExtra::Map {
                fields,
                seen: crate::stack::FieldBits::new(fields.len()),
                field_index: 0,
                only: None,
            },
        });
        Ok(())
    }

    unsafe fn push_sequence(
        &mut self,
        schema: &'s Schema<'s>,
        slot: *mut u8,
        mark: Mark,
    ) -> Result<()> {
        let stride = schema.data_size;
        if stride == 0 {
            return Err(new(ErrorImpl::InvalidDataSize));
        }
        if !schema.is_pointer() {
            if let SchemaKind::Sequence { max: u64::MAX, .. } = schema.kind {
                // Unbounded growth needs heap storage.
                return Err(new(ErrorImpl::BadTypeInSchema));
            }
        }
        let top_count_out = ptr::addr_of_mut!(self.top_count).cast::<u8>();
        let (count_out, count_size) = self.stack.resolve_sequence_target(schema, top_count_out)?;
        let buffer_out = if schema.is_pointer() {
            ptr::null_mut()
        } else {
            slot
        };
        self.stack.push(Frame {
            state: State::InSequence,
            schema,
            data_in: ptr::null(),
            data_out: slot,
            mark,
            extra: FrameExtra::Seq {
                index: 0,
                count: 0,
                count_out,
                count_size,
                buffer_in: ptr::null(),
                buffer_out,
                stride,
                slot_out: slot,
            },
        });
        Ok(())
    }

    /// Writes an absent optional field's schema default, if one is
    /// declared. Fields without a default keep their zero fill.
    unsafe fn materialize_missing(
        &mut self,
        field: &Field<'s>,
        map_data: *mut u8,
        mark: Mark,
    ) -> Result<()> {
        let schema = &field.value;
        let slot = map_data.add(field.data_offset);
        match schema.kind {
            SchemaKind::Int {
                missing: Some(default),
                ..
            }
            | SchemaKind::Enum {
                missing: Some(default),
                ..
            } => {
                let data = self.scalar_target(schema, slot)?;
                write_int(default as u64, schema.data_size, data)
            }
            SchemaKind::Uint {
                missing: Some(default),
                ..
            }
            | SchemaKind::Flags {
                missing: Some(default),
                ..
            }
            | SchemaKind::Bitfield {
                missing: Some(default),
                ..
            } => {
                let data = self.scalar_target(schema, slot)?;
                write_int(default, schema.data_size, data)
            }
            SchemaKind::Bool {
                missing: Some(default),
                ..
            } => {
                let data = self.scalar_target(schema, slot)?;
                write_int(u64::from(default), schema.data_size, data)
            }
            SchemaKind::Float {
                missing: Some(default),
                ..
            } => {
                let data = self.scalar_target(schema, slot)?;
                store_float(schema, data, default, mark)
            }
            SchemaKind::String {
                missing: Some(default),
                ..
            } => write_string(self.config, schema, slot, default, mark),
            SchemaKind::Mapping {
                missing: Some(default),
                ..
            } => {
                let source_holder: *const c_void = default;
                let source_slot = if schema.is_pointer() {
                    ptr::addr_of!(source_holder).cast::<u8>()
                } else {
                    default.cast::<u8>()
                };
                copy::clone_value(self.config, schema, source_slot, slot, 0)
            }
            SchemaKind::Sequence {
                missing: Some(SequenceDefault { data, count }),
                ..
            } => {
                if field.count_size == 0 {
                    return Err(new(ErrorImpl::InvalidDataSize));
                }
                let source_holder: *const c_void = data;
                let source_slot = if schema.is_pointer() {
                    ptr::addr_of!(source_holder).cast::<u8>()
                } else {
                    data.cast::<u8>()
                };
                copy::clone_value(self.config, schema, source_slot, slot, count)?;
                write_int(
                    count,
                    field.count_size,
                    map_data.add(field.count_offset),
                )
            }
            _ => Ok(()),
        }
    }

    /// Pulls and discards the value that follows an ignored key.
    unsafe fn consume_next_value(&mut self) -> Result<()> {
        let (event, mark) = self.source.next()?;
        self.consume_ignored(event, mark)
    }

    /// Discards `event` and, for collections, everything up to the
    /// matching end event.
    unsafe fn consume_ignored(&mut self, event: Event, mark: Mark) -> Result<()> {
        match event {
            Event::Scalar(_) => Ok(()),
            Event::MappingStart(_) | Event::SequenceStart(_) => {
                let mut level = 1u32;
                while level > 0 {
                    let (event, nested_mark) = self.source.next()?;
                    match event {
                        Event::MappingStart(_) | Event::SequenceStart(_) => level += 1,
                        Event::MappingEnd | Event::SequenceEnd => level -= 1,
                        Event::Scalar(_) => {}
                        _ => {
                            return Err(new(ErrorImpl::UnexpectedEvent(nested_mark.location())));
                        }
                    }
                }
                Ok(())
            }
            _ => Err(new(ErrorImpl::UnexpectedEvent(mark.location()))),
        }
    }
}

fn scalar_loads_null(schema: &Schema<'_>, scalar: &Scalar) -> bool {
    if schema.flags.contains(SchemaFlags::NULL_ON_EMPTY) && scalar.value.is_empty() {
        return true;
    }
    schema.flags.contains(SchemaFlags::NULL_ON_NULL_STR)
        && scalar.style == ScalarStyle::Plain
        && util::is_null_word(&scalar.value)
}

/// Stores a double into 4- or 8-byte storage, bit-exact at the target
/// width.
pub(crate) unsafe fn store_float(
    schema: &Schema<'_>,
    data: *mut u8,
    value: f64,
    mark: Mark,
) -> Result<()> {
    match schema.data_size {
        4 => {
            if schema.flags.contains(SchemaFlags::STRICT)
                && value.is_finite()
                && value.abs() > f64::from(f32::MAX)
            {
                return Err(invalid_value(mark));
            }
            let narrowed = value as f32;
            ptr::copy_nonoverlapping(narrowed.to_ne_bytes().as_ptr(), data, 4);
            Ok(())
        }
        8 => {
            ptr::copy_nonoverlapping(value.to_ne_bytes().as_ptr(), data, 8);
            Ok(())
        }
        _ => Err(new(ErrorImpl::InvalidDataSize)),
    }
}

/// Copies `text` and its terminator into string storage, allocating for
/// pointer-flagged schemas.
pub(crate) unsafe fn write_string(
    config: &Config,
    schema: &Schema<'_>,
    slot: *mut u8,
    text: &str,
    mark: Mark,
) -> Result<()> {
    let length = text.len();
    if schema.is_pointer() {
        let data = mem::alloc_zeroed(config, length + 1)?;
        *slot.cast::<*mut u8>() = data;
        ptr::copy_nonoverlapping(text.as_ptr(), data, length);
    } else {
        if length + 1 > schema.data_size {
            return Err(new(ErrorImpl::StringLengthMax(mark.location())));
        }
        ptr::copy_nonoverlapping(text.as_ptr(), slot, length);
        slot.add(length).write(0);
    }
    Ok(())
}
