// Copyright notice and licensing information.
// These lines indicate the copyright of the software and its licensing terms.
// SPDX-License-Identifier: Apache-2.0 OR MIT indicates dual licensing under Apache 2.0 or MIT licenses.
// Copyright © 2026 yaml_bind, Schema-Driven YAML Binding for Rust. All rights reserved.

//! A safe pull-parser over the raw `libyml` event stream.
//!
//! Events are surfaced as owned values so the anchor recorder can store
//! and replay them; every event carries the mark it started at.

use crate::error::{new, ErrorImpl, Result};
use crate::libyml::{
    error::{self, Mark},
    util::Pinned,
};
use std::{
    borrow::Cow,
    ffi::{c_char, CStr},
    mem::MaybeUninit,
    ptr::addr_of_mut,
    slice,
};
#[allow(clippy::unsafe_removed_from_name)]
use libyml as sys;

/// A YAML event pull-parser bound to one input buffer.
#[derive(Debug)]
pub(crate) struct Parser<'input> {
    pin: Pinned<ParserPinned<'input>>,
}

struct ParserPinned<'input> {
    sys: sys::YamlParserT,
    input: Cow<'input, [u8]>,
}

impl<'input> std::fmt::Debug for ParserPinned<'input> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ParserPinned")
            .field("input", &self.input)
            .finish_non_exhaustive()
    }
}

/// One parsed event.
#[derive(Debug, Clone)]
pub(crate) enum Event {
    StreamStart,
    StreamEnd,
    DocumentStart,
    DocumentEnd,
    /// A reference to a previously anchored node.
    Alias(String),
    Scalar(Scalar),
    SequenceStart(Collection),
    SequenceEnd,
    MappingStart(Collection),
    MappingEnd,
}

/// A scalar event's payload.
#[derive(Debug, Clone)]
pub(crate) struct Scalar {
    /// Anchor declared on the scalar, if any.
    pub anchor: Option<String>,
    /// The scalar text.
    pub value: String,
    /// How the scalar was written in the document.
    pub style: ScalarStyle,
}

/// A sequence-start or mapping-start payload.
#[derive(Debug, Clone)]
pub(crate) struct Collection {
    /// Anchor declared on the collection, if any.
    pub anchor: Option<String>,
}

#[derive(Copy, Clone, PartialEq, Eq, Debug)]
pub(crate) enum ScalarStyle {
    Plain,
    SingleQuoted,
    DoubleQuoted,
    Literal,
    Folded,
}

impl Event {
    /// Removes and returns the anchor declared on this event.
    pub(crate) fn take_anchor(&mut self) -> Option<String> {
        match self {
            Event::Scalar(scalar) => scalar.anchor.take(),
            Event::SequenceStart(collection) | Event::MappingStart(collection) => {
                collection.anchor.take()
            }
            _ => None,
        }
    }
}

impl<'input> Parser<'input> {
    /// Binds a parser to `input`.
    ///
    /// Fails with `ParserInit` when the underlying parser state cannot
    /// be initialised.
    pub(crate) fn new(input: Cow<'input, [u8]>) -> Result<Parser<'input>> {
        // The sys state starts zeroed and is initialised in place at
        // its pinned address; deleting a zeroed state is a no-op, so
        // the drop on the early-return path below is safe.
        let pin = Pinned::new(ParserPinned {
            sys: unsafe { MaybeUninit::<sys::YamlParserT>::zeroed().assume_init() },
            input,
        });
        unsafe {
            let parser = addr_of_mut!((*pin.as_ptr()).sys);
            if sys::yaml_parser_initialize(parser).fail {
                return Err(new(ErrorImpl::ParserInit));
            }
            sys::yaml_parser_set_encoding(parser, sys::YamlUtf8Encoding);
            let data = (*pin.as_ptr()).input.as_ptr();
            let length = (&(*pin.as_ptr()).input).len() as u64;
            sys::yaml_parser_set_input_string(parser, data, length);
        }
        Ok(Parser { pin })
    }

    /// Pulls the next event from the input.
    pub(crate) fn next_event(&mut self) -> Result<(Event, Mark)> {
        let mut event = MaybeUninit::<sys::YamlEventT>::uninit();
        unsafe {
            let parser = addr_of_mut!((*self.pin.as_ptr()).sys);
            if (&(*parser)).error != sys::YamlNoError {
                return Err(error::parse_error(parser));
            }
            let event = event.as_mut_ptr();
            if sys::yaml_parser_parse(parser, event).fail {
                return Err(error::parse_error(parser));
            }
            let converted = convert_event(&*event);
            let mark = Mark::from_sys((*event).start_mark);
            sys::yaml_event_delete(event);
            Ok((converted, mark))
        }
    }
}

unsafe fn convert_event(sys: &sys::YamlEventT) -> Event {
    match sys.type_ {
        sys::YamlStreamStartEvent => Event::StreamStart,
        sys::YamlStreamEndEvent => Event::StreamEnd,
        sys::YamlDocumentStartEvent => Event::DocumentStart,
        sys::YamlDocumentEndEvent => Event::DocumentEnd,
        sys::YamlAliasEvent => Event::Alias(
            unsafe { optional_string(sys.data.alias.anchor) }.unwrap_or_default(),
        ),
        sys::YamlScalarEvent => {
            let value = unsafe {
                slice::from_raw_parts(sys.data.scalar.value, sys.data.scalar.length as usize)
            };
            Event::Scalar(Scalar {
                anchor: unsafe { optional_string(sys.data.scalar.anchor) },
                value: String::from_utf8_lossy(value).into_owned(),
                style: match unsafe { sys.data.scalar.style } {
                    sys::YamlSingleQuotedScalarStyle => ScalarStyle::SingleQuoted,
                    sys::YamlDoubleQuotedScalarStyle => ScalarStyle::DoubleQuoted,
                    sys::YamlLiteralScalarStyle => ScalarStyle::Literal,
                    sys::YamlFoldedScalarStyle => ScalarStyle::Folded,
                    _ => ScalarStyle::Plain,
                },
            })
        }
        sys::YamlSequenceStartEvent => Event::SequenceStart(Collection {
            anchor: unsafe { optional_string(sys.data.sequence_start.anchor) },
        }),
        sys::YamlSequenceEndEvent => Event::SequenceEnd,
        sys::YamlMappingStartEvent => Event::MappingStart(Collection {
            anchor: unsafe { optional_string(sys.data.mapping_start.anchor) },
        }),
        sys::YamlMappingEndEvent => Event::MappingEnd,
        _ => unreachable!("parser produced an empty event"),
    }
}

unsafe fn optional_string(text: *const u8) -> Option<String> {
    if text.is_null() {
        return None;
    }
    let cstr = unsafe { CStr::from_ptr(text.cast::<c_char>()) };
    Some(cstr.to_string_lossy().into_owned())
}

impl Drop for ParserPinned<'_> {
    fn drop(&mut self) {
        unsafe { sys::yaml_parser_delete(&mut self.sys) }
    }
}
