// Copyright notice and licensing information.
// These lines indicate the copyright of the software and its licensing terms.
// SPDX-License-Identifier: Apache-2.0 OR MIT indicates dual licensing under Apache 2.0 or MIT licenses.
// Copyright © 2026 yaml_bind, Schema-Driven YAML Binding for Rust. All rights reserved.

//! The traversal state stack shared by the loader, saver and cloner.
//!
//! Each frame records where the traversal is inside the schema and the
//! native value, plus per-kind progress state. Recursion over the
//! schema is expressed entirely through this heap-allocated stack so
//! adversarially deep input cannot exhaust the call stack.

use crate::config::{Config, LogLevel};
use crate::error::{new, ErrorImpl, Result};
use crate::libyml::error::Mark;
use crate::schema::{Field, Schema, SchemaKind};
use std::ptr;

/// Where a frame is in its lifecycle.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub(crate) enum State {
    /// Inside the stream, between documents.
    InStream,
    /// Inside the document, expecting the root value.
    InDoc,
    /// Inside a mapping, expecting a key or the mapping end.
    InMappingKey,
    /// Inside a mapping, expecting the value for the selected field.
    InMappingValue,
    /// Inside a sequence, expecting an entry or the sequence end.
    InSequence,
}

/// A bit per mapping field, recording which keys have been consumed.
#[derive(Debug)]
pub(crate) struct FieldBits {
    words: Vec<u64>,
}

impl FieldBits {
    pub(crate) fn new(count: usize) -> Self {
        FieldBits {
            words: vec![0; count.div_ceil(64)],
        }
    }

    /// Sets bit `index`, returning whether it was already set.
    pub(crate) fn set(&mut self, index: usize) -> bool {
        let word = &mut self.words[index / 64];
        let mask = 1u64 << (index % 64);
        let previous = *word & mask != 0;
        *word |= mask;
        previous
    }

    pub(crate) fn get(&self, index: usize) -> bool {
        self.words[index / 64] & (1u64 << (index % 64)) != 0
    }

    /// Whether any bit is set.
    pub(crate) fn any(&self) -> bool {
        self.words.iter().any(|word| *word != 0)
    }
}

/// Per-kind frame state.
#[derive(Debug)]
pub(crate) enum FrameExtra<'s> {
    /// Stream-level state: how many documents have been seen.
    Stream { docs_seen: u32 },
    Doc,
    /// Mapping traversal state.
    Map {
        /// The mapping's field list.
        fields: &'s [Field<'s>],
        /// Which fields have been consumed (load) or emitted (save).
        seen: FieldBits,
        /// The field currently being processed.
        field_index: usize,
        /// Restricts iteration to a single field (live union variant).
        only: Option<usize>,
    },
    /// Sequence traversal state.
    Seq {
        /// Entries processed so far.
        index: u64,
        /// Total entries (save/copy); running count (load).
        count: u64,
        /// Where the entry count is written to, when known.
        count_out: *mut u8,
        /// Byte width of the count slot; zero when there is none.
        count_size: usize,
        /// Source entry storage.
        buffer_in: *const u8,
        /// Destination entry storage (grows for pointer sequences).
        buffer_out: *mut u8,
        /// Byte stride between entries.
        stride: usize,
        /// The parent slot holding the destination buffer pointer, so
        /// reallocation can republish it.
        slot_out: *mut u8,
    },
}

/// One level of the schema traversal.
#[derive(Debug)]
pub(crate) struct Frame<'s> {
    pub state: State,
    pub schema: &'s Schema<'s>,
    /// Base address of the native value being read.
    pub data_in: *const u8,
    /// Base address of the native value being written.
    pub data_out: *mut u8,
    /// Where in the document this frame began.
    pub mark: Mark,
    pub extra: FrameExtra<'s>,
}

/// The traversal stack.
#[derive(Debug)]
pub(crate) struct Stack<'s> {
    frames: Vec<Frame<'s>>,
}

impl<'s> Stack<'s> {
    pub(crate) fn new() -> Self {
        Stack { frames: Vec::new() }
    }

    pub(crate) fn push(&mut self, frame: Frame<'s>) {
        self.frames.push(frame);
    }

    pub(crate) fn pop(&mut self) -> Option<Frame<'s>> {
        self.frames.pop()
    }

    pub(crate) fn top(&self) -> Option<&Frame<'s>> {
        self.frames.last()
    }

    pub(crate) fn top_mut(&mut self) -> Option<&mut Frame<'s>> {
        self.frames.last_mut()
    }

    pub(crate) fn is_empty(&self) -> bool {
        self.frames.is_empty()
    }

    /// Frames from the top of the stack downwards.
    pub(crate) fn frames_top_down(&self) -> impl Iterator<Item = &Frame<'s>> {
        self.frames.iter().rev()
    }

    /// Locates the count slot for a sequence about to be pushed, and
    /// enforces the nesting rules.
    ///
    /// The slot comes from the current frame: a mapping supplies its
    /// selected field's count location, the document supplies the
    /// caller's top-level count, and a sequence admits only fixed-size
    /// children, which need no slot.
    pub(crate) fn resolve_sequence_target(
        &self,
        child: &Schema<'s>,
        top_count_out: *mut u8,
    ) -> Result<(*mut u8, usize)> {
        let fixed = match child.kind {
            SchemaKind::SequenceFixed { min, max, .. } => {
                if min != max {
                    return Err(new(ErrorImpl::SequenceFixedCount));
                }
                true
            }
            SchemaKind::Sequence { .. } => false,
            _ => return Err(new(ErrorImpl::InternalError)),
        };
        let Some(parent) = self.top() else {
            return Err(new(ErrorImpl::InternalError));
        };
        match &parent.extra {
            FrameExtra::Seq { .. } => {
                if fixed {
                    Ok((ptr::null_mut(), 0))
                } else {
                    Err(new(ErrorImpl::SequenceInSequence))
                }
            }
            _ if fixed => Ok((ptr::null_mut(), 0)),
            FrameExtra::Map {
                fields,
                field_index,
                ..
            } => {
                let field = &fields[*field_index];
                if field.count_size == 0 {
                    return Err(new(ErrorImpl::InvalidDataSize));
                }
                Ok((
                    parent.data_out.wrapping_add(field.count_offset),
                    field.count_size,
                ))
            }
            FrameExtra::Doc => Ok((top_count_out, std::mem::size_of::<u64>())),
            _ => Err(new(ErrorImpl::InternalError)),
        }
    }

    /// Logs one line per frame, top of the stack first, so failures can
    /// be traced to a document position and schema path.
    pub(crate) fn log_backtrace(&self, config: &Config) {
        for frame in self.frames_top_down() {
            let position = frame.mark;
            match &frame.extra {
                FrameExtra::Stream { .. } => {
                    config.log(LogLevel::Error, format_args!("  in stream, {}", position));
                }
                FrameExtra::Doc => {
                    config.log(LogLevel::Error, format_args!("  in document, {}", position));
                }
                FrameExtra::Map {
                    fields,
                    field_index,
                    ..
                } => {
                    if frame.state == State::InMappingValue && *field_index < fields.len() {
                        config.log(
                            LogLevel::Error,
                            format_args!(
                                "  in mapping field {:?}, {}",
                                fields[*field_index].key, position
                            ),
                        );
                    } else {
                        config.log(LogLevel::Error, format_args!("  in mapping, {}", position));
                    }
                }
                FrameExtra::Seq { index, .. } => {
                    config.log(
                        LogLevel::Error,
                        format_args!("  in sequence entry {}, {}", index, position),
                    );
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::FieldBits;

    #[test]
    fn field_bits_track_large_field_lists() {
        let mut bits = FieldBits::new(130);
        assert!(!bits.get(0));
        assert!(!bits.set(0));
        assert!(bits.set(0));
        assert!(!bits.set(64));
        assert!(!bits.set(129));
        assert!(bits.get(64));
        assert!(bits.get(129));
        assert!(!bits.get(128));
    }
}
