// Copyright notice and licensing information.
// These lines indicate the copyright of the software and its licensing terms.
// SPDX-License-Identifier: Apache-2.0 OR MIT indicates dual licensing under Apache 2.0 or MIT licenses.
// Copyright © 2026 yaml_bind, Schema-Driven YAML Binding for Rust. All rights reserved.

//! A safe event emitter writing through any `io::Write` sink.

use crate::error::{new, Error, ErrorImpl, Result};
use crate::libyml::{error, util::Pinned};
use std::ffi::c_void;
use std::io;
use std::mem::{self, MaybeUninit};
use std::ptr::{self, addr_of_mut};
use std::slice;
#[allow(clippy::unsafe_removed_from_name)]
use libyml as sys;

/// A YAML event emitter bound to one output sink.
#[derive(Debug)]
pub(crate) struct Emitter<'a> {
    pin: Pinned<EmitterPinned<'a>>,
}

struct EmitterPinned<'a> {
    sys: sys::YamlEmitterT,
    write: Box<dyn io::Write + 'a>,
    write_error: Option<io::Error>,
}

/// One event to emit.
#[derive(Debug)]
pub(crate) enum Event<'a> {
    StreamStart,
    StreamEnd,
    DocumentStart,
    DocumentEnd,
    Scalar(Scalar<'a>),
    SequenceStart,
    SequenceEnd,
    MappingStart,
    MappingEnd,
}

/// A scalar to emit. The tag is carried implicitly: it never appears in
/// the output, but records the standard resolution of the value.
#[derive(Debug)]
pub(crate) struct Scalar<'a> {
    /// Standard tag for the scalar, e.g. `tag:yaml.org,2002:int`.
    pub tag: Option<&'static str>,
    /// The scalar text.
    pub value: &'a str,
    /// Requested presentation style.
    pub style: ScalarStyle,
}

/// Presentation styles used on output.
#[derive(Debug)]
pub(crate) enum ScalarStyle {
    /// Let the emitter pick; quotes values that cannot be plain.
    Any,
    /// Force plain (unquoted) presentation.
    Plain,
}

impl<'a> Emitter<'a> {
    /// Binds an emitter to `write`.
    ///
    /// Fails with `EmitterInit` when the underlying emitter state
    /// cannot be initialised.
    pub(crate) fn new(write: Box<dyn io::Write + 'a>) -> Result<Emitter<'a>> {
        // As with the parser, the sys state starts zeroed and is
        // initialised in place at its pinned address.
        let pin = Pinned::new(EmitterPinned {
            sys: unsafe { MaybeUninit::<sys::YamlEmitterT>::zeroed().assume_init() },
            write,
            write_error: None,
        });
        unsafe {
            let emitter = addr_of_mut!((*pin.as_ptr()).sys);
            if sys::yaml_emitter_initialize(emitter).fail {
                return Err(new(ErrorImpl::EmitterInit));
            }
            sys::yaml_emitter_set_unicode(emitter, true);
            sys::yaml_emitter_set_width(emitter, -1);
            sys::yaml_emitter_set_output(emitter, write_handler, pin.as_ptr().cast());
        }
        Ok(Emitter { pin })
    }

    /// Emits one event.
    pub(crate) fn emit(&mut self, event: Event<'_>) -> Result<()> {
        let mut sys_event = MaybeUninit::<sys::YamlEventT>::uninit();
        let sys_event = sys_event.as_mut_ptr();
        unsafe {
            let emitter = addr_of_mut!((*self.pin.as_ptr()).sys);
            let initialize_status = match event {
                Event::StreamStart => {
                    sys::yaml_stream_start_event_initialize(sys_event, sys::YamlUtf8Encoding)
                }
                Event::StreamEnd => sys::yaml_stream_end_event_initialize(sys_event),
                Event::DocumentStart => {
                    let version_directive = ptr::null_mut();
                    let tag_directives_start = ptr::null_mut();
                    let tag_directives_end = ptr::null_mut();
                    let implicit = true;
                    sys::yaml_document_start_event_initialize(
                        sys_event,
                        version_directive,
                        tag_directives_start,
                        tag_directives_end,
                        implicit,
                    )
                }
                Event::DocumentEnd => {
                    let implicit = true;
                    sys::yaml_document_end_event_initialize(sys_event, implicit)
                }
                Event::Scalar(scalar) => {
                    let mut tag_buffer;
                    let tag = match scalar.tag {
                        Some(tag) => {
                            tag_buffer = String::with_capacity(tag.len() + 1);
                            tag_buffer.push_str(tag);
                            tag_buffer.push('\0');
                            tag_buffer.as_ptr()
                        }
                        None => ptr::null(),
                    };
                    let anchor = ptr::null();
                    let value = scalar.value.as_ptr();
                    let length = scalar.value.len() as i32;
                    // The tag records the standard resolution only; it
                    // is never written out.
                    let plain_implicit = true;
                    let quoted_implicit = true;
                    let style = match scalar.style {
                        ScalarStyle::Any => sys::YamlAnyScalarStyle,
                        ScalarStyle::Plain => sys::YamlPlainScalarStyle,
                    };
                    sys::yaml_scalar_event_initialize(
                        sys_event,
                        anchor,
                        tag,
                        value,
                        length,
                        plain_implicit,
                        quoted_implicit,
                        style,
                    )
                }
                Event::SequenceStart => {
                    let anchor = ptr::null();
                    let tag = ptr::null();
                    let implicit = true;
                    sys::yaml_sequence_start_event_initialize(
                        sys_event,
                        anchor,
                        tag,
                        implicit,
                        sys::YamlAnySequenceStyle,
                    )
                }
                Event::SequenceEnd => sys::yaml_sequence_end_event_initialize(sys_event),
                Event::MappingStart => {
                    let anchor = ptr::null();
                    let tag = ptr::null();
                    let implicit = true;
                    sys::yaml_mapping_start_event_initialize(
                        sys_event,
                        anchor,
                        tag,
                        implicit,
                        sys::YamlAnyMappingStyle,
                    )
                }
                Event::MappingEnd => sys::yaml_mapping_end_event_initialize(sys_event),
            };
            if initialize_status.fail {
                return Err(new(ErrorImpl::EventInit));
            }
            if sys::yaml_emitter_emit(emitter, sys_event).fail {
                return Err(self.error());
            }
        }
        Ok(())
    }

    /// Flushes buffered output through the sink.
    pub(crate) fn flush(&mut self) -> Result<()> {
        unsafe {
            let emitter = addr_of_mut!((*self.pin.as_ptr()).sys);
            if sys::yaml_emitter_flush(emitter).fail {
                return Err(self.error());
            }
        }
        Ok(())
    }

    /// Recovers the sink, replacing it with a null writer.
    pub(crate) fn into_inner(self) -> Box<dyn io::Write + 'a> {
        let sink = Box::new(io::sink());
        unsafe { mem::replace(&mut (*self.pin.as_ptr()).write, sink) }
    }

    fn error(&mut self) -> Error {
        let emitter = unsafe { &mut *self.pin.as_ptr() };
        if let Some(write_error) = emitter.write_error.take() {
            new(ErrorImpl::EmitterError {
                problem: write_error.to_string(),
            })
        } else {
            unsafe { error::emit_error(&emitter.sys) }
        }
    }
}

unsafe fn write_handler(data: *mut c_void, buffer: *mut u8, size: u64) -> i32 {
    let data = data.cast::<EmitterPinned<'_>>();
    match io::Write::write_all(unsafe { &mut *(*data).write }, unsafe {
        slice::from_raw_parts(buffer, size as usize)
    }) {
        Ok(()) => 1,
        Err(err) => {
            unsafe {
                (*data).write_error = Some(err);
            }
            0
        }
    }
}

impl Drop for EmitterPinned<'_> {
    fn drop(&mut self) {
        unsafe { sys::yaml_emitter_delete(&mut self.sys) }
    }
}
