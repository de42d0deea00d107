// Copyright notice and licensing information.
// These lines indicate the copyright of the software and its licensing terms.
// SPDX-License-Identifier: Apache-2.0 OR MIT indicates dual licensing under Apache 2.0 or MIT licenses.
// Copyright © 2026 yaml_bind, Schema-Driven YAML Binding for Rust. All rights reserved.

//! Error and result types reported by every fallible operation.

use std::{
    error::Error as StdError,
    fmt::{self, Debug, Display},
    io, result,
};

/// An error that happened while loading, saving, copying or freeing a
/// value against a schema.
pub struct Error(Box<ErrorImpl>);

/// Alias for a `Result` with the error type `yaml_bind::Error`.
pub type Result<T> = result::Result<T, Error>;

/// The concrete failure behind an [`Error`].
///
/// Obtained through [`Error::kind`]; carries the input position for the
/// failures that have one.
#[derive(Debug)]
#[non_exhaustive]
pub enum ErrorImpl {
    /// The configured allocator returned null for a non-zero request.
    OutOfMemory,
    /// An alias was encountered while aliases are disabled.
    Alias(Location),
    /// An alias referred to an anchor that has not been defined.
    InvalidAlias(Location),
    /// An input or output file could not be opened or read.
    FileOpen(io::Error),
    /// A mapping key has no corresponding schema field.
    InvalidKey {
        /// The offending key text.
        key: String,
        /// Where the key was found.
        location: Location,
    },
    /// A value did not conform to its schema entry.
    InvalidValue(Location),
    /// The engine reached a state it believes unreachable.
    InternalError,
    /// An event arrived that the current state cannot accept.
    UnexpectedEvent(Location),
    /// A string was shorter than the schema minimum.
    StringLengthMin(Location),
    /// A string was longer than the schema maximum.
    StringLengthMax(Location),
    /// A scalar storage size outside 1..=8 bytes.
    InvalidDataSize,
    /// A schema entry's kind is not usable where it appears.
    BadTypeInSchema,
    /// A schema range with minimum above maximum.
    BadMinMaxSchema,
    /// The top-level schema kind cannot be loaded or saved.
    BadTopLevelType,
    /// A null configuration was supplied.
    BadParamNullConfig,
    /// A null schema was supplied.
    BadParamNullSchema,
    /// A null data argument was supplied.
    BadParamNullData,
    /// A sequence-count argument was required but absent, or supplied
    /// for a top-level schema that is not a sequence.
    BadParamSeqCount,
    /// The output slot already held a non-null pointer.
    DataTargetNonNull,
    /// The top-level schema value must carry the pointer flag.
    TopLevelNonPtr,
    /// A sequence ended with fewer entries than the schema minimum.
    SequenceEntriesMin(Location),
    /// A sequence exceeded the schema maximum entry count.
    SequenceEntriesMax(Location),
    /// A fixed-size sequence schema whose minimum and maximum differ.
    SequenceFixedCount,
    /// A variable-size sequence directly inside another sequence.
    SequenceInSequence,
    /// A required mapping field was absent from the document.
    MappingFieldMissing {
        /// The missing field's key.
        field: String,
        /// Where the mapping ended.
        location: Location,
    },
    /// The configuration has no allocator.
    BadConfigNullAllocator,
    /// The underlying parser could not be initialised.
    ParserInit,
    /// The underlying parser rejected the input.
    ParserError {
        /// The parser's description of the problem.
        problem: String,
        /// Where the parser stopped.
        location: Location,
    },
    /// The underlying emitter could not be initialised.
    EmitterInit,
    /// The underlying emitter or its output sink failed.
    EmitterError {
        /// The emitter's description of the problem.
        problem: String,
    },
    /// An emitter event could not be constructed.
    EventInit,
    /// A union's discriminant field could not be resolved against any
    /// ancestor mapping.
    UnionDiscNotFound {
        /// The discriminant field name the union asked for.
        discriminant: String,
    },
    /// A bitfield sub-field lies outside its storage width.
    BadBitvalInSchema,
    /// A bitfield value does not fit its sub-field width.
    BadBitfieldValueCount(Location),
}

/// The input location an error occurred at.
#[derive(Copy, Clone, Debug)]
pub struct Location {
    index: usize,
    line: usize,
    column: usize,
}

impl Location {
    pub(crate) fn new(index: u64, line: u64, column: u64) -> Self {
        // Parser marks are 0-indexed; error messages are 1-indexed.
        Location {
            index: index as usize,
            line: line as usize + 1,
            column: column as usize + 1,
        }
    }

    pub(crate) fn none() -> Self {
        Location {
            index: 0,
            line: 0,
            column: 0,
        }
    }

    /// The byte index of the error.
    pub fn index(&self) -> usize {
        self.index
    }

    /// The line of the error, 1-indexed.
    pub fn line(&self) -> usize {
        self.line
    }

    /// The column of the error, 1-indexed.
    pub fn column(&self) -> usize {
        self.column
    }

    fn is_some(&self) -> bool {
        self.line != 0 || self.column != 0
    }
}

impl Display for Location {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "line {} column {}", self.line, self.column)
    }
}

pub(crate) fn new(inner: ErrorImpl) -> Error {
    Error(Box::new(inner))
}

impl Error {
    /// Returns the input location of the error, if it has one.
    pub fn location(&self) -> Option<Location> {
        match self.0.location() {
            Some(location) if location.is_some() => Some(location),
            _ => None,
        }
    }

    /// Returns the concrete failure for inspection.
    pub fn kind(&self) -> &ErrorImpl {
        &self.0
    }
}

impl From<ErrorImpl> for Error {
    fn from(inner: ErrorImpl) -> Self {
        Error(Box::new(inner))
    }
}

impl StdError for Error {
    fn source(&self) -> Option<&(dyn StdError + 'static)> {
        match &*self.0 {
            ErrorImpl::FileOpen(err) => Some(err),
            _ => None,
        }
    }
}

impl Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.display(f)?;
        if let Some(location) = self.location() {
            write!(f, " at {}", location)?;
        }
        Ok(())
    }
}

// One layer of boxing removed so unwrap() output stays readable.
impl Debug for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Error({:?})", self.0)
    }
}

impl ErrorImpl {
    fn location(&self) -> Option<Location> {
        match self {
            ErrorImpl::Alias(location)
            | ErrorImpl::InvalidAlias(location)
            | ErrorImpl::InvalidValue(location)
            | ErrorImpl::UnexpectedEvent(location)
            | ErrorImpl::StringLengthMin(location)
            | ErrorImpl::StringLengthMax(location)
            | ErrorImpl::SequenceEntriesMin(location)
            | ErrorImpl::SequenceEntriesMax(location)
            | ErrorImpl::BadBitfieldValueCount(location)
            | ErrorImpl::InvalidKey { location, .. }
            | ErrorImpl::MappingFieldMissing { location, .. }
            | ErrorImpl::ParserError { location, .. } => Some(*location),
            _ => None,
        }
    }

    fn display(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ErrorImpl::OutOfMemory => f.write_str("memory allocation failure"),
            ErrorImpl::Alias(_) => f.write_str("alias encountered while aliases are disabled"),
            ErrorImpl::InvalidAlias(_) => f.write_str("alias refers to an undefined anchor"),
            ErrorImpl::FileOpen(err) => write!(f, "could not open or read file: {}", err),
            ErrorImpl::InvalidKey { key, .. } => {
                write!(f, "invalid mapping key: {:?}", key)
            }
            ErrorImpl::InvalidValue(_) => f.write_str("invalid value"),
            ErrorImpl::InternalError => f.write_str("internal error"),
            ErrorImpl::UnexpectedEvent(_) => f.write_str("unexpected event"),
            ErrorImpl::StringLengthMin(_) => f.write_str("string is shorter than the minimum"),
            ErrorImpl::StringLengthMax(_) => f.write_str("string is longer than the maximum"),
            ErrorImpl::InvalidDataSize => f.write_str("data size must be between 1 and 8 bytes"),
            ErrorImpl::BadTypeInSchema => f.write_str("schema contains a type invalid here"),
            ErrorImpl::BadMinMaxSchema => f.write_str("schema minimum exceeds maximum"),
            ErrorImpl::BadTopLevelType => f.write_str("top-level schema type is not loadable"),
            ErrorImpl::BadParamNullConfig => f.write_str("null configuration parameter"),
            ErrorImpl::BadParamNullSchema => f.write_str("null schema parameter"),
            ErrorImpl::BadParamNullData => f.write_str("null data parameter"),
            ErrorImpl::BadParamSeqCount => {
                f.write_str("sequence count required for top-level sequence schemas only")
            }
            ErrorImpl::DataTargetNonNull => f.write_str("output slot must start null"),
            ErrorImpl::TopLevelNonPtr => {
                f.write_str("top-level schema value must carry the pointer flag")
            }
            ErrorImpl::SequenceEntriesMin(_) => f.write_str("too few sequence entries"),
            ErrorImpl::SequenceEntriesMax(_) => f.write_str("too many sequence entries"),
            ErrorImpl::SequenceFixedCount => {
                f.write_str("fixed sequence schema minimum and maximum differ")
            }
            ErrorImpl::SequenceInSequence => {
                f.write_str("sequence directly inside another sequence")
            }
            ErrorImpl::MappingFieldMissing { field, .. } => {
                write!(f, "missing required mapping field: {:?}", field)
            }
            ErrorImpl::BadConfigNullAllocator => f.write_str("configuration has no allocator"),
            ErrorImpl::ParserInit => f.write_str("could not initialise the parser"),
            ErrorImpl::ParserError { problem, .. } => write!(f, "parser error: {}", problem),
            ErrorImpl::EmitterInit => f.write_str("could not initialise the emitter"),
            ErrorImpl::EmitterError { problem } => write!(f, "emitter error: {}", problem),
            ErrorImpl::EventInit => f.write_str("could not construct an emitter event"),
            ErrorImpl::UnionDiscNotFound { discriminant } => {
                write!(f, "union discriminant field not found: {:?}", discriminant)
            }
            ErrorImpl::BadBitvalInSchema => {
                f.write_str("bitfield sub-field lies outside its storage")
            }
            ErrorImpl::BadBitfieldValueCount(_) => {
                f.write_str("bitfield value does not fit its sub-field width")
            }
        }
    }
}
