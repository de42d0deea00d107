// Copyright notice and licensing information.
// These lines indicate the copyright of the software and its licensing terms.
// SPDX-License-Identifier: Apache-2.0 OR MIT indicates dual licensing under Apache 2.0 or MIT licenses.
// Copyright © 2026 yaml_bind, Schema-Driven YAML Binding for Rust. All rights reserved.

//! The schema model: a recursive, declarative description of a native
//! value's shape and layout.
//!
//! A [`Schema`] node pairs storage details (`flags`, `data_size`) with a
//! [`SchemaKind`] payload describing the value. Mappings and unions
//! carry ordered [`Field`] arrays locating sub-values inside the parent
//! structure; enumerations and flag sets carry [`EnumEntry`] tables;
//! bitfields carry [`BitDef`] sub-field layouts.

use crate::error::{new, ErrorImpl, Result};
use crate::primitive::{read_int, sign_pad};
use std::ffi::c_void;
use std::ops::BitOr;

/// Validates a loaded signed integer; `false` rejects the document.
pub type IntValidator = fn(ctx: *mut c_void, value: i64) -> bool;
/// Validates a loaded unsigned integer.
pub type UintValidator = fn(ctx: *mut c_void, value: u64) -> bool;
/// Validates a loaded boolean.
pub type BoolValidator = fn(ctx: *mut c_void, value: bool) -> bool;
/// Validates a loaded floating-point value.
pub type FloatValidator = fn(ctx: *mut c_void, value: f64) -> bool;
/// Validates a loaded string before it is copied into place.
pub type StringValidator = fn(ctx: *mut c_void, value: &str) -> bool;
/// Validates a completed composite value in place.
pub type DataValidator = fn(ctx: *mut c_void, data: *const c_void) -> bool;

/// Behaviour flags attached to a single schema value.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct SchemaFlags(u32);

impl SchemaFlags {
    /// No flags.
    pub const NONE: SchemaFlags = SchemaFlags(0);
    /// The parent storage holds a pointer to a heap value rather than
    /// an inline instance.
    pub const POINTER: SchemaFlags = SchemaFlags(1 << 0);
    /// The value may be absent from the document.
    pub const OPTIONAL: SchemaFlags = SchemaFlags(1 << 1);
    /// Reject values that would otherwise fall back to a lenient
    /// reading (unnamed enum constants, leftover flag bits).
    pub const STRICT: SchemaFlags = SchemaFlags(1 << 2);
    /// Match names case-sensitively, overriding the configuration.
    pub const CASE_SENSITIVE: SchemaFlags = SchemaFlags(1 << 3);
    /// Match names case-insensitively, overriding the configuration.
    pub const CASE_INSENSITIVE: SchemaFlags = SchemaFlags(1 << 4);
    /// An empty scalar loads a pointer value as null.
    pub const NULL_ON_EMPTY: SchemaFlags = SchemaFlags(1 << 5);
    /// A null scalar (`~`, `null`, `Null`, `NULL`) loads a pointer
    /// value as null.
    pub const NULL_ON_NULL_STR: SchemaFlags = SchemaFlags(1 << 6);

    /// Whether every flag in `other` is set in `self`.
    pub const fn contains(self, other: SchemaFlags) -> bool {
        self.0 & other.0 == other.0
    }

    /// The union of two flag sets, usable in constant expressions.
    pub const fn union(self, other: SchemaFlags) -> SchemaFlags {
        SchemaFlags(self.0 | other.0)
    }
}

impl BitOr for SchemaFlags {
    type Output = SchemaFlags;

    fn bitor(self, rhs: SchemaFlags) -> SchemaFlags {
        self.union(rhs)
    }
}

/// One name/value pair in an enumeration or flag-set table.
#[derive(Copy, Clone, Debug)]
pub struct EnumEntry<'s> {
    /// The YAML spelling.
    pub name: &'s str,
    /// The native value (a bit mask for flag sets).
    pub value: i64,
}

impl<'s> EnumEntry<'s> {
    /// Builds a table entry.
    pub const fn new(name: &'s str, value: i64) -> Self {
        EnumEntry { name, value }
    }
}

/// One named sub-range of a bitfield value.
#[derive(Copy, Clone, Debug)]
pub struct BitDef<'s> {
    /// The YAML mapping key.
    pub name: &'s str,
    /// The first bit of the sub-field, counting from bit zero.
    pub bit_offset: u8,
    /// The width of the sub-field in bits.
    pub bit_width: u8,
}

impl<'s> BitDef<'s> {
    /// Builds a bitfield sub-field layout.
    pub const fn new(name: &'s str, bit_offset: u8, bit_width: u8) -> Self {
        BitDef {
            name,
            bit_offset,
            bit_width,
        }
    }
}

/// A default sequence value for optional sequence fields.
#[derive(Copy, Clone, Debug)]
pub struct SequenceDefault {
    /// The entries to clone from.
    pub data: *const c_void,
    /// How many entries `data` holds.
    pub count: u64,
}

/// The kind-specific payload of a schema value.
#[derive(Copy, Clone, Debug)]
pub enum SchemaKind<'s> {
    /// A signed integer of `data_size` bytes.
    Int {
        /// Inclusive lower bound, if any.
        min: Option<i64>,
        /// Inclusive upper bound, if any.
        max: Option<i64>,
        /// Client validation callback.
        validate: Option<IntValidator>,
        /// Default used when an optional field is absent.
        missing: Option<i64>,
    },
    /// An unsigned integer of `data_size` bytes.
    Uint {
        /// Inclusive lower bound, if any.
        min: Option<u64>,
        /// Inclusive upper bound, if any.
        max: Option<u64>,
        /// Client validation callback.
        validate: Option<UintValidator>,
        /// Default used when an optional field is absent.
        missing: Option<u64>,
    },
    /// A boolean stored as an integer of `data_size` bytes.
    Bool {
        /// Client validation callback.
        validate: Option<BoolValidator>,
        /// Default used when an optional field is absent.
        missing: Option<bool>,
    },
    /// A named constant stored as a signed integer.
    Enum {
        /// The name/value table.
        entries: &'s [EnumEntry<'s>],
        /// Client validation callback.
        validate: Option<IntValidator>,
        /// Default used when an optional field is absent.
        missing: Option<i64>,
    },
    /// An IEEE-754 value of 4 or 8 bytes.
    Float {
        /// Client validation callback.
        validate: Option<FloatValidator>,
        /// Default used when an optional field is absent.
        missing: Option<f64>,
    },
    /// A NUL-terminated string.
    String {
        /// Minimum length in bytes, excluding the terminator.
        min_len: usize,
        /// Maximum length in bytes, excluding the terminator.
        max_len: usize,
        /// Client validation callback.
        validate: Option<StringValidator>,
        /// Default used when an optional field is absent.
        missing: Option<&'s str>,
    },
    /// A raw byte array, base64-encoded on the YAML side.
    Binary {
        /// Minimum decoded length in bytes.
        min_len: usize,
        /// Maximum decoded length in bytes.
        max_len: usize,
    },
    /// A structure of named fields.
    Mapping {
        /// The ordered field list.
        fields: &'s [Field<'s>],
        /// Client validation callback, run after all fields load.
        validate: Option<DataValidator>,
        /// Default structure cloned when an optional field is absent.
        missing: Option<*const c_void>,
    },
    /// Named sub-ranges of a single integer, loaded from a mapping.
    Bitfield {
        /// The sub-field layouts.
        bits: &'s [BitDef<'s>],
        /// Client validation callback.
        validate: Option<UintValidator>,
        /// Default used when an optional field is absent.
        missing: Option<u64>,
    },
    /// A set of named bits, loaded from a sequence of names.
    Flags {
        /// The name/mask table.
        entries: &'s [EnumEntry<'s>],
        /// Client validation callback.
        validate: Option<UintValidator>,
        /// Default used when an optional field is absent.
        missing: Option<u64>,
    },
    /// A variable-length sequence.
    Sequence {
        /// The schema for each entry.
        entry: &'s Schema<'s>,
        /// Minimum entry count.
        min: u64,
        /// Maximum entry count; `u64::MAX` for unbounded.
        max: u64,
        /// Client validation callback, run after all entries load.
        validate: Option<DataValidator>,
        /// Default entries cloned when an optional field is absent.
        missing: Option<SequenceDefault>,
    },
    /// A fixed-length sequence: `min` and `max` must be equal.
    SequenceFixed {
        /// The schema for each entry.
        entry: &'s Schema<'s>,
        /// Required entry count (lower bound; must equal `max`).
        min: u64,
        /// Required entry count (upper bound; must equal `min`).
        max: u64,
        /// Client validation callback.
        validate: Option<DataValidator>,
    },
    /// A value consumed from the document and discarded.
    Ignore,
    /// A mapping-like value of which at most one field is live; the
    /// live field is named by an enumeration field (`discriminant`) in
    /// an ancestor mapping.
    Union {
        /// The variant field list.
        fields: &'s [Field<'s>],
        /// The name of the ancestor enumeration field selecting the
        /// live variant.
        discriminant: &'s str,
    },
}

/// A declarative description of one native value.
#[derive(Copy, Clone, Debug)]
pub struct Schema<'s> {
    /// Behaviour flags.
    pub flags: SchemaFlags,
    /// Size in bytes of the native storage: 1..=8 for scalar kinds,
    /// the structure size for mappings, the element stride for
    /// sequences.
    pub data_size: usize,
    /// The kind-specific payload.
    pub kind: SchemaKind<'s>,
}

/// One field of a mapping or union schema.
#[derive(Copy, Clone, Debug)]
pub struct Field<'s> {
    /// The YAML mapping key.
    pub key: &'s str,
    /// The field's value schema.
    pub value: Schema<'s>,
    /// Byte offset of the field inside the parent structure.
    pub data_offset: usize,
    /// Byte offset of the associated count field, used by sequence and
    /// variable-length binary fields.
    pub count_offset: usize,
    /// Byte size of the associated count field; zero when there is
    /// none.
    pub count_size: usize,
}

impl<'s> Field<'s> {
    /// Builds a field with no count slot.
    pub const fn new(key: &'s str, data_offset: usize, value: Schema<'s>) -> Self {
        Field {
            key,
            value,
            data_offset,
            count_offset: 0,
            count_size: 0,
        }
    }

    /// Builds a field whose entry count lives at `count_offset` in the
    /// parent structure, stored in `count_size` bytes.
    pub const fn with_count(
        key: &'s str,
        data_offset: usize,
        count_offset: usize,
        count_size: usize,
        value: Schema<'s>,
    ) -> Self {
        Field {
            key,
            value,
            data_offset,
            count_offset,
            count_size,
        }
    }
}

/// The YAML event shape a schema kind consumes.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub(crate) enum EventClass {
    Scalar,
    Mapping,
    Sequence,
    Any,
}

impl<'s> Schema<'s> {
    /// A signed integer schema.
    pub const fn int(flags: SchemaFlags, data_size: usize) -> Self {
        Schema {
            flags,
            data_size,
            kind: SchemaKind::Int {
                min: None,
                max: None,
                validate: None,
                missing: None,
            },
        }
    }

    /// An unsigned integer schema.
    pub const fn uint(flags: SchemaFlags, data_size: usize) -> Self {
        Schema {
            flags,
            data_size,
            kind: SchemaKind::Uint {
                min: None,
                max: None,
                validate: None,
                missing: None,
            },
        }
    }

    /// A boolean schema.
    pub const fn boolean(flags: SchemaFlags, data_size: usize) -> Self {
        Schema {
            flags,
            data_size,
            kind: SchemaKind::Bool {
                validate: None,
                missing: None,
            },
        }
    }

    /// A floating-point schema; `data_size` must be 4 or 8.
    pub const fn float(flags: SchemaFlags, data_size: usize) -> Self {
        Schema {
            flags,
            data_size,
            kind: SchemaKind::Float {
                validate: None,
                missing: None,
            },
        }
    }

    /// An enumeration schema over `entries`.
    pub const fn enumeration(
        flags: SchemaFlags,
        data_size: usize,
        entries: &'s [EnumEntry<'s>],
    ) -> Self {
        Schema {
            flags,
            data_size,
            kind: SchemaKind::Enum {
                entries,
                validate: None,
                missing: None,
            },
        }
    }

    /// A string schema. For inline storage `data_size` is the buffer
    /// capacity including the terminator; for pointer storage it is
    /// ignored.
    pub const fn string(
        flags: SchemaFlags,
        data_size: usize,
        min_len: usize,
        max_len: usize,
    ) -> Self {
        Schema {
            flags,
            data_size,
            kind: SchemaKind::String {
                min_len,
                max_len,
                validate: None,
                missing: None,
            },
        }
    }

    /// A binary schema, base64 on the YAML side.
    pub const fn binary(
        flags: SchemaFlags,
        data_size: usize,
        min_len: usize,
        max_len: usize,
    ) -> Self {
        Schema {
            flags,
            data_size,
            kind: SchemaKind::Binary { min_len, max_len },
        }
    }

    /// A flag-set schema over `entries`, loaded from a sequence of
    /// names.
    pub const fn flag_set(
        flags: SchemaFlags,
        data_size: usize,
        entries: &'s [EnumEntry<'s>],
    ) -> Self {
        Schema {
            flags,
            data_size,
            kind: SchemaKind::Flags {
                entries,
                validate: None,
                missing: None,
            },
        }
    }

    /// A bitfield schema over `bits`, loaded from a mapping of
    /// sub-field names to unsigned values.
    pub const fn bitfield(flags: SchemaFlags, data_size: usize, bits: &'s [BitDef<'s>]) -> Self {
        Schema {
            flags,
            data_size,
            kind: SchemaKind::Bitfield {
                bits,
                validate: None,
                missing: None,
            },
        }
    }

    /// A mapping schema over `fields`; `data_size` is the structure
    /// size.
    pub const fn mapping(flags: SchemaFlags, data_size: usize, fields: &'s [Field<'s>]) -> Self {
        Schema {
            flags,
            data_size,
            kind: SchemaKind::Mapping {
                fields,
                validate: None,
                missing: None,
            },
        }
    }

    /// A union schema over `fields`, discriminated by the ancestor
    /// enumeration field named `discriminant`.
    pub const fn tagged_union(
        flags: SchemaFlags,
        data_size: usize,
        fields: &'s [Field<'s>],
        discriminant: &'s str,
    ) -> Self {
        Schema {
            flags,
            data_size,
            kind: SchemaKind::Union {
                fields,
                discriminant,
            },
        }
    }

    /// A variable-length sequence schema; `entry_size` is the stride of
    /// one entry in the backing array.
    pub const fn sequence(
        flags: SchemaFlags,
        entry: &'s Schema<'s>,
        entry_size: usize,
        min: u64,
        max: u64,
    ) -> Self {
        Schema {
            flags,
            data_size: entry_size,
            kind: SchemaKind::Sequence {
                entry,
                min,
                max,
                validate: None,
                missing: None,
            },
        }
    }

    /// A fixed-length sequence schema of exactly `count` entries.
    pub const fn sequence_fixed(
        flags: SchemaFlags,
        entry: &'s Schema<'s>,
        entry_size: usize,
        count: u64,
    ) -> Self {
        Schema {
            flags,
            data_size: entry_size,
            kind: SchemaKind::SequenceFixed {
                entry,
                min: count,
                max: count,
                validate: None,
            },
        }
    }

    /// A schema entry that consumes and discards its value.
    pub const fn ignore() -> Self {
        Schema {
            flags: SchemaFlags::NONE,
            data_size: 0,
            kind: SchemaKind::Ignore,
        }
    }

    pub(crate) fn is_pointer(&self) -> bool {
        self.flags.contains(SchemaFlags::POINTER)
    }

    pub(crate) fn class(&self) -> EventClass {
        match self.kind {
            SchemaKind::Int { .. }
            | SchemaKind::Uint { .. }
            | SchemaKind::Bool { .. }
            | SchemaKind::Enum { .. }
            | SchemaKind::Float { .. }
            | SchemaKind::String { .. }
            | SchemaKind::Binary { .. } => EventClass::Scalar,
            SchemaKind::Mapping { .. } | SchemaKind::Bitfield { .. } | SchemaKind::Union { .. } => {
                EventClass::Mapping
            }
            SchemaKind::Sequence { .. }
            | SchemaKind::SequenceFixed { .. }
            | SchemaKind::Flags { .. } => EventClass::Sequence,
            SchemaKind::Ignore => EventClass::Any,
        }
    }

    /// Name matching sensitivity for this value, honouring the
    /// precedence schema-sensitive > schema-insensitive > configured
    /// default.
    pub(crate) fn names_case_insensitive(&self, config_default: bool) -> bool {
        if self.flags.contains(SchemaFlags::CASE_SENSITIVE) {
            false
        } else if self.flags.contains(SchemaFlags::CASE_INSENSITIVE) {
            true
        } else {
            config_default
        }
    }
}

/// Resolves the live variant of a union by reading its discriminant
/// from the nearest ancestor mapping that declares it.
///
/// # Safety
///
/// Each ancestor's data pointer must address a live structure laid out
/// as its schema describes.
pub(crate) unsafe fn resolve_union_variant<'s>(
    fields: &'s [Field<'s>],
    discriminant: &str,
    ancestors: impl Iterator<Item = (&'s Schema<'s>, *const u8)>,
) -> Result<usize> {
    let not_found = || {
        new(ErrorImpl::UnionDiscNotFound {
            discriminant: discriminant.to_string(),
        })
    };
    for (schema, data) in ancestors {
        let SchemaKind::Mapping {
            fields: ancestor_fields,
            ..
        } = &schema.kind
        else {
            continue;
        };
        let Some(field) = ancestor_fields.iter().find(|f| f.key == discriminant) else {
            continue;
        };
        let SchemaKind::Enum { entries, .. } = &field.value.kind else {
            return Err(not_found());
        };
        if field.value.is_pointer() {
            return Err(not_found());
        }
        let raw = unsafe { read_int(field.value.data_size, data.add(field.data_offset))? };
        let value = sign_pad(raw, field.value.data_size);
        let Some(entry) = entries.iter().find(|e| e.value == value) else {
            return Err(not_found());
        };
        let Some(index) = fields.iter().position(|f| f.key == entry.name) else {
            return Err(not_found());
        };
        return Ok(index);
    }
    Err(not_found())
}
