// Copyright notice and licensing information.
// These lines indicate the copyright of the software and its licensing terms.
// SPDX-License-Identifier: Apache-2.0 OR MIT indicates dual licensing under Apache 2.0 or MIT licenses.
// Copyright © 2026 yaml_bind, Schema-Driven YAML Binding for Rust. All rights reserved.

//! The freer driver: post-order release of everything the loader or
//! cloner allocated.
//!
//! Unlike the other drivers this one recurses natively: its depth is
//! bounded by the schema the caller authored, it allocates nothing, and
//! it has no partial-failure path, so the explicit stack would buy
//! nothing. Each recursion level keeps a back-pointer to its parent so
//! unions can resolve their discriminant on the way down.

use crate::config::{Config, LogLevel};
use crate::mem;
use crate::primitive::read_int;
use crate::schema::{resolve_union_variant, Schema, SchemaKind};
use std::ffi::c_void;
use std::ptr;

/// One level of the ancestor chain used for union discriminants.
struct Parent<'a, 's> {
    schema: &'s Schema<'s>,
    data: *const u8,
    prev: Option<&'a Parent<'a, 's>>,
}

struct Ancestors<'a, 's> {
    cursor: Option<&'a Parent<'a, 's>>,
}

impl<'a, 's> Iterator for Ancestors<'a, 's> {
    type Item = (&'s Schema<'s>, *const u8);

    fn next(&mut self) -> Option<Self::Item> {
        let parent = self.cursor?;
        self.cursor = parent.prev;
        Some((parent.schema, parent.data))
    }
}

/// Releases the tree rooted in `*root` and nulls the slot, so a second
/// call is a safe no-op.
///
/// # Safety
///
/// `*root`, when non-null, must be a tree produced by the loader or
/// cloner against the same `schema`, with `seq_count` the entry count
/// returned for a top-level sequence.
pub(crate) unsafe fn free_tree(
    config: &Config,
    schema: &Schema<'_>,
    root: &mut *mut c_void,
    seq_count: u64,
) {
    if root.is_null() || !schema.is_pointer() {
        return;
    }
    let count = match schema.kind {
        SchemaKind::Sequence { .. } => seq_count,
        SchemaKind::SequenceFixed { max, .. } => max,
        _ => 0,
    };
    let slot = ptr::from_mut(root).cast::<u8>();
    free_value(config, schema, slot, count, None);
}

/// Releases the children of an embedded (non-pointer) root without
/// touching the root's own storage.
pub(crate) unsafe fn free_children(
    config: &Config,
    schema: &Schema<'_>,
    data: *mut u8,
    count: u64,
) {
    if schema.is_pointer() {
        return;
    }
    free_value(config, schema, data, count, None);
}

unsafe fn free_value(
    config: &Config,
    schema: &Schema<'_>,
    slot: *mut u8,
    count: u64,
    parent: Option<&Parent<'_, '_>>,
) {
    let (data, owned) = if schema.is_pointer() {
        let data = *slot.cast::<*mut u8>();
        if data.is_null() {
            return;
        }
        (data, true)
    } else {
        (slot, false)
    };
    match schema.kind {
        SchemaKind::Mapping { fields, .. } => {
            let me = Parent {
                schema,
                data: data.cast_const(),
                prev: parent,
            };
            for field in fields {
                let child_count = field_count(field, data.cast_const());
                free_value(
                    config,
                    &field.value,
                    data.add(field.data_offset),
                    child_count,
                    Some(&me),
                );
            }
        }
        SchemaKind::Union {
            fields,
            discriminant,
        } => {
            let ancestors = Ancestors { cursor: parent };
            match resolve_union_variant(fields, discriminant, ancestors) {
                Ok(variant) => {
                    let me = Parent {
                        schema,
                        data: data.cast_const(),
                        prev: parent,
                    };
                    let field = &fields[variant];
                    let child_count = field_count(field, data.cast_const());
                    free_value(
                        config,
                        &field.value,
                        data.add(field.data_offset),
                        child_count,
                        Some(&me),
                    );
                }
                Err(_) => {
                    // The freer cannot surface errors; an unresolvable
                    // discriminant leaks that branch.
                    config.log(
                        LogLevel::Debug,
                        format_args!("union discriminant {:?} unresolved; leaking", discriminant),
                    );
                }
            }
        }
        SchemaKind::Sequence { entry, .. } | SchemaKind::SequenceFixed { entry, .. } => {
            let stride = schema.data_size;
            let entry_count = match entry.kind {
                SchemaKind::SequenceFixed { max, .. } => max,
                _ => 0,
            };
            for index in 0..count as usize {
                free_value(config, entry, data.add(index * stride), entry_count, parent);
            }
        }
        _ => {}
    }
    if owned {
        mem::release(config, data);
        *slot.cast::<*mut u8>() = ptr::null_mut();
    }
}

/// The count governing `field`, read from the parent structure.
unsafe fn field_count(field: &crate::schema::Field<'_>, parent_data: *const u8) -> u64 {
    match field.value.kind {
        SchemaKind::Sequence { .. } | SchemaKind::Binary { .. } if field.count_size != 0 => {
            read_int(field.count_size, parent_data.add(field.count_offset))
                .ok()
                .unwrap_or(0)
        }
        SchemaKind::SequenceFixed { max, .. } => max,
        _ => 0,
    }
}
