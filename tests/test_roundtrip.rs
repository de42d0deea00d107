// Copyright notice and licensing information.
// These lines indicate the copyright of the software and its licensing terms.
// SPDX-License-Identifier: Apache-2.0 OR MIT indicates dual licensing under Apache 2.0 or MIT licenses.
// Copyright © 2026 yaml_bind, Schema-Driven YAML Binding for Rust. All rights reserved.

//! Load → save → load round trips.

#[cfg(test)]
mod tests {
    use core::mem::{offset_of, size_of};
    use indoc::indoc;
    use std::ffi::{c_char, c_void, CStr};
    use std::ptr;
    use yaml_bind::{BitDef, Config, EnumEntry, Field, Schema, SchemaFlags};

    #[repr(C)]
    struct Everything {
        signed_val: i32,
        unsigned_val: u64,
        truthy: u8,
        ratio: f64,
        name: *const c_char,
        tag: [u8; 8],
        bits: u32,
        packed: u16,
        values: *mut i32,
        values_count: u32,
    }

    static FLAG_ENTRIES: [EnumEntry<'_>; 3] = [
        EnumEntry::new("read", 1),
        EnumEntry::new("write", 2),
        EnumEntry::new("exec", 4),
    ];

    static BIT_DEFS: [BitDef<'_>; 2] = [BitDef::new("low", 0, 8), BitDef::new("high", 8, 8)];

    fn everything_fields<'a>(entry: &'a Schema<'a>) -> [Field<'a>; 9] {
        [
            Field::new(
                "signed_val",
                offset_of!(Everything, signed_val),
                Schema::int(SchemaFlags::NONE, 4),
            ),
            Field::new(
                "unsigned_val",
                offset_of!(Everything, unsigned_val),
                Schema::uint(SchemaFlags::NONE, 8),
            ),
            Field::new(
                "truthy",
                offset_of!(Everything, truthy),
                Schema::boolean(SchemaFlags::NONE, 1),
            ),
            Field::new(
                "ratio",
                offset_of!(Everything, ratio),
                Schema::float(SchemaFlags::NONE, 8),
            ),
            Field::new(
                "name",
                offset_of!(Everything, name),
                Schema::string(SchemaFlags::POINTER, 0, 0, 64),
            ),
            Field::new(
                "tag",
                offset_of!(Everything, tag),
                Schema::string(SchemaFlags::NONE, 8, 0, 7),
            ),
            Field::new(
                "bits",
                offset_of!(Everything, bits),
                Schema::flag_set(SchemaFlags::NONE, 4, &FLAG_ENTRIES),
            ),
            Field::new(
                "packed",
                offset_of!(Everything, packed),
                Schema::bitfield(SchemaFlags::NONE, 2, &BIT_DEFS),
            ),
            Field::with_count(
                "values",
                offset_of!(Everything, values),
                offset_of!(Everything, values_count),
                4,
                Schema::sequence(SchemaFlags::POINTER, entry, 4, 0, u64::MAX),
            ),
        ]
    }

    #[test]
    fn loaded_tree_survives_save_and_reload() {
        let entry = Schema::int(SchemaFlags::NONE, 4);
        let fields = everything_fields(&entry);
        let schema = Schema::mapping(SchemaFlags::POINTER, size_of::<Everything>(), &fields);
        let config = Config::default();
        let input = indoc! {"
            signed_val: -19
            unsigned_val: 18446744073709551615
            truthy: true
            ratio: 0.5
            name: round trip
            tag: abc
            bits:
            - read
            - exec
            packed:
              low: 17
              high: 3
            values:
            - 5
            - -6
            - 7
        "};

        let mut first: *mut c_void = ptr::null_mut();
        unsafe {
            yaml_bind::load_str(&config, &schema, input, &mut first, None).unwrap();
            let saved = yaml_bind::save_string(&config, &schema, first.cast_const(), None).unwrap();

            let mut second: *mut c_void = ptr::null_mut();
            yaml_bind::load_str(&config, &schema, &saved, &mut second, None).unwrap();
            let resaved = yaml_bind::save_string(&config, &schema, second.cast_const(), None).unwrap();
            assert_eq!(saved, resaved);

            let a = &*first.cast::<Everything>();
            let b = &*second.cast::<Everything>();
            assert_eq!(a.signed_val, b.signed_val);
            assert_eq!(a.signed_val, -19);
            assert_eq!(a.unsigned_val, u64::MAX);
            assert_eq!(a.unsigned_val, b.unsigned_val);
            assert_eq!(a.truthy, 1);
            assert_eq!(a.truthy, b.truthy);
            assert_eq!(a.ratio, 0.5);
            assert_eq!(a.ratio, b.ratio);
            assert_eq!(
                CStr::from_ptr(a.name).to_bytes(),
                CStr::from_ptr(b.name).to_bytes()
            );
            assert_eq!(a.tag, b.tag);
            assert_eq!(a.bits, 5);
            assert_eq!(a.bits, b.bits);
            assert_eq!(a.packed, 17u16 | (3u16 << 8));
            assert_eq!(a.packed, b.packed);
            assert_eq!(a.values_count, 3);
            assert_eq!(a.values_count, b.values_count);
            assert_eq!(
                std::slice::from_raw_parts(a.values, 3),
                std::slice::from_raw_parts(b.values, 3)
            );

            yaml_bind::free(&config, &schema, &mut first, None);
            yaml_bind::free(&config, &schema, &mut second, None);
        }
    }

    #[test]
    fn programmatic_value_round_trips() {
        #[repr(C)]
        struct Point {
            x: i32,
            y: i32,
        }

        let fields = [
            Field::new("x", offset_of!(Point, x), Schema::int(SchemaFlags::NONE, 4)),
            Field::new("y", offset_of!(Point, y), Schema::int(SchemaFlags::NONE, 4)),
        ];
        let schema = Schema::mapping(SchemaFlags::POINTER, size_of::<Point>(), &fields);
        let config = Config::default();
        let source = Point { x: -4, y: 1000 };
        unsafe {
            let text = yaml_bind::save_string(
                &config,
                &schema,
                ptr::addr_of!(source).cast::<c_void>(),
                None,
            )
            .unwrap();
            let mut loaded: *mut c_void = ptr::null_mut();
            yaml_bind::load_str(&config, &schema, &text, &mut loaded, None).unwrap();
            let point = &*loaded.cast::<Point>();
            assert_eq!(point.x, -4);
            assert_eq!(point.y, 1000);
            yaml_bind::free(&config, &schema, &mut loaded, None);
        }
    }

    #[test]
    fn null_pointer_round_trips_through_empty_scalar() {
        #[repr(C)]
        struct Target {
            p: *mut i32,
        }

        let fields = [Field::new(
            "p",
            offset_of!(Target, p),
            Schema::int(
                SchemaFlags::POINTER.union(SchemaFlags::NULL_ON_EMPTY),
                4,
            ),
        )];
        let schema = Schema::mapping(SchemaFlags::POINTER, size_of::<Target>(), &fields);
        let config = Config::default();
        let source = Target { p: ptr::null_mut() };
        unsafe {
            let text = yaml_bind::save_string(
                &config,
                &schema,
                ptr::addr_of!(source).cast::<c_void>(),
                None,
            )
            .unwrap();
            let mut loaded: *mut c_void = ptr::null_mut();
            yaml_bind::load_str(&config, &schema, &text, &mut loaded, None).unwrap();
            assert!((*loaded.cast::<Target>()).p.is_null());
            yaml_bind::free(&config, &schema, &mut loaded, None);
        }
    }

    #[test]
    fn binary_round_trips_through_base64() {
        #[repr(C)]
        struct Target {
            blob: *mut u8,
            blob_len: u32,
        }

        let fields = [Field::with_count(
            "blob",
            offset_of!(Target, blob),
            offset_of!(Target, blob_len),
            4,
            Schema::binary(SchemaFlags::POINTER, 0, 0, 256),
        )];
        let schema = Schema::mapping(SchemaFlags::POINTER, size_of::<Target>(), &fields);
        let config = Config::default();
        let payload: [u8; 6] = [0, 1, 2, 253, 254, 255];
        let source = Target {
            blob: payload.as_ptr().cast_mut(),
            blob_len: 6,
        };
        unsafe {
            let text = yaml_bind::save_string(
                &config,
                &schema,
                ptr::addr_of!(source).cast::<c_void>(),
                None,
            )
            .unwrap();
            let mut loaded: *mut c_void = ptr::null_mut();
            yaml_bind::load_str(&config, &schema, &text, &mut loaded, None).unwrap();
            let target = &*loaded.cast::<Target>();
            assert_eq!(target.blob_len, 6);
            assert_eq!(std::slice::from_raw_parts(target.blob, 6), &payload);
            yaml_bind::free(&config, &schema, &mut loaded, None);
        }
    }

    #[test]
    fn union_round_trips_live_variant_only() {
        #[repr(C)]
        struct Target {
            kind: i32,
            number: i64,
            label: [u8; 12],
        }

        static KINDS: [EnumEntry<'_>; 2] =
            [EnumEntry::new("number", 0), EnumEntry::new("label", 1)];
        let union_fields = [
            Field::new(
                "number",
                offset_of!(Target, number),
                Schema::int(SchemaFlags::NONE, 8),
            ),
            Field::new(
                "label",
                offset_of!(Target, label),
                Schema::string(SchemaFlags::NONE, 12, 0, 11),
            ),
        ];
        let fields = [
            Field::new(
                "kind",
                offset_of!(Target, kind),
                Schema::enumeration(SchemaFlags::NONE, 4, &KINDS),
            ),
            Field::new(
                "value",
                0,
                Schema::tagged_union(SchemaFlags::NONE, 0, &union_fields, "kind"),
            ),
        ];
        let schema = Schema::mapping(SchemaFlags::POINTER, size_of::<Target>(), &fields);
        let config = Config::default();
        unsafe {
            let mut loaded: *mut c_void = ptr::null_mut();
            yaml_bind::load_str(
                &config,
                &schema,
                "kind: label\nvalue:\n  label: active\n",
                &mut loaded,
                None,
            )
            .unwrap();
            let target = &*loaded.cast::<Target>();
            assert_eq!(target.kind, 1);
            assert_eq!(
                CStr::from_ptr(target.label.as_ptr().cast::<c_char>())
                    .to_str()
                    .unwrap(),
                "active"
            );

            let text = yaml_bind::save_string(&config, &schema, loaded.cast_const(), None).unwrap();
            // Only the live variant appears.
            assert!(text.contains("label: active"));
            assert!(!text.contains("number"));

            let mut reloaded: *mut c_void = ptr::null_mut();
            yaml_bind::load_str(&config, &schema, &text, &mut reloaded, None).unwrap();
            let second = &*reloaded.cast::<Target>();
            assert_eq!(second.kind, 1);
            assert_eq!(
                CStr::from_ptr(second.label.as_ptr().cast::<c_char>())
                    .to_str()
                    .unwrap(),
                "active"
            );

            yaml_bind::free(&config, &schema, &mut loaded, None);
            yaml_bind::free(&config, &schema, &mut reloaded, None);
        }
    }

    #[test]
    fn top_level_sequence_round_trips() {
        let entry = Schema::int(SchemaFlags::NONE, 4);
        let schema = Schema::sequence(SchemaFlags::POINTER, &entry, 4, 0, u64::MAX);
        let config = Config::default();
        let mut first: *mut c_void = ptr::null_mut();
        let mut count = 0u64;
        unsafe {
            yaml_bind::load_str(&config, &schema, "- 1\n- 1\n- 2\n- 3\n- 5\n", &mut first, Some(&mut count))
                .unwrap();
            let text =
                yaml_bind::save_string(&config, &schema, first.cast_const(), Some(count)).unwrap();
            assert_eq!(text, "- 1\n- 1\n- 2\n- 3\n- 5\n");

            let mut second: *mut c_void = ptr::null_mut();
            let mut second_count = 0u64;
            yaml_bind::load_str(&config, &schema, &text, &mut second, Some(&mut second_count))
                .unwrap();
            assert_eq!(second_count, count);
            assert_eq!(
                std::slice::from_raw_parts(first.cast::<i32>(), count as usize),
                std::slice::from_raw_parts(second.cast::<i32>(), count as usize)
            );
            yaml_bind::free(&config, &schema, &mut first, Some(count));
            yaml_bind::free(&config, &schema, &mut second, Some(second_count));
        }
    }
}
