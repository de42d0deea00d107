// Copyright notice and licensing information.
// These lines indicate the copyright of the software and its licensing terms.
// SPDX-License-Identifier: Apache-2.0 OR MIT indicates dual licensing under Apache 2.0 or MIT licenses.
// Copyright © 2026 yaml_bind, Schema-Driven YAML Binding for Rust. All rights reserved.

//! Loading YAML documents into native values.

#[cfg(test)]
mod tests {
    use core::mem::{offset_of, size_of};
    use std::ffi::{c_char, c_void, CStr};
    use std::ptr;
    use yaml_bind::{
        Config, ConfigFlags, EnumEntry, Field, Schema, SchemaFlags, SchemaKind,
    };

    fn ptr_flags() -> SchemaFlags {
        SchemaFlags::POINTER
    }

    #[test]
    fn loads_positive_signed_int() {
        #[repr(C)]
        struct Target {
            test_int: i32,
        }

        let fields = [Field::new(
            "test_int",
            offset_of!(Target, test_int),
            Schema::int(SchemaFlags::NONE, 4),
        )];
        let schema = Schema::mapping(ptr_flags(), size_of::<Target>(), &fields);
        let config = Config::default();
        let mut root: *mut c_void = ptr::null_mut();
        unsafe {
            yaml_bind::load_str(&config, &schema, "test_int: 90\n", &mut root, None).unwrap();
            assert!(!root.is_null());
            assert_eq!((*root.cast::<Target>()).test_int, 90);
            yaml_bind::free(&config, &schema, &mut root, None);
        }
        assert!(root.is_null());
    }

    #[test]
    fn loads_negative_and_prefixed_ints() {
        #[repr(C)]
        struct Target {
            a: i64,
            b: i16,
            c: i32,
        }

        let fields = [
            Field::new("a", offset_of!(Target, a), Schema::int(SchemaFlags::NONE, 8)),
            Field::new("b", offset_of!(Target, b), Schema::int(SchemaFlags::NONE, 2)),
            Field::new("c", offset_of!(Target, c), Schema::int(SchemaFlags::NONE, 4)),
        ];
        let schema = Schema::mapping(ptr_flags(), size_of::<Target>(), &fields);
        let config = Config::default();
        let mut root: *mut c_void = ptr::null_mut();
        unsafe {
            yaml_bind::load_str(&config, &schema, "a: -12345\nb: 0x7f\nc: 010\n", &mut root, None)
                .unwrap();
            let target = &*root.cast::<Target>();
            assert_eq!(target.a, -12345);
            assert_eq!(target.b, 127);
            assert_eq!(target.c, 8);
            yaml_bind::free(&config, &schema, &mut root, None);
        }
    }

    #[test]
    fn loads_scalar_kinds() {
        #[repr(C)]
        struct Target {
            count: u32,
            tiny: u8,
            on: u8,
            off: u8,
            ratio: f32,
            precise: f64,
        }

        let fields = [
            Field::new("count", offset_of!(Target, count), Schema::uint(SchemaFlags::NONE, 4)),
            Field::new("tiny", offset_of!(Target, tiny), Schema::uint(SchemaFlags::NONE, 1)),
            Field::new("on", offset_of!(Target, on), Schema::boolean(SchemaFlags::NONE, 1)),
            Field::new("off", offset_of!(Target, off), Schema::boolean(SchemaFlags::NONE, 1)),
            Field::new("ratio", offset_of!(Target, ratio), Schema::float(SchemaFlags::NONE, 4)),
            Field::new(
                "precise",
                offset_of!(Target, precise),
                Schema::float(SchemaFlags::NONE, 8),
            ),
        ];
        let schema = Schema::mapping(ptr_flags(), size_of::<Target>(), &fields);
        let config = Config::default();
        let input = "count: 4000000000\ntiny: 255\non: yes\noff: Disable\nratio: 1.5\nprecise: 0.25\n";
        let mut root: *mut c_void = ptr::null_mut();
        unsafe {
            yaml_bind::load_str(&config, &schema, input, &mut root, None).unwrap();
            let target = &*root.cast::<Target>();
            assert_eq!(target.count, 4_000_000_000);
            assert_eq!(target.tiny, 255);
            assert_eq!(target.on, 1);
            assert_eq!(target.off, 0);
            assert_eq!(target.ratio, 1.5f32);
            assert_eq!(target.precise, 0.25f64);
            yaml_bind::free(&config, &schema, &mut root, None);
        }
    }

    #[test]
    fn loads_enum_case_insensitively_from_config() {
        static ENTRIES: [EnumEntry<'_>; 3] = [
            EnumEntry::new("first", 0),
            EnumEntry::new("second", 1),
            EnumEntry::new("third", 2),
        ];
        let schema = Schema::enumeration(ptr_flags(), 4, &ENTRIES);
        let config = Config {
            flags: ConfigFlags::CASE_INSENSITIVE,
            ..Config::default()
        };
        let mut root: *mut c_void = ptr::null_mut();
        unsafe {
            yaml_bind::load_str(&config, &schema, "SECOND\n", &mut root, None).unwrap();
            assert_eq!(*root.cast::<i32>(), 1);
            yaml_bind::free(&config, &schema, &mut root, None);
        }
    }

    #[test]
    fn loads_enum_fallback_integer_unless_strict() {
        static ENTRIES: [EnumEntry<'_>; 1] = [EnumEntry::new("first", 0)];
        let schema = Schema::enumeration(ptr_flags(), 4, &ENTRIES);
        let config = Config::default();
        let mut root: *mut c_void = ptr::null_mut();
        unsafe {
            yaml_bind::load_str(&config, &schema, "7\n", &mut root, None).unwrap();
            assert_eq!(*root.cast::<i32>(), 7);
            yaml_bind::free(&config, &schema, &mut root, None);
        }

        let strict = Schema::enumeration(ptr_flags().union(SchemaFlags::STRICT), 4, &ENTRIES);
        let err = unsafe {
            yaml_bind::load_str(&config, &strict, "7\n", &mut root, None).unwrap_err()
        };
        assert!(matches!(err.kind(), yaml_bind::ErrorImpl::InvalidValue(_)));
        assert!(root.is_null());
    }

    #[test]
    fn loads_top_level_sequence_of_ints() {
        let entry = Schema::int(SchemaFlags::NONE, 4);
        let schema = Schema::sequence(ptr_flags(), &entry, 4, 0, u64::MAX);
        let config = Config::default();
        let mut root: *mut c_void = ptr::null_mut();
        let mut count = 0u64;
        unsafe {
            yaml_bind::load_str(&config, &schema, "- 7\n- 6\n- 5\n", &mut root, Some(&mut count))
                .unwrap();
            assert_eq!(count, 3);
            let entries = std::slice::from_raw_parts(root.cast::<i32>(), 3);
            assert_eq!(entries, &[7, 6, 5]);
            yaml_bind::free(&config, &schema, &mut root, Some(count));
        }
        assert!(root.is_null());
    }

    #[test]
    fn loads_sequence_field_with_count_slot() {
        #[repr(C)]
        struct Target {
            values: *mut u32,
            values_count: u32,
        }

        let entry = Schema::uint(SchemaFlags::NONE, 4);
        let fields = [Field::with_count(
            "values",
            offset_of!(Target, values),
            offset_of!(Target, values_count),
            4,
            Schema::sequence(SchemaFlags::POINTER, &entry, 4, 0, u64::MAX),
        )];
        let schema = Schema::mapping(ptr_flags(), size_of::<Target>(), &fields);
        let config = Config::default();
        let mut root: *mut c_void = ptr::null_mut();
        unsafe {
            yaml_bind::load_str(&config, &schema, "values:\n- 10\n- 20\n", &mut root, None).unwrap();
            let target = &*root.cast::<Target>();
            assert_eq!(target.values_count, 2);
            assert_eq!(std::slice::from_raw_parts(target.values, 2), &[10, 20]);
            yaml_bind::free(&config, &schema, &mut root, None);
        }
    }

    #[test]
    fn loads_inline_fixed_sequence() {
        #[repr(C)]
        struct Target {
            values: [u32; 3],
        }

        let entry = Schema::uint(SchemaFlags::NONE, 4);
        let fields = [Field::new(
            "values",
            offset_of!(Target, values),
            Schema::sequence_fixed(SchemaFlags::NONE, &entry, 4, 3),
        )];
        let schema = Schema::mapping(ptr_flags(), size_of::<Target>(), &fields);
        let config = Config::default();
        let mut root: *mut c_void = ptr::null_mut();
        unsafe {
            yaml_bind::load_str(&config, &schema, "values:\n- 1\n- 2\n- 3\n", &mut root, None).unwrap();
            assert_eq!((*root.cast::<Target>()).values, [1, 2, 3]);
            yaml_bind::free(&config, &schema, &mut root, None);
        }
    }

    #[test]
    fn missing_required_field_fails_and_leaves_target_untouched() {
        #[repr(C)]
        struct Target {
            a: i32,
            b: i32,
        }

        let fields = [
            Field::new("a", offset_of!(Target, a), Schema::int(SchemaFlags::NONE, 4)),
            Field::new(
                "b",
                offset_of!(Target, b),
                Schema {
                    flags: SchemaFlags::OPTIONAL,
                    data_size: 4,
                    kind: SchemaKind::Int {
                        min: None,
                        max: None,
                        validate: None,
                        missing: Some(0),
                    },
                },
            ),
        ];
        let schema = Schema::mapping(ptr_flags(), size_of::<Target>(), &fields);
        let config = Config::default();
        let mut root: *mut c_void = ptr::null_mut();
        let err = unsafe {
            yaml_bind::load_str(&config, &schema, "b: 5\n", &mut root, None).unwrap_err()
        };
        assert!(matches!(
            err.kind(),
            yaml_bind::ErrorImpl::MappingFieldMissing { field, .. } if field == "a"
        ));
        assert!(root.is_null());
    }

    #[test]
    fn optional_fields_materialize_defaults() {
        #[repr(C)]
        struct Target {
            a: i32,
            b: u32,
            c: u8,
            name: [u8; 12],
        }

        let fields = [
            Field::new(
                "a",
                offset_of!(Target, a),
                Schema {
                    flags: SchemaFlags::OPTIONAL,
                    data_size: 4,
                    kind: SchemaKind::Int {
                        min: None,
                        max: None,
                        validate: None,
                        missing: Some(-3),
                    },
                },
            ),
            Field::new(
                "b",
                offset_of!(Target, b),
                Schema {
                    flags: SchemaFlags::OPTIONAL,
                    data_size: 4,
                    kind: SchemaKind::Uint {
                        min: None,
                        max: None,
                        validate: None,
                        missing: Some(77),
                    },
                },
            ),
            Field::new(
                "c",
                offset_of!(Target, c),
                Schema::uint(SchemaFlags::OPTIONAL, 1),
            ),
            Field::new(
                "name",
                offset_of!(Target, name),
                Schema {
                    flags: SchemaFlags::OPTIONAL,
                    data_size: 12,
                    kind: SchemaKind::String {
                        min_len: 0,
                        max_len: 11,
                        validate: None,
                        missing: Some("unnamed"),
                    },
                },
            ),
        ];
        let schema = Schema::mapping(ptr_flags(), size_of::<Target>(), &fields);
        let config = Config::default();
        let mut root: *mut c_void = ptr::null_mut();
        unsafe {
            yaml_bind::load_str(&config, &schema, "{}\n", &mut root, None).unwrap();
            let target = &*root.cast::<Target>();
            assert_eq!(target.a, -3);
            assert_eq!(target.b, 77);
            // No declared default: observably zero.
            assert_eq!(target.c, 0);
            let name = CStr::from_ptr(target.name.as_ptr().cast::<c_char>());
            assert_eq!(name.to_str().unwrap(), "unnamed");
            yaml_bind::free(&config, &schema, &mut root, None);
        }
    }

    #[test]
    fn absent_optional_pointer_is_null() {
        #[repr(C)]
        struct Target {
            p: *mut i32,
        }

        let fields = [Field::new(
            "p",
            offset_of!(Target, p),
            Schema::int(SchemaFlags::POINTER.union(SchemaFlags::OPTIONAL), 4),
        )];
        let schema = Schema::mapping(ptr_flags(), size_of::<Target>(), &fields);
        let config = Config::default();
        let mut root: *mut c_void = ptr::null_mut();
        unsafe {
            yaml_bind::load_str(&config, &schema, "{}\n", &mut root, None).unwrap();
            assert!((*root.cast::<Target>()).p.is_null());
            yaml_bind::free(&config, &schema, &mut root, None);
        }
    }

    #[test]
    fn null_scalar_spellings_load_pointer_as_null() {
        #[repr(C)]
        struct Target {
            p: *mut i32,
            q: *mut i32,
        }

        let fields = [
            Field::new(
                "p",
                offset_of!(Target, p),
                Schema::int(
                    SchemaFlags::POINTER.union(SchemaFlags::NULL_ON_NULL_STR),
                    4,
                ),
            ),
            Field::new(
                "q",
                offset_of!(Target, q),
                Schema::int(SchemaFlags::POINTER.union(SchemaFlags::NULL_ON_EMPTY), 4),
            ),
        ];
        let schema = Schema::mapping(ptr_flags(), size_of::<Target>(), &fields);
        let config = Config::default();
        let mut root: *mut c_void = ptr::null_mut();
        unsafe {
            yaml_bind::load_str(&config, &schema, "p: ~\nq:\n", &mut root, None).unwrap();
            let target = &*root.cast::<Target>();
            assert!(target.p.is_null());
            assert!(target.q.is_null());
            yaml_bind::free(&config, &schema, &mut root, None);
        }
    }

    #[test]
    fn loads_pointer_string_field() {
        #[repr(C)]
        struct Target {
            name: *const c_char,
        }

        let fields = [Field::new(
            "name",
            offset_of!(Target, name),
            Schema::string(SchemaFlags::POINTER, 0, 0, 64),
        )];
        let schema = Schema::mapping(ptr_flags(), size_of::<Target>(), &fields);
        let config = Config::default();
        let mut root: *mut c_void = ptr::null_mut();
        unsafe {
            yaml_bind::load_str(&config, &schema, "name: hello world\n", &mut root, None).unwrap();
            let target = &*root.cast::<Target>();
            assert_eq!(CStr::from_ptr(target.name).to_str().unwrap(), "hello world");
            yaml_bind::free(&config, &schema, &mut root, None);
        }
    }

    #[test]
    fn loads_flag_set_from_name_sequence() {
        static ENTRIES: [EnumEntry<'_>; 3] = [
            EnumEntry::new("first", 1),
            EnumEntry::new("second", 2),
            EnumEntry::new("third", 4),
        ];
        let schema = Schema::flag_set(ptr_flags(), 4, &ENTRIES);
        let config = Config::default();
        let mut root: *mut c_void = ptr::null_mut();
        unsafe {
            yaml_bind::load_str(&config, &schema, "- first\n- third\n", &mut root, None).unwrap();
            assert_eq!(*root.cast::<u32>(), 5);
            yaml_bind::free(&config, &schema, &mut root, None);
        }
    }

    #[test]
    fn loads_flag_set_numeric_leftover_unless_strict() {
        static ENTRIES: [EnumEntry<'_>; 1] = [EnumEntry::new("first", 1)];
        let schema = Schema::flag_set(ptr_flags(), 4, &ENTRIES);
        let config = Config::default();
        let mut root: *mut c_void = ptr::null_mut();
        unsafe {
            yaml_bind::load_str(&config, &schema, "- first\n- 8\n", &mut root, None).unwrap();
            assert_eq!(*root.cast::<u32>(), 9);
            yaml_bind::free(&config, &schema, &mut root, None);
        }

        let strict = Schema::flag_set(ptr_flags().union(SchemaFlags::STRICT), 4, &ENTRIES);
        let err = unsafe {
            yaml_bind::load_str(&config, &strict, "- 8\n", &mut root, None).unwrap_err()
        };
        assert!(matches!(err.kind(), yaml_bind::ErrorImpl::InvalidValue(_)));
    }

    #[test]
    fn loads_bitfield_from_mapping() {
        use yaml_bind::BitDef;
        static BITS: [BitDef<'_>; 3] = [
            BitDef::new("a", 0, 4),
            BitDef::new("b", 4, 4),
            BitDef::new("c", 8, 8),
        ];
        let schema = Schema::bitfield(ptr_flags(), 4, &BITS);
        let config = Config::default();
        let mut root: *mut c_void = ptr::null_mut();
        unsafe {
            yaml_bind::load_str(&config, &schema, "a: 3\nb: 2\nc: 255\n", &mut root, None).unwrap();
            assert_eq!(*root.cast::<u32>(), 0xff23);
            yaml_bind::free(&config, &schema, &mut root, None);
        }
    }

    #[test]
    fn loads_binary_with_count_slot() {
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
            Schema::binary(SchemaFlags::POINTER, 0, 0, 100),
        )];
        let schema = Schema::mapping(ptr_flags(), size_of::<Target>(), &fields);
        let config = Config::default();
        let mut root: *mut c_void = ptr::null_mut();
        unsafe {
            yaml_bind::load_str(&config, &schema, "blob: aGVsbG8=\n", &mut root, None).unwrap();
            let target = &*root.cast::<Target>();
            assert_eq!(target.blob_len, 5);
            assert_eq!(std::slice::from_raw_parts(target.blob, 5), b"hello");
            yaml_bind::free(&config, &schema, &mut root, None);
        }
    }

    #[test]
    fn unknown_key_fails_unless_configured_ignored() {
        #[repr(C)]
        struct Target {
            a: i32,
        }

        let fields = [Field::new(
            "a",
            offset_of!(Target, a),
            Schema::int(SchemaFlags::NONE, 4),
        )];
        let schema = Schema::mapping(ptr_flags(), size_of::<Target>(), &fields);
        let input = "a: 1\nmystery:\n  nested:\n  - 1\n  - 2\n";

        let config = Config::default();
        let mut root: *mut c_void = ptr::null_mut();
        let err = unsafe {
            yaml_bind::load_str(&config, &schema, input, &mut root, None).unwrap_err()
        };
        assert!(matches!(
            err.kind(),
            yaml_bind::ErrorImpl::InvalidKey { key, .. } if key == "mystery"
        ));
        assert!(root.is_null());

        let lenient = Config {
            flags: ConfigFlags::IGNORE_UNKNOWN_KEYS,
            ..Config::default()
        };
        unsafe {
            yaml_bind::load_str(&lenient, &schema, input, &mut root, None).unwrap();
            assert_eq!((*root.cast::<Target>()).a, 1);
            yaml_bind::free(&lenient, &schema, &mut root, None);
        }
    }

    #[test]
    fn duplicate_key_fails() {
        #[repr(C)]
        struct Target {
            a: i32,
        }

        let fields = [Field::new(
            "a",
            offset_of!(Target, a),
            Schema::int(SchemaFlags::NONE, 4),
        )];
        let schema = Schema::mapping(ptr_flags(), size_of::<Target>(), &fields);
        let config = Config::default();
        let mut root: *mut c_void = ptr::null_mut();
        let err = unsafe {
            yaml_bind::load_str(&config, &schema, "a: 1\na: 2\n", &mut root, None).unwrap_err()
        };
        assert!(matches!(err.kind(), yaml_bind::ErrorImpl::UnexpectedEvent(_)));
        assert!(root.is_null());
    }

    #[test]
    fn ignore_kinded_field_consumes_value() {
        #[repr(C)]
        struct Target {
            a: i32,
        }

        let fields = [
            Field::new("a", offset_of!(Target, a), Schema::int(SchemaFlags::NONE, 4)),
            Field::new("junk", 0, Schema::ignore()),
        ];
        let schema = Schema::mapping(ptr_flags(), size_of::<Target>(), &fields);
        let config = Config::default();
        let mut root: *mut c_void = ptr::null_mut();
        unsafe {
            yaml_bind::load_str(
                &config,
                &schema,
                "junk:\n  x: 1\n  y: [2, 3]\na: 9\n",
                &mut root,
                None,
            )
            .unwrap();
            assert_eq!((*root.cast::<Target>()).a, 9);
            yaml_bind::free(&config, &schema, &mut root, None);
        }
    }

    #[test]
    fn second_document_is_ignored_with_first_returned() {
        #[repr(C)]
        struct Target {
            test_int: i32,
        }

        let fields = [Field::new(
            "test_int",
            offset_of!(Target, test_int),
            Schema::int(SchemaFlags::NONE, 4),
        )];
        let schema = Schema::mapping(ptr_flags(), size_of::<Target>(), &fields);
        let config = Config::default();
        let mut root: *mut c_void = ptr::null_mut();
        unsafe {
            yaml_bind::load_str(
                &config,
                &schema,
                "---\ntest_int: 90\n...\n---\ntest_int: 99\n",
                &mut root,
                None,
            )
            .unwrap();
            assert_eq!((*root.cast::<Target>()).test_int, 90);
            yaml_bind::free(&config, &schema, &mut root, None);
        }
    }

    #[test]
    fn anchored_mapping_replays_into_independent_allocations() {
        #[repr(C)]
        struct Inner {
            x: i32,
            y: i32,
        }
        #[repr(C)]
        struct Outer {
            defs: *mut Inner,
            uses: *mut Inner,
        }

        let inner_fields = [
            Field::new("x", offset_of!(Inner, x), Schema::int(SchemaFlags::NONE, 4)),
            Field::new("y", offset_of!(Inner, y), Schema::int(SchemaFlags::NONE, 4)),
        ];
        let fields = [
            Field::new(
                "defs",
                offset_of!(Outer, defs),
                Schema::mapping(SchemaFlags::POINTER, size_of::<Inner>(), &inner_fields),
            ),
            Field::new(
                "use",
                offset_of!(Outer, uses),
                Schema::mapping(SchemaFlags::POINTER, size_of::<Inner>(), &inner_fields),
            ),
        ];
        let schema = Schema::mapping(ptr_flags(), size_of::<Outer>(), &fields);
        let config = Config::default();
        let mut root: *mut c_void = ptr::null_mut();
        unsafe {
            yaml_bind::load_str(
                &config,
                &schema,
                "defs: &d {x: 1, y: 2}\nuse: *d\n",
                &mut root,
                None,
            )
            .unwrap();
            let outer = &*root.cast::<Outer>();
            assert!(!outer.defs.is_null());
            assert!(!outer.uses.is_null());
            // Structurally equal, never shared.
            assert_ne!(outer.defs, outer.uses);
            assert_eq!((*outer.defs).x, 1);
            assert_eq!((*outer.defs).y, 2);
            assert_eq!((*outer.uses).x, 1);
            assert_eq!((*outer.uses).y, 2);
            yaml_bind::free(&config, &schema, &mut root, None);
        }
    }

    #[test]
    fn scalar_anchor_replays_for_multiple_aliases() {
        #[repr(C)]
        struct Target {
            a: i32,
            b: i32,
            c: i32,
        }

        let fields = [
            Field::new("a", offset_of!(Target, a), Schema::int(SchemaFlags::NONE, 4)),
            Field::new("b", offset_of!(Target, b), Schema::int(SchemaFlags::NONE, 4)),
            Field::new("c", offset_of!(Target, c), Schema::int(SchemaFlags::NONE, 4)),
        ];
        let schema = Schema::mapping(ptr_flags(), size_of::<Target>(), &fields);
        let config = Config::default();
        let mut root: *mut c_void = ptr::null_mut();
        unsafe {
            yaml_bind::load_str(
                &config,
                &schema,
                "a: &v 41\nb: *v\nc: *v\n",
                &mut root,
                None,
            )
            .unwrap();
            let target = &*root.cast::<Target>();
            assert_eq!((target.a, target.b, target.c), (41, 41, 41));
            yaml_bind::free(&config, &schema, &mut root, None);
        }
    }

    #[test]
    fn alias_inside_anchored_collection_expands() {
        #[repr(C)]
        struct Target {
            first: [i32; 2],
            second: [i32; 2],
        }

        let entry = Schema::int(SchemaFlags::NONE, 4);
        let fields = [
            Field::new(
                "first",
                offset_of!(Target, first),
                Schema::sequence_fixed(SchemaFlags::NONE, &entry, 4, 2),
            ),
            Field::new(
                "second",
                offset_of!(Target, second),
                Schema::sequence_fixed(SchemaFlags::NONE, &entry, 4, 2),
            ),
        ];
        let schema = Schema::mapping(ptr_flags(), size_of::<Target>(), &fields);
        let config = Config::default();
        let mut root: *mut c_void = ptr::null_mut();
        unsafe {
            yaml_bind::load_str(
                &config,
                &schema,
                "first: &outer [&x 5, *x]\nsecond: *outer\n",
                &mut root,
                None,
            )
            .unwrap();
            let target = &*root.cast::<Target>();
            assert_eq!(target.first, [5, 5]);
            assert_eq!(target.second, [5, 5]);
            yaml_bind::free(&config, &schema, &mut root, None);
        }
    }

    #[test]
    fn case_insensitive_schema_flag_overrides_config() {
        #[repr(C)]
        struct Target {
            value: i32,
        }

        let fields = [Field::new(
            "Value",
            offset_of!(Target, value),
            Schema::int(SchemaFlags::NONE, 4),
        )];
        let schema = Schema {
            flags: ptr_flags().union(SchemaFlags::CASE_INSENSITIVE),
            data_size: size_of::<Target>(),
            kind: SchemaKind::Mapping {
                fields: &fields,
                validate: None,
                missing: None,
            },
        };
        let config = Config::default();
        let mut root: *mut c_void = ptr::null_mut();
        unsafe {
            yaml_bind::load_str(&config, &schema, "VALUE: 6\n", &mut root, None).unwrap();
            assert_eq!((*root.cast::<Target>()).value, 6);
            yaml_bind::free(&config, &schema, &mut root, None);
        }
    }

    #[test]
    fn loads_union_variant_selected_by_discriminant() {
        #[repr(C)]
        struct Target {
            kind: i32,
            number: i64,
            flag: u8,
        }

        static KINDS: [EnumEntry<'_>; 2] =
            [EnumEntry::new("number", 0), EnumEntry::new("flag", 1)];
        let union_fields = [
            Field::new(
                "number",
                offset_of!(Target, number),
                Schema::int(SchemaFlags::NONE, 8),
            ),
            Field::new(
                "flag",
                offset_of!(Target, flag),
                Schema::boolean(SchemaFlags::NONE, 1),
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
        let schema = Schema::mapping(ptr_flags(), size_of::<Target>(), &fields);
        let config = Config::default();
        let mut root: *mut c_void = ptr::null_mut();
        unsafe {
            yaml_bind::load_str(
                &config,
                &schema,
                "kind: number\nvalue:\n  number: 1234\n",
                &mut root,
                None,
            )
            .unwrap();
            let target = &*root.cast::<Target>();
            assert_eq!(target.kind, 0);
            assert_eq!(target.number, 1234);
            yaml_bind::free(&config, &schema, &mut root, None);
        }
    }
}
