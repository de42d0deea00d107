// Copyright notice and licensing information.
// These lines indicate the copyright of the software and its licensing terms.
// SPDX-License-Identifier: Apache-2.0 OR MIT indicates dual licensing under Apache 2.0 or MIT licenses.
// Copyright © 2026 yaml_bind, Schema-Driven YAML Binding for Rust. All rights reserved.

//! Small text utilities shared by the traversal drivers.

/// The scalar spellings that load as boolean false. Anything else is
/// true.
const FALSE_WORDS: [&str; 5] = ["false", "no", "off", "disable", "0"];

/// The scalar spellings accepted as an explicit null.
const NULL_WORDS: [&str; 4] = ["~", "null", "Null", "NULL"];

/// ASCII-caseless string equality.
pub(crate) fn caseless_eq(a: &str, b: &str) -> bool {
    a.eq_ignore_ascii_case(b)
}

pub(crate) fn is_false_word(s: &str) -> bool {
    FALSE_WORDS.iter().any(|word| caseless_eq(s, word))
}

pub(crate) fn is_null_word(s: &str) -> bool {
    NULL_WORDS.iter().any(|word| *word == s)
}

/// Scans an unsigned integer with C-style base selection: `0x`-prefixed
/// hexadecimal, `0`-prefixed octal, decimal otherwise.
pub(crate) fn scan_uint(s: &str) -> Option<u64> {
    let s = s.strip_prefix('+').unwrap_or(s);
    if s.is_empty() {
        return None;
    }
    let (digits, radix) = if let Some(hex) = s.strip_prefix("0x").or_else(|| s.strip_prefix("0X")) {
        (hex, 16)
    } else if s.len() > 1 && s.starts_with('0') {
        (&s[1..], 8)
    } else {
        (s, 10)
    };
    if digits.is_empty() {
        return None;
    }
    u64::from_str_radix(digits, radix).ok()
}

/// Scans a signed integer with the same base rules as [`scan_uint`].
pub(crate) fn scan_int(s: &str) -> Option<i64> {
    let (negative, body) = match s.strip_prefix('-') {
        Some(rest) => (true, rest),
        None => (false, s),
    };
    let magnitude = scan_uint(body)?;
    if negative {
        // -2^63 is representable even though 2^63 is not.
        if magnitude > (i64::MAX as u64) + 1 {
            None
        } else {
            Some((magnitude as i64).wrapping_neg())
        }
    } else if magnitude > i64::MAX as u64 {
        None
    } else {
        Some(magnitude as i64)
    }
}

/// Scans an IEEE-754 double, accepting the YAML 1.1 spellings for
/// infinities and not-a-number alongside the usual forms.
pub(crate) fn scan_float(s: &str) -> Option<f64> {
    match s {
        ".inf" | ".Inf" | ".INF" | "+.inf" | "+.Inf" | "+.INF" => return Some(f64::INFINITY),
        "-.inf" | "-.Inf" | "-.INF" => return Some(f64::NEG_INFINITY),
        ".nan" | ".NaN" | ".NAN" => return Some(f64::NAN),
        _ => {}
    }
    s.parse::<f64>().ok()
}
