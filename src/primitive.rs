// Copyright notice and licensing information.
// These lines indicate the copyright of the software and its licensing terms.
// SPDX-License-Identifier: Apache-2.0 OR MIT indicates dual licensing under Apache 2.0 or MIT licenses.
// Copyright © 2026 yaml_bind, Schema-Driven YAML Binding for Rust. All rights reserved.

//! Byte-packing primitives.
//!
//! These are the only routines that move integer values between the
//! engine and raw native storage. Values are packed little-endian first
//! regardless of host byte order, so a given schema produces the same
//! byte layout everywhere.

use crate::error::{new, ErrorImpl, Result};

/// Writes the low `entry_size` bytes of `value` to `dst`,
/// least-significant byte first.
///
/// # Errors
///
/// Fails with `InvalidDataSize` when `entry_size` is zero or above 8.
///
/// # Safety
///
/// `dst` must be valid for writes of `entry_size` bytes.
pub unsafe fn write_int(value: u64, entry_size: usize, dst: *mut u8) -> Result<()> {
    if entry_size == 0 || entry_size > 8 {
        return Err(new(ErrorImpl::InvalidDataSize));
    }
    let mut value = value;
    for i in 0..entry_size {
        unsafe { dst.add(i).write((value & 0xff) as u8) };
        value >>= 8;
    }
    Ok(())
}

/// Reads `entry_size` bytes from `src`, least-significant byte first,
/// into an unsigned 64-bit value.
///
/// # Errors
///
/// Fails with `InvalidDataSize` when `entry_size` is zero or above 8.
///
/// # Safety
///
/// `src` must be valid for reads of `entry_size` bytes.
pub unsafe fn read_int(entry_size: usize, src: *const u8) -> Result<u64> {
    if entry_size == 0 || entry_size > 8 {
        return Err(new(ErrorImpl::InvalidDataSize));
    }
    let mut value = 0u64;
    for i in (0..entry_size).rev() {
        value = (value << 8) | u64::from(unsafe { src.add(i).read() });
    }
    Ok(value)
}

/// Sign-extends a raw `size`-byte value to a two's-complement signed
/// 64-bit value by replicating the top bit of the stored width.
pub fn sign_pad(raw: u64, size: usize) -> i64 {
    if size >= 8 {
        return raw as i64;
    }
    let bits = size as u32 * 8;
    let sign_bit = 1u64 << (bits - 1);
    if raw & sign_bit != 0 {
        (raw | (u64::MAX << bits)) as i64
    } else {
        (raw & !(u64::MAX << bits)) as i64
    }
}

/// The largest unsigned value representable in `size` bytes.
pub(crate) fn unsigned_max(size: usize) -> u64 {
    if size >= 8 {
        u64::MAX
    } else {
        (1u64 << (size * 8)) - 1
    }
}

/// Whether `value` is representable as a signed integer of `size` bytes.
pub(crate) fn fits_signed(value: i64, size: usize) -> bool {
    if size >= 8 {
        return true;
    }
    let bits = size as u32 * 8;
    let max = (1i64 << (bits - 1)) - 1;
    let min = -(1i64 << (bits - 1));
    value >= min && value <= max
}
