// Copyright notice and licensing information.
// These lines indicate the copyright of the software and its licensing terms.
// SPDX-License-Identifier: Apache-2.0 OR MIT indicates dual licensing under Apache 2.0 or MIT licenses.
// Copyright © 2026 yaml_bind, Schema-Driven YAML Binding for Rust. All rights reserved.

//! Heap plumbing over the configured allocator callback.
//!
//! Every region the traversal drivers own passes through these three
//! functions, so a load that fails part-way can hand the whole partial
//! tree to the freer without tracking individual regions.

use crate::config::Config;
use crate::error::{new, ErrorImpl, Result};
use std::ffi::c_void;
use std::ptr;

/// Allocates `size` zero-filled bytes. A zero `size` yields a null
/// pointer without error.
pub(crate) unsafe fn alloc_zeroed(config: &Config, size: usize) -> Result<*mut u8> {
    if size == 0 {
        return Ok(ptr::null_mut());
    }
    let region = unsafe { (config.allocator)(config.alloc_ctx, ptr::null_mut(), size) };
    if region.is_null() {
        return Err(new(ErrorImpl::OutOfMemory));
    }
    let region = region.cast::<u8>();
    unsafe { ptr::write_bytes(region, 0, size) };
    Ok(region)
}

/// Grows a region from `old_size` to `new_size` bytes, zero-filling the
/// tail. The region may move; the old pointer is invalid afterwards.
pub(crate) unsafe fn grow(
    config: &Config,
    region: *mut u8,
    old_size: usize,
    new_size: usize,
) -> Result<*mut u8> {
    debug_assert!(new_size >= old_size);
    let grown = unsafe { (config.allocator)(config.alloc_ctx, region.cast::<c_void>(), new_size) };
    if grown.is_null() {
        // The original region is untouched on failure and still owned
        // by the caller's tree.
        return Err(new(ErrorImpl::OutOfMemory));
    }
    let grown = grown.cast::<u8>();
    unsafe { ptr::write_bytes(grown.add(old_size), 0, new_size - old_size) };
    Ok(grown)
}

/// Releases a region; null is a no-op.
pub(crate) unsafe fn release(config: &Config, region: *mut u8) {
    if region.is_null() {
        return;
    }
    unsafe { (config.allocator)(config.alloc_ctx, region.cast::<c_void>(), 0) };
}
