// Copyright notice and licensing information.
// These lines indicate the copyright of the software and its licensing terms.
// SPDX-License-Identifier: Apache-2.0 OR MIT indicates dual licensing under Apache 2.0 or MIT licenses.
// Copyright © 2026 yaml_bind, Schema-Driven YAML Binding for Rust. All rights reserved.

use std::fmt::{self, Debug};
use std::ptr::NonNull;

/// A heap-pinned sys-state holder.
///
/// The raw parser and emitter states hold internal pointers, so they
/// must stay at a fixed address for their whole lifetime. The holder is
/// built from a complete value (the sys struct starts zeroed and is
/// initialised in place through [`as_ptr`](Pinned::as_ptr)), which
/// keeps the wrapper movable while the state is not.
pub(crate) struct Pinned<T> {
    ptr: NonNull<T>,
}

impl<T> Pinned<T> {
    pub(crate) fn new(value: T) -> Pinned<T> {
        let boxed = Box::new(value);
        Pinned {
            ptr: unsafe { NonNull::new_unchecked(Box::into_raw(boxed)) },
        }
    }

    /// The stable address of the pinned value.
    pub(crate) fn as_ptr(&self) -> *mut T {
        self.ptr.as_ptr()
    }
}

impl<T> Drop for Pinned<T> {
    fn drop(&mut self) {
        let _ = unsafe { Box::from_raw(self.ptr.as_ptr()) };
    }
}

impl<T> Debug for Pinned<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Pinned").field("ptr", &self.ptr).finish()
    }
}
