// Copyright 2024 Open Nexus OS Contributors
// SPDX-License-Identifier: Apache-2.0

//! CONTEXT: Scoped cache barrier around shared-memory access
//! INVARIANTS: invalidate on begin; flush on end iff something was written
//!
//! The writer and the external reader do not share a coherent cache. A
//! [`SharedAccess`] invalidates its range when it begins so reads observe
//! shared memory, and flushes it when it ends (explicitly or on drop) if the
//! scope was marked dirty, so no write can leave the function unflushed.

use memwin_hal::{cache_line_span, CacheMaint};

pub struct SharedAccess<'a, C: CacheMaint + ?Sized> {
    cache: &'a C,
    addr: usize,
    len: usize,
    dirty: bool,
}

impl<'a, C: CacheMaint + ?Sized> SharedAccess<'a, C> {
    /// Invalidates `[addr, addr + len)`, widened to whole cache lines.
    pub fn begin(cache: &'a C, addr: usize, len: usize) -> Self {
        let (addr, len) = cache_line_span(addr, len);
        cache.invalidate(addr, len);
        Self { cache, addr, len, dirty: false }
    }

    pub fn mark_dirty(&mut self) {
        self.dirty = true;
    }

    pub fn is_dirty(&self) -> bool {
        self.dirty
    }

    /// Ends the scope now; flushes if dirty.
    pub fn end(self) {}
}

impl<C: CacheMaint + ?Sized> Drop for SharedAccess<'_, C> {
    fn drop(&mut self) {
        if self.dirty {
            self.cache.flush(self.addr, self.len);
        }
    }
}
