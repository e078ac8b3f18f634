// Copyright 2024 Open Nexus OS Contributors
// SPDX-License-Identifier: Apache-2.0

//! Volatile window accessor for firmware builds.

use crate::Bus;

/// Word accessor over an identity-mapped window.
pub struct MmioBus {
    base: usize,
}

impl MmioBus {
    /// # Safety
    ///
    /// `base` must stay mapped, readable and writable for every offset the
    /// caller passes to [`Bus::read`] / [`Bus::write`], and no Rust reference
    /// may alias that memory for the lifetime of the accessor.
    pub const unsafe fn new(base: usize) -> Self {
        Self { base }
    }

    pub fn base(&self) -> usize {
        self.base
    }
}

impl Bus for MmioBus {
    fn read(&self, offset: usize) -> u32 {
        debug_assert!(offset % 4 == 0);
        // SAFETY: the constructor contract covers every in-window offset.
        unsafe { core::ptr::read_volatile((self.base + offset) as *const u32) }
    }

    fn write(&self, offset: usize, value: u32) {
        debug_assert!(offset % 4 == 0);
        // SAFETY: the constructor contract covers every in-window offset.
        unsafe { core::ptr::write_volatile((self.base + offset) as *mut u32, value) }
    }
}
