// Copyright 2024 Open Nexus OS Contributors
// SPDX-License-Identifier: Apache-2.0

//! CONTEXT: Collaborator interfaces consumed by the memory-window drivers
//! OWNERS: @runtime
//! STATUS: Functional
//! API_STABILITY: Stable
//! TEST_COVERAGE: 6 unit tests + tests/traits.rs
//!
//! PUBLIC API:
//!   - Bus: 32-bit word access into one window, offsets relative to its base
//!   - CacheMaint: flush/invalidate primitive of the platform
//!   - RegionMapper / Remapper: memory-management driver (map + mirror)
//!   - Device: readiness + configured base of a window device
//!   - MapFlags, HalError, cache-line range helpers
//!   - MmioBus (feature `mmio`): volatile accessor for a real window
//!
//! None of these are implemented here beyond thin adapters; the platform
//! (or a host simulator) provides them.

#![cfg_attr(not(test), no_std)]
#![cfg_attr(not(feature = "mmio"), forbid(unsafe_code))]

use bitflags::bitflags;

/// Page size used by the memory-management driver.
pub const PAGE_SIZE: usize = 4096;

/// Data cache line size assumed when widening barrier ranges.
pub const CACHE_LINE_SIZE: usize = 64;

/// Word access to a window. Offsets are bytes from the window base and must
/// be 4-byte aligned.
pub trait Bus {
    fn read(&self, offset: usize) -> u32;
    fn write(&self, offset: usize, value: u32);

    /// Writes `value` to every word in `[offset, offset + len)`.
    fn fill(&self, offset: usize, len: usize, value: u32) {
        let mut at = offset;
        while at < offset + len {
            self.write(at, value);
            at += 4;
        }
    }
}

/// Cache maintenance over an absolute address range.
///
/// Platforms that only offer a combined operation implement
/// [`CacheMaint::flush_invalidate`]; the split operations fall back to it.
pub trait CacheMaint {
    fn flush_invalidate(&self, addr: usize, len: usize);

    /// Drops local copies so the next read observes shared memory.
    fn invalidate(&self, addr: usize, len: usize) {
        self.flush_invalidate(addr, len);
    }

    /// Writes dirty lines back so other observers see them.
    fn flush(&self, addr: usize, len: usize) {
        self.flush_invalidate(addr, len);
    }
}

impl<T: Bus + ?Sized> Bus for &T {
    fn read(&self, offset: usize) -> u32 {
        (**self).read(offset)
    }

    fn write(&self, offset: usize, value: u32) {
        (**self).write(offset, value)
    }

    fn fill(&self, offset: usize, len: usize, value: u32) {
        (**self).fill(offset, len, value)
    }
}

impl<T: CacheMaint + ?Sized> CacheMaint for &T {
    fn flush_invalidate(&self, addr: usize, len: usize) {
        (**self).flush_invalidate(addr, len)
    }

    fn invalidate(&self, addr: usize, len: usize) {
        (**self).invalidate(addr, len)
    }

    fn flush(&self, addr: usize, len: usize) {
        (**self).flush(addr, len)
    }
}

bitflags! {
    #[derive(Clone, Copy, Debug, PartialEq, Eq)]
    /// Attributes requested from the memory-management driver.
    pub struct MapFlags: u32 {
        const CACHE_WB = 1 << 0;
        const CACHE_WT = 1 << 1;
        const CACHE_UNCACHED = 1 << 2;
        const PERM_RW = 1 << 3;
        const PERM_EXEC = 1 << 4;
        const PERM_USER = 1 << 5;
    }
}

impl MapFlags {
    const CACHE_MASK: MapFlags =
        MapFlags::CACHE_WB.union(MapFlags::CACHE_WT).union(MapFlags::CACHE_UNCACHED);

    /// Exactly one cache policy must be selected.
    pub fn has_single_cache_policy(self) -> bool {
        self.intersection(Self::CACHE_MASK).bits().count_ones() == 1
    }
}

/// Errors reported by platform collaborators.
#[derive(Clone, Copy, Debug, PartialEq, Eq, thiserror::Error)]
#[must_use = "hal errors must be handled"]
pub enum HalError {
    #[error("memory-management fault")]
    Fault,
    #[error("address or size not page aligned")]
    Unaligned,
    #[error("range outside the managed region")]
    OutOfRange,
    #[error("operation not supported by this backend")]
    Unsupported,
    #[error("resource busy")]
    Busy,
}

/// Page-mapping primitive (`sys_mm_drv_map_region`).
pub trait RegionMapper {
    /// Backs `[virt, virt + size)` with fresh physical pages (or `phys` when
    /// non-zero) using `flags`.
    fn map_region(
        &self,
        virt: usize,
        phys: usize,
        size: usize,
        flags: MapFlags,
    ) -> Result<(), HalError>;
}

/// Address aliasing primitive (`sys_mm_drv_mirror_region`).
///
/// After success, `[dst, dst + size)` is backed by the same physical pages as
/// `[src, src + size)`. Nothing is copied.
pub trait Remapper {
    fn mirror_region(&self, src: usize, size: usize, dst: usize) -> Result<(), HalError>;
}

impl<T: RegionMapper + ?Sized> RegionMapper for &T {
    fn map_region(
        &self,
        virt: usize,
        phys: usize,
        size: usize,
        flags: MapFlags,
    ) -> Result<(), HalError> {
        (**self).map_region(virt, phys, size, flags)
    }
}

impl<T: Remapper + ?Sized> Remapper for &T {
    fn mirror_region(&self, src: usize, size: usize, dst: usize) -> Result<(), HalError> {
        (**self).mirror_region(src, size, dst)
    }
}

/// A memory-window device as described by the board configuration.
pub trait Device {
    fn is_ready(&self) -> bool;
    /// Cached-alias base address of the window.
    fn mem_base(&self) -> usize;
}

/// Rounds `value` down to a multiple of `align` (power of two).
pub fn align_down(value: usize, align: usize) -> usize {
    debug_assert!(align.is_power_of_two());
    value & !(align - 1)
}

/// Rounds `value` up to a multiple of `align` (power of two), saturating.
pub fn align_up(value: usize, align: usize) -> usize {
    debug_assert!(align.is_power_of_two());
    value.saturating_add(align - 1) & !(align - 1)
}

/// Widens `[addr, addr + len)` to whole cache lines.
pub fn cache_line_span(addr: usize, len: usize) -> (usize, usize) {
    if len == 0 {
        return (addr, 0);
    }
    let start = align_down(addr, CACHE_LINE_SIZE);
    let end = align_up(addr.saturating_add(len), CACHE_LINE_SIZE);
    (start, end - start)
}

/// Returns true when `addr` sits on a page boundary.
pub fn is_page_aligned(addr: usize) -> bool {
    addr % PAGE_SIZE == 0
}

#[cfg(feature = "mmio")]
mod mmio;

#[cfg(feature = "mmio")]
pub use mmio::MmioBus;
