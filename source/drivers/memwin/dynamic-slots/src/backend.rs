// Copyright 2024 Open Nexus OS Contributors
// SPDX-License-Identifier: Apache-2.0

//! Memory-management backends for the window.
//!
//! - [`TlbBackend`]: the TLB-based driver can map pages and alias them; calls
//!   are checked for page alignment and forwarded.
//! - [`FlatBackend`]: no TLB driver. The window is already addressable so
//!   mapping succeeds trivially, but aliasing is impossible and every mirror
//!   reports [`HalError::Unsupported`].

use log::error;
use memwin_hal::{is_page_aligned, HalError, MapFlags, RegionMapper, Remapper};

use crate::LOG_TARGET;

pub struct TlbBackend<D> {
    driver: D,
}

impl<D> TlbBackend<D> {
    pub const fn new(driver: D) -> Self {
        Self { driver }
    }

    pub fn driver(&self) -> &D {
        &self.driver
    }
}

impl<D: RegionMapper> RegionMapper for TlbBackend<D> {
    fn map_region(
        &self,
        virt: usize,
        phys: usize,
        size: usize,
        flags: MapFlags,
    ) -> Result<(), HalError> {
        if !is_page_aligned(virt) || !is_page_aligned(phys) || !is_page_aligned(size) {
            return Err(HalError::Unaligned);
        }
        self.driver.map_region(virt, phys, size, flags).inspect_err(|err| {
            error!(target: LOG_TARGET, "tlb: map {:#x}+{:#x} failed: {}", virt, size, err);
        })
    }
}

impl<D: Remapper> Remapper for TlbBackend<D> {
    fn mirror_region(&self, src: usize, size: usize, dst: usize) -> Result<(), HalError> {
        if !is_page_aligned(src) || !is_page_aligned(dst) || !is_page_aligned(size) {
            return Err(HalError::Unaligned);
        }
        self.driver.mirror_region(src, size, dst).inspect_err(|err| {
            error!(target: LOG_TARGET, "tlb: mirror {:#x} -> {:#x} failed: {}", src, dst, err);
        })
    }
}

#[derive(Clone, Copy, Debug, Default)]
pub struct FlatBackend;

impl RegionMapper for FlatBackend {
    fn map_region(&self, _: usize, _: usize, _: usize, _: MapFlags) -> Result<(), HalError> {
        Ok(())
    }
}

impl Remapper for FlatBackend {
    fn mirror_region(&self, _: usize, _: usize, _: usize) -> Result<(), HalError> {
        Err(HalError::Unsupported)
    }
}
