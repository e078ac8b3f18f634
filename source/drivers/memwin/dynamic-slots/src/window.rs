// Copyright 2024 Open Nexus OS Contributors
// SPDX-License-Identifier: Apache-2.0

//! CONTEXT: Window region lifecycle (probe -> initialize)
//! INVARIANTS: only an initialized window can back an allocator; after
//! initialization every descriptor is free and every byte of the extent is 0

use log::{error, info};
use memwin_hal::{Bus, CacheMaint, Device, MapFlags, RegionMapper};

use crate::{SlotError, SlotTable, WindowConfig, LOG_TARGET};

/// Attributes the slot area is mapped with.
pub const WINDOW_MAP_FLAGS: MapFlags = MapFlags::CACHE_WB.union(MapFlags::PERM_RW);

/// A described but not yet mapped window.
#[derive(Debug)]
pub struct WindowRegion {
    config: WindowConfig,
}

impl WindowRegion {
    pub fn new(config: WindowConfig) -> Result<Self, SlotError> {
        config.validate()?;
        Ok(Self { config })
    }

    /// Checks the backing device before describing the window.
    pub fn probe<D: Device + ?Sized>(device: &D, config: WindowConfig) -> Result<Self, SlotError> {
        if !device.is_ready() {
            error!(target: LOG_TARGET, "window @{:#x}: device not ready", config.mem_base);
            return Err(SlotError::DeviceNotReady);
        }
        Self::new(config)
    }

    pub fn config(&self) -> &WindowConfig {
        &self.config
    }

    /// Maps the slot area write-back, zero-fills control page and slots, then
    /// flush-invalidates the whole extent.
    pub fn initialize<P, M>(self, port: &P, mapper: &M) -> Result<MemoryWindow, SlotError>
    where
        P: Bus + CacheMaint + ?Sized,
        M: RegionMapper + ?Sized,
    {
        let cfg = self.config;
        mapper
            .map_region(cfg.slots_base(), 0, cfg.slots_len(), WINDOW_MAP_FLAGS)
            .map_err(|err| {
                error!(target: LOG_TARGET, "window @{:#x}: map failed: {}", cfg.mem_base, err);
                SlotError::Mapping(err)
            })?;

        port.fill(0, cfg.extent(), 0);
        port.flush_invalidate(cfg.mem_base, cfg.extent());

        info!(
            target: LOG_TARGET,
            "window @{:#x}: {} slots of {} bytes ready",
            cfg.mem_base,
            cfg.slot_count,
            cfg.slot_size()
        );
        Ok(MemoryWindow { config: cfg })
    }
}

/// A mapped, zeroed window.
#[derive(Debug)]
pub struct MemoryWindow {
    config: WindowConfig,
}

impl MemoryWindow {
    pub fn config(&self) -> &WindowConfig {
        &self.config
    }

    /// Directory view through `bus`; the caller owns the barriers.
    pub fn table<'a, B: Bus + ?Sized>(&self, bus: &'a B) -> SlotTable<'a, B> {
        SlotTable::new(bus, self.config.slot_count)
    }
}
