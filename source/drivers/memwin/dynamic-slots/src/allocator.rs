// Copyright 2024 Open Nexus OS Contributors
// SPDX-License-Identifier: Apache-2.0

//! CONTEXT: Slot allocator (map/unmap of producer buffers into the window)
//! OWNERS: @runtime
//! PUBLIC API: SlotAllocator::new(), register(), unregister()
//! DEPENDS_ON: memwin_hal::Remapper, spin::Mutex
//! INVARIANTS:
//!   - The table lock is held from the invalidate to the final flush
//!   - register is idempotent on an exact (resource, slot id, vma) match
//!   - First-fit by ascending index; no compaction
//!   - Remap happens before the descriptor is written; a failed remap leaves
//!     the table untouched
//!   - unregister only reclaims an exact three-field match
//!
//! `port` is the calling core's view of the window: word access plus that
//! core's cache maintenance. Different cores pass different ports to the
//! same allocator.

use log::{debug, error, warn};
use memwin_hal::{is_page_aligned, Bus, CacheMaint, Remapper};
use spin::Mutex;
use static_assertions::assert_impl_all;

use crate::{
    BufferHandle, FlatBackend, MemoryWindow, SharedAccess, SlotDescriptor, SlotError, SlotId,
    INVALID_RESOURCE_ID, LOG_TARGET,
};

pub struct SlotAllocator<R> {
    window: MemoryWindow,
    remapper: R,
    lock: Mutex<()>,
}

assert_impl_all!(SlotAllocator<FlatBackend>: Send, Sync);

impl<R: Remapper> SlotAllocator<R> {
    pub fn new(window: MemoryWindow, remapper: R) -> Self {
        Self { window, remapper, lock: Mutex::new(()) }
    }

    pub fn window(&self) -> &MemoryWindow {
        &self.window
    }

    pub fn remapper(&self) -> &R {
        &self.remapper
    }

    /// Publishes `buffer` into the first free slot and returns its index.
    ///
    /// An existing exact match is returned as-is without remapping.
    pub fn register<P: Bus + CacheMaint + ?Sized>(
        &self,
        port: &P,
        resource_id: u32,
        buffer: BufferHandle,
        slot_id: SlotId,
    ) -> Result<usize, SlotError> {
        let vma = check_tuple(resource_id, buffer.address, slot_id)?;
        let cfg = *self.window.config();
        if buffer.size < cfg.slot_size() {
            warn!(
                target: LOG_TARGET,
                "register {:?}: buffer of {} bytes is smaller than a slot",
                slot_id,
                buffer.size
            );
            return Err(SlotError::InvalidArgument);
        }

        let _guard = self.lock.lock();
        let mut access = SharedAccess::begin(port, cfg.mem_base, cfg.table_len());
        let table = self.window.table(port);

        let mut first_free = None;
        for (index, desc) in table.entries() {
            if desc.matches(resource_id, slot_id, vma) {
                debug!(target: LOG_TARGET, "register {:?}: already in slot {}", slot_id, index);
                return Ok(index);
            }
            if first_free.is_none() && desc.is_free() {
                first_free = Some(index);
            }
        }
        let Some(index) = first_free else {
            warn!(target: LOG_TARGET, "register {:?}: all {} slots in use", slot_id, table.len());
            return Err(SlotError::CapacityExceeded);
        };

        self.remapper
            .mirror_region(buffer.address, cfg.slot_size(), cfg.slot_addr(index))
            .map_err(|err| {
                error!(
                    target: LOG_TARGET,
                    "register {:?}: mirror into slot {} failed: {}",
                    slot_id,
                    index,
                    err
                );
                SlotError::Mirror(err)
            })?;

        table.write(index, &SlotDescriptor::occupied(resource_id, slot_id, vma));
        access.mark_dirty();
        access.end();

        debug!(
            target: LOG_TARGET,
            "register {:?}: resource {} vma {:#x} -> slot {}",
            slot_id,
            resource_id,
            vma,
            index
        );
        Ok(index)
    }

    /// Reclaims the slot holding exactly `(resource_id, buffer.address,
    /// slot_id)` and returns its index. The slot is re-aliased to the window
    /// base before the descriptor is cleared.
    pub fn unregister<P: Bus + CacheMaint + ?Sized>(
        &self,
        port: &P,
        resource_id: u32,
        buffer: BufferHandle,
        slot_id: SlotId,
    ) -> Result<usize, SlotError> {
        let vma = check_tuple(resource_id, buffer.address, slot_id)?;
        let cfg = *self.window.config();

        let _guard = self.lock.lock();
        let mut access = SharedAccess::begin(port, cfg.mem_base, cfg.table_len());
        let table = self.window.table(port);

        let Some(index) = table.position(resource_id, slot_id, vma) else {
            warn!(
                target: LOG_TARGET,
                "unregister {:?}: no slot holds resource {} vma {:#x}",
                slot_id,
                resource_id,
                vma
            );
            return Err(SlotError::NotFound);
        };

        self.remapper
            .mirror_region(cfg.mem_base, cfg.slot_size(), cfg.slot_addr(index))
            .map_err(|err| {
                error!(
                    target: LOG_TARGET,
                    "unregister {:?}: restoring slot {} failed: {}",
                    slot_id,
                    index,
                    err
                );
                SlotError::Mirror(err)
            })?;

        table.clear(index);
        access.mark_dirty();
        access.end();

        debug!(target: LOG_TARGET, "unregister {:?}: slot {} free", slot_id, index);
        Ok(index)
    }
}

/// Rejects sentinels and returns the address as stored in a descriptor.
fn check_tuple(resource_id: u32, address: usize, slot_id: SlotId) -> Result<u32, SlotError> {
    if resource_id == 0 || resource_id == INVALID_RESOURCE_ID {
        warn!(target: LOG_TARGET, "reserved resource id {:#x}", resource_id);
        return Err(SlotError::InvalidArgument);
    }
    if slot_id.is_unused() || slot_id.is_broken() {
        warn!(target: LOG_TARGET, "reserved slot id {:?}", slot_id);
        return Err(SlotError::InvalidArgument);
    }
    if address == 0 || !is_page_aligned(address) {
        warn!(target: LOG_TARGET, "buffer address {:#x} not page aligned", address);
        return Err(SlotError::InvalidArgument);
    }
    u32::try_from(address).map_err(|_| SlotError::InvalidArgument)
}
