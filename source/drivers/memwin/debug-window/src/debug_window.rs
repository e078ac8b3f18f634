// Copyright 2024 Open Nexus OS Contributors
// SPDX-License-Identifier: Apache-2.0

//! Live debug window: the allocator plus what each producer published.

use log::{debug, error, info};
use memwin_hal::{Bus, CacheMaint, Remapper};
use memwin_slots::{
    BufferHandle, ObservedSlot, Producer, SlotAllocator, SlotError, SlotId, WindowReader,
    MTL_SLOT_COUNT,
};

use crate::{BootError, LOG_TARGET};

/// One producer buffer currently aliased into the window.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Publication {
    pub name: &'static str,
    pub resource_id: u32,
    pub slot_id: SlotId,
    pub buffer: BufferHandle,
    pub index: usize,
}

impl Publication {
    fn same_buffer(&self, other: &Publication) -> bool {
        self.resource_id == other.resource_id
            && self.slot_id == other.slot_id
            && self.buffer.address == other.buffer.address
    }
}

pub struct DebugWindow<R> {
    allocator: SlotAllocator<R>,
    published: [Option<Publication>; MTL_SLOT_COUNT],
}

impl<R: Remapper> DebugWindow<R> {
    /// Bookkeeping covers at most `MTL_SLOT_COUNT` slots; larger windows are
    /// rejected.
    pub fn new(allocator: SlotAllocator<R>) -> Result<Self, SlotError> {
        let slot_count = allocator.window().config().slot_count;
        if slot_count > MTL_SLOT_COUNT {
            error!(target: LOG_TARGET, "{} slots exceed bookkeeping capacity", slot_count);
            return Err(SlotError::InvalidArgument);
        }
        Ok(Self { allocator, published: [None; MTL_SLOT_COUNT] })
    }

    pub fn allocator(&self) -> &SlotAllocator<R> {
        &self.allocator
    }

    pub fn publications(&self) -> impl Iterator<Item = &Publication> {
        self.published.iter().flatten()
    }

    /// Prepares the producer's buffer, then registers it. A producer that is
    /// already published keeps its slot and its buffer content.
    pub fn publish<P: Bus + CacheMaint + ?Sized>(
        &mut self,
        port: &P,
        producer: &mut dyn Producer,
    ) -> Result<usize, BootError> {
        let name = producer.name();
        let publication = Publication {
            name,
            resource_id: producer.resource_id(),
            slot_id: producer.slot_id(),
            buffer: producer.buffer(),
            index: 0,
        };
        if let Some(live) = self.publications().find(|p| p.same_buffer(&publication)) {
            debug!(target: LOG_TARGET, "{} already in slot {}", name, live.index);
            return Ok(live.index);
        }
        producer.init().map_err(|source| BootError::Producer { name, source })?;
        let index = self.allocator.register(
            port,
            publication.resource_id,
            publication.buffer,
            publication.slot_id,
        )?;
        self.record(Publication { index, ..publication });
        debug!(target: LOG_TARGET, "{} published in slot {}", name, index);
        Ok(index)
    }

    /// Removes the producer's buffer from the window.
    pub fn retract<P: Bus + CacheMaint + ?Sized>(
        &mut self,
        port: &P,
        producer: &dyn Producer,
    ) -> Result<usize, BootError> {
        let index = self.allocator.unregister(
            port,
            producer.resource_id(),
            producer.buffer(),
            producer.slot_id(),
        )?;
        if let Some(entry) = self.published.get_mut(index) {
            *entry = None;
        }
        debug!(target: LOG_TARGET, "{} retracted from slot {}", producer.name(), index);
        Ok(index)
    }

    fn record(&mut self, publication: Publication) {
        if let Some(entry) = self.published.get_mut(publication.index) {
            *entry = Some(publication);
        }
    }

    /// Logs the directory as an external reader would see it and returns
    /// the number of occupied slots.
    pub fn log_directory<P: Bus + CacheMaint + ?Sized>(&self, port: &P) -> usize {
        let reader = WindowReader::new(*self.allocator.window().config());
        let mut occupied = 0;
        for (index, slot) in reader.scan(port) {
            match slot {
                ObservedSlot::Free => {}
                ObservedSlot::Occupied(desc) => {
                    occupied += 1;
                    info!(
                        target: LOG_TARGET,
                        "slot {}: {:?} resource {} vma {:#x}",
                        index,
                        desc.slot_id,
                        desc.resource_id,
                        desc.vma
                    );
                }
                ObservedSlot::Torn(desc) | ObservedSlot::Broken(desc) => {
                    error!(target: LOG_TARGET, "slot {}: inconsistent {:?}", index, desc);
                }
            }
        }
        occupied
    }
}
