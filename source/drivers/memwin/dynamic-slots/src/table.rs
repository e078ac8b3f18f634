// Copyright 2024 Open Nexus OS Contributors
// SPDX-License-Identifier: Apache-2.0

//! Word-level view of the descriptor array at the head of the control page.
//!
//! The table performs no cache maintenance itself; callers bracket it with a
//! [`crate::SharedAccess`].

use memwin_hal::Bus;

use crate::layout::{RESOURCE_ID_OFFSET, SLOT_ID_OFFSET, VMA_OFFSET};
use crate::{SlotDescriptor, SlotId, DESCRIPTOR_SIZE};

pub struct SlotTable<'a, B: Bus + ?Sized> {
    bus: &'a B,
    len: usize,
}

impl<B: Bus + ?Sized> Clone for SlotTable<'_, B> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<B: Bus + ?Sized> Copy for SlotTable<'_, B> {}

impl<'a, B: Bus + ?Sized> SlotTable<'a, B> {
    /// `bus` is based at the window base.
    pub fn new(bus: &'a B, len: usize) -> Self {
        Self { bus, len }
    }

    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    pub fn read(&self, index: usize) -> SlotDescriptor {
        debug_assert!(index < self.len);
        let at = index * DESCRIPTOR_SIZE;
        SlotDescriptor {
            resource_id: self.bus.read(at + RESOURCE_ID_OFFSET),
            slot_id: SlotId::from_raw(self.bus.read(at + SLOT_ID_OFFSET)),
            vma: self.bus.read(at + VMA_OFFSET),
        }
    }

    /// Stores an occupied descriptor. `vma` gates occupancy, so it goes last.
    pub fn write(&self, index: usize, desc: &SlotDescriptor) {
        debug_assert!(index < self.len);
        let at = index * DESCRIPTOR_SIZE;
        self.bus.write(at + RESOURCE_ID_OFFSET, desc.resource_id);
        self.bus.write(at + SLOT_ID_OFFSET, desc.slot_id.raw());
        self.bus.write(at + VMA_OFFSET, desc.vma);
    }

    /// Frees a descriptor, clearing `vma` first.
    pub fn clear(&self, index: usize) {
        debug_assert!(index < self.len);
        let at = index * DESCRIPTOR_SIZE;
        self.bus.write(at + VMA_OFFSET, 0);
        self.bus.write(at + SLOT_ID_OFFSET, SlotId::UNUSED.raw());
        self.bus.write(at + RESOURCE_ID_OFFSET, 0);
    }

    pub fn entries(&self) -> impl Iterator<Item = (usize, SlotDescriptor)> + 'a {
        let table = *self;
        (0..self.len).map(move |index| (index, table.read(index)))
    }

    /// Lowest free index.
    pub fn first_free(&self) -> Option<usize> {
        self.entries().find(|(_, desc)| desc.is_free()).map(|(index, _)| index)
    }

    /// Index of the descriptor matching all three fields.
    pub fn position(&self, resource_id: u32, slot_id: SlotId, vma: u32) -> Option<usize> {
        self.entries().find(|(_, desc)| desc.matches(resource_id, slot_id, vma)).map(|(i, _)| i)
    }
}
