// Copyright 2024 Open Nexus OS Contributors
// SPDX-License-Identifier: Apache-2.0

//! External-observer view of the directory.
//!
//! An observer never takes the allocator lock. It invalidates the table,
//! reads it, and classifies each descriptor; a `Torn` entry means the
//! snapshot raced a writer (or the memory is corrupt) and should be re-read.

use memwin_hal::{Bus, CacheMaint};

use crate::{SharedAccess, SlotDescriptor, SlotId, SlotTable, WindowConfig};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ObservedSlot {
    Free,
    Occupied(SlotDescriptor),
    /// Some but not all fields are sentinel.
    Torn(SlotDescriptor),
    /// Slot id is the corruption marker.
    Broken(SlotDescriptor),
}

impl ObservedSlot {
    pub fn classify(desc: SlotDescriptor) -> Self {
        if desc.slot_id.is_broken() {
            ObservedSlot::Broken(desc)
        } else if !desc.is_consistent() {
            ObservedSlot::Torn(desc)
        } else if desc.is_free() {
            ObservedSlot::Free
        } else {
            ObservedSlot::Occupied(desc)
        }
    }

    pub fn occupant(&self) -> Option<SlotDescriptor> {
        match self {
            ObservedSlot::Occupied(desc) => Some(*desc),
            _ => None,
        }
    }
}

pub struct WindowReader {
    config: WindowConfig,
}

impl WindowReader {
    pub fn new(config: WindowConfig) -> Self {
        Self { config }
    }

    /// Invalidates the table and classifies every descriptor in index order.
    pub fn scan<'a, P: Bus + CacheMaint + ?Sized>(
        &self,
        port: &'a P,
    ) -> impl Iterator<Item = (usize, ObservedSlot)> + 'a {
        SharedAccess::begin(port, self.config.mem_base, self.config.table_len()).end();
        SlotTable::new(port, self.config.slot_count)
            .entries()
            .map(|(index, desc)| (index, ObservedSlot::classify(desc)))
    }

    pub fn occupied_count<P: Bus + CacheMaint + ?Sized>(&self, port: &P) -> usize {
        self.scan(port).filter(|(_, slot)| slot.occupant().is_some()).count()
    }

    /// First occupied slot of `kind`, ignoring the per-core byte.
    pub fn find<P: Bus + CacheMaint + ?Sized>(
        &self,
        port: &P,
        kind: SlotId,
    ) -> Option<(usize, SlotDescriptor)> {
        self.scan(port).find_map(|(index, slot)| {
            slot.occupant().filter(|desc| desc.slot_id.kind() == kind.kind()).map(|d| (index, d))
        })
    }

    /// True when no descriptor is torn or broken.
    pub fn is_consistent<P: Bus + CacheMaint + ?Sized>(&self, port: &P) -> bool {
        self.scan(port)
            .all(|(_, slot)| matches!(slot, ObservedSlot::Free | ObservedSlot::Occupied(_)))
    }
}
