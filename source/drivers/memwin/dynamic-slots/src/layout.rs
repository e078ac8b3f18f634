// Copyright 2024 Open Nexus OS Contributors
// SPDX-License-Identifier: Apache-2.0

//! Bit-exact window layout and its configuration.

use core::mem::{align_of, offset_of, size_of};

use memwin_hal::{Device, PAGE_SIZE};
use static_assertions::const_assert;
use static_assertions::const_assert_eq;

use crate::{SlotError, SlotId};

/// Slot count of the MTL debug window.
pub const MTL_SLOT_COUNT: usize = 7;

/// Size of one descriptor in the control page.
pub const DESCRIPTOR_SIZE: usize = size_of::<SlotDescriptor>();

pub(crate) const RESOURCE_ID_OFFSET: usize = offset_of!(SlotDescriptor, resource_id);
pub(crate) const SLOT_ID_OFFSET: usize = offset_of!(SlotDescriptor, slot_id);
pub(crate) const VMA_OFFSET: usize = offset_of!(SlotDescriptor, vma);

/// One directory entry as stored in the control page.
#[repr(C, align(4))]
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct SlotDescriptor {
    pub resource_id: u32,
    pub slot_id: SlotId,
    pub vma: u32,
}

const_assert_eq!(size_of::<SlotDescriptor>(), 12);
const_assert_eq!(align_of::<SlotDescriptor>(), 4);
const_assert_eq!(RESOURCE_ID_OFFSET, 0);
const_assert_eq!(SLOT_ID_OFFSET, 4);
const_assert_eq!(VMA_OFFSET, 8);
const_assert!(MTL_SLOT_COUNT * DESCRIPTOR_SIZE <= PAGE_SIZE);

impl SlotDescriptor {
    pub const FREE: SlotDescriptor =
        SlotDescriptor { resource_id: 0, slot_id: SlotId::UNUSED, vma: 0 };

    pub const fn occupied(resource_id: u32, slot_id: SlotId, vma: u32) -> Self {
        Self { resource_id, slot_id, vma }
    }

    /// Free iff no address is published.
    pub const fn is_free(&self) -> bool {
        self.vma == 0
    }

    pub fn matches(&self, resource_id: u32, slot_id: SlotId, vma: u32) -> bool {
        self.resource_id == resource_id && self.slot_id == slot_id && self.vma == vma
    }

    /// All three fields sentinel, or all three set.
    pub fn is_consistent(&self) -> bool {
        let set = [self.resource_id != 0, !self.slot_id.is_unused(), self.vma != 0];
        set.iter().all(|s| *s) || set.iter().all(|s| !*s)
    }
}

/// Placement and geometry of one memory window.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct WindowConfig {
    /// Cached-alias base of the window.
    pub mem_base: usize,
    /// Control page size; data slots are the same size. Must equal the
    /// memory-management page size.
    pub page_size: usize,
    pub slot_count: usize,
}

impl WindowConfig {
    /// MTL geometry: one 4 KiB control page followed by seven 4 KiB slots.
    pub const fn mtl(mem_base: usize) -> Self {
        Self { mem_base, page_size: PAGE_SIZE, slot_count: MTL_SLOT_COUNT }
    }

    pub fn from_device<D: Device + ?Sized>(device: &D) -> Self {
        Self::mtl(device.mem_base())
    }

    pub fn validate(&self) -> Result<(), SlotError> {
        // Slots are aliased page by page; they must match the MMU page.
        if self.page_size != PAGE_SIZE {
            return Err(SlotError::InvalidArgument);
        }
        if self.slot_count == 0 || self.table_len() > self.page_size {
            return Err(SlotError::InvalidArgument);
        }
        if self.mem_base == 0 || self.mem_base % self.page_size != 0 {
            return Err(SlotError::InvalidArgument);
        }
        if self.mem_base.checked_add(self.extent()).is_none() {
            return Err(SlotError::InvalidArgument);
        }
        Ok(())
    }

    pub const fn slot_size(&self) -> usize {
        self.page_size
    }

    /// Bytes occupied by the descriptor array.
    pub const fn table_len(&self) -> usize {
        self.slot_count * DESCRIPTOR_SIZE
    }

    pub const fn descriptor_offset(&self, index: usize) -> usize {
        index * DESCRIPTOR_SIZE
    }

    pub const fn slot_offset(&self, index: usize) -> usize {
        self.page_size + index * self.slot_size()
    }

    /// Absolute address of slot `index`.
    pub const fn slot_addr(&self, index: usize) -> usize {
        self.mem_base + self.slot_offset(index)
    }

    /// Absolute address of the first data slot.
    pub const fn slots_base(&self) -> usize {
        self.mem_base + self.page_size
    }

    pub const fn slots_len(&self) -> usize {
        self.slot_count * self.slot_size()
    }

    /// Control page plus all slots.
    pub const fn extent(&self) -> usize {
        self.page_size + self.slots_len()
    }
}
