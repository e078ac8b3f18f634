// Copyright 2024 Open Nexus OS Contributors
// SPDX-License-Identifier: Apache-2.0

use memwin_hal::HalError;

use crate::SlotId;

/// A producer's own buffer. `address` is what gets published as the
/// descriptor's vma; the slot aliases it, nothing is copied.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct BufferHandle {
    pub address: usize,
    pub size: usize,
}

impl BufferHandle {
    pub const fn new(address: usize, size: usize) -> Self {
        Self { address, size }
    }
}

/// A subsystem that publishes one buffer into the debug window.
pub trait Producer {
    /// Short name for diagnostics.
    fn name(&self) -> &'static str;
    fn resource_id(&self) -> u32;
    fn slot_id(&self) -> SlotId;
    fn buffer(&self) -> BufferHandle;
    /// Prepares the buffer content (and flushes it) before publication.
    fn init(&mut self) -> Result<(), HalError>;
}
