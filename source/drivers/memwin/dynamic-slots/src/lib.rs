// Copyright 2024 Open Nexus OS Contributors
// SPDX-License-Identifier: Apache-2.0

#![cfg_attr(not(test), no_std)]
#![forbid(unsafe_code)]

//! CONTEXT: Dynamic slot directory for the debug memory window
//! OWNERS: @runtime
//! STATUS: Functional
//! API_STABILITY: Stable
//! TEST_COVERAGE: unit tests per module + tests/allocator.rs + tests/prop_allocator.rs
//!
//! PUBLIC API:
//!   - WindowConfig / WindowRegion / MemoryWindow: window layout and lifecycle
//!   - SlotAllocator::register() / unregister(): publish and reclaim slots
//!   - SlotTable / SlotDescriptor / SlotId: the directory in the control page
//!   - SharedAccess: invalidate-on-begin / flush-on-end cache scope
//!   - TlbBackend / FlatBackend: memory-management backends
//!   - WindowReader: external-observer view of the directory
//!   - Producer / BufferHandle: what a publishing subsystem provides
//!
//! DEPENDENCIES:
//!   - memwin-hal::{Bus, CacheMaint, RegionMapper, Remapper, Device}
//!
//! INVARIANTS:
//!   - A descriptor is free iff its vma is 0; occupied descriptors have all
//!     three fields non-zero
//!   - Every table read starts with an invalidate and every table write ends
//!     with a flush before the call returns
//!   - Failed calls leave the table untouched
//!
//! Window layout (bytes from the window base):
//!
//! ```text
//! 0                     SlotDescriptor[slot_count]  (12 bytes each)
//! 12 * slot_count       reserved up to page_size
//! page_size             slot[slot_count]            (page_size bytes each)
//! ```

mod allocator;
mod backend;
mod barrier;
mod error;
mod layout;
mod producer;
mod reader;
mod slot_id;
mod table;
mod window;

pub use allocator::SlotAllocator;
pub use backend::{FlatBackend, TlbBackend};
pub use barrier::SharedAccess;
pub use error::SlotError;
pub use layout::{SlotDescriptor, WindowConfig, DESCRIPTOR_SIZE, MTL_SLOT_COUNT};
pub use producer::{BufferHandle, Producer};
pub use reader::{ObservedSlot, WindowReader};
pub use slot_id::SlotId;
pub use table::SlotTable;
pub use window::{MemoryWindow, WindowRegion, WINDOW_MAP_FLAGS};

/// Reserved resource id; never accepted as an owner.
pub const INVALID_RESOURCE_ID: u32 = 0xffff_ffff;

pub(crate) const LOG_TARGET: &str = "memwin";
