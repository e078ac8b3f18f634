// Copyright 2024 Open Nexus OS Contributors
// SPDX-License-Identifier: Apache-2.0

use memwin_hal::HalError;

/// Errors returned by window initialization and slot (un)registration.
///
/// Every error leaves the slot table exactly as it was before the call.
#[derive(Clone, Copy, Debug, PartialEq, Eq, thiserror::Error)]
#[must_use = "slot errors must be handled"]
pub enum SlotError {
    /// Backing device absent or not ready.
    #[error("memory window device not ready")]
    DeviceNotReady,
    /// Initial page mapping of the window failed.
    #[error("mapping the window failed: {0}")]
    Mapping(HalError),
    /// Every descriptor is occupied.
    #[error("no free slot descriptor")]
    CapacityExceeded,
    /// The remap primitive failed; carried verbatim.
    #[error("mirroring a slot failed: {0}")]
    Mirror(HalError),
    /// No descriptor matches all of resource id, slot id and address.
    #[error("no matching slot descriptor")]
    NotFound,
    /// Sentinel or otherwise unusable identifier, address or configuration.
    #[error("invalid argument")]
    InvalidArgument,
}

const ENODEV: i32 = 19;
const EFAULT: i32 = 14;
const EINVAL: i32 = 22;
const ENOSYS: i32 = 38;
const ENOBUFS: i32 = 105;

impl SlotError {
    /// Negative errno equivalent for firmware callers using C conventions.
    pub const fn errno(self) -> i32 {
        match self {
            SlotError::DeviceNotReady => -ENODEV,
            SlotError::Mapping(_) => -EFAULT,
            SlotError::CapacityExceeded => -ENOBUFS,
            SlotError::Mirror(HalError::Unsupported) => -ENOSYS,
            SlotError::Mirror(_) => -EFAULT,
            SlotError::NotFound | SlotError::InvalidArgument => -EINVAL,
        }
    }
}
