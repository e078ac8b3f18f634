// Copyright 2024 Open Nexus OS Contributors
// SPDX-License-Identifier: Apache-2.0

use memwin_hal::HalError;
use memwin_slots::SlotError;

#[derive(Clone, Copy, Debug, PartialEq, Eq, thiserror::Error)]
#[must_use = "boot errors must be handled"]
pub enum BootError {
    #[error(transparent)]
    Slot(#[from] SlotError),
    /// A producer could not prepare its buffer.
    #[error("producer {name} failed to initialize: {source}")]
    Producer { name: &'static str, source: HalError },
}

const EIO: i32 = 5;

impl BootError {
    pub const fn errno(self) -> i32 {
        match self {
            BootError::Slot(err) => err.errno(),
            BootError::Producer { .. } => -EIO,
        }
    }
}
