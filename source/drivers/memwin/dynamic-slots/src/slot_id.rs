// Copyright 2024 Open Nexus OS Contributors
// SPDX-License-Identifier: Apache-2.0

//! Four-byte content tags stored in a descriptor's `slot_id` field.

use core::fmt;

/// Kind of content published in a slot.
///
/// Well-known tags keep their low byte free for a per-core discriminator
/// (see [`SlotId::with_core`]). `0` always means unused.
#[repr(transparent)]
#[derive(Clone, Copy, Default, PartialEq, Eq, Hash)]
pub struct SlotId(u32);

const CORE_MASK: u32 = 0xff;

impl SlotId {
    pub const UNUSED: SlotId = SlotId(0x0000_0000);
    /// "CRT": critical and warning log buffer.
    pub const CRITICAL_LOG: SlotId = SlotId(0x5452_4300);
    /// "LOG": debug log buffer; low byte carries the core id.
    pub const DEBUG_LOG: SlotId = SlotId(0x474f_4c00);
    /// "GDB": GDB stub channel.
    pub const GDB_STUB: SlotId = SlotId(0x4244_4700);
    /// "TEL": telemetry data.
    pub const TELEMETRY: SlotId = SlotId(0x4c45_5400);
    /// "DEAD": corruption marker, never registered.
    pub const BROKEN: SlotId = SlotId(0x4441_4544);

    pub const fn from_raw(raw: u32) -> Self {
        Self(raw)
    }

    pub const fn raw(self) -> u32 {
        self.0
    }

    /// Replaces the low byte with `core`.
    pub const fn with_core(self, core: u8) -> Self {
        Self((self.0 & !CORE_MASK) | core as u32)
    }

    /// The tag with the core discriminator cleared.
    pub const fn kind(self) -> Self {
        Self(self.0 & !CORE_MASK)
    }

    pub const fn core(self) -> u8 {
        (self.0 & CORE_MASK) as u8
    }

    pub const fn is_unused(self) -> bool {
        self.0 == Self::UNUSED.0
    }

    pub const fn is_broken(self) -> bool {
        self.0 == Self::BROKEN.0
    }

    /// Bytes as they sit in window memory.
    pub const fn tag(self) -> [u8; 4] {
        self.0.to_le_bytes()
    }

    /// Short name of a well-known tag.
    pub fn name(self) -> Option<&'static str> {
        if self.is_broken() {
            return Some("DEAD");
        }
        match self.kind() {
            Self::CRITICAL_LOG => Some("CRT"),
            Self::DEBUG_LOG => Some("LOG"),
            Self::GDB_STUB => Some("GDB"),
            Self::TELEMETRY => Some("TEL"),
            _ => None,
        }
    }
}

impl fmt::Debug for SlotId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.name() {
            Some(name) if !self.is_broken() && self.core() != 0 => {
                write!(f, "SlotId({name}/core{})", self.core())
            }
            Some(name) => write!(f, "SlotId({name})"),
            None => write!(f, "SlotId({:#010x})", self.0),
        }
    }
}

impl From<SlotId> for u32 {
    fn from(id: SlotId) -> u32 {
        id.0
    }
}
