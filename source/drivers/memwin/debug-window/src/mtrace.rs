// Copyright 2024 Open Nexus OS Contributors
// SPDX-License-Identifier: Apache-2.0

//! mtrace log buffer published in a per-core debug-log slot.
//!
//! ```text
//! 0    u32  host read pointer (ring offset, advanced by the host)
//! 4    u32  DSP write pointer (ring offset, advanced here)
//! 8    u8[RING_LEN] byte ring
//! ```
//!
//! The write pointer is stored after the bytes it covers; a reader that sees
//! a new pointer after invalidating also sees the data. Writes stop one byte
//! short of the host read pointer, so unread log is never overwritten.

use core::fmt;

use memwin_hal::{Bus, CacheMaint, HalError, PAGE_SIZE};
use memwin_slots::{BufferHandle, Producer, SlotId};

const READ_PTR: usize = 0;
const WRITE_PTR: usize = 4;
const RING: usize = 8;

/// Capacity of the byte ring.
pub const RING_LEN: usize = PAGE_SIZE - RING;

/// Resource id the log buffer is published under.
pub const DEFAULT_RESOURCE_ID: u32 = 2;

pub struct MtraceProducer<B: Bus + CacheMaint> {
    port: B,
    address: usize,
    core: u8,
    resource_id: u32,
}

impl<B: Bus + CacheMaint> MtraceProducer<B> {
    pub fn new(port: B, address: usize, core: u8) -> Self {
        Self { port, address, core, resource_id: DEFAULT_RESOURCE_ID }
    }

    pub fn with_resource_id(mut self, resource_id: u32) -> Self {
        self.resource_id = resource_id;
        self
    }

    /// Host-owned; re-read from memory on every call.
    pub fn read_pointer(&self) -> usize {
        self.port.invalidate(self.address + READ_PTR, 4);
        self.port.read(READ_PTR) as usize % RING_LEN
    }

    pub fn write_pointer(&self) -> usize {
        self.port.read(WRITE_PTR) as usize % RING_LEN
    }

    /// Bytes written but not yet consumed by the host.
    pub fn pending(&self) -> usize {
        (self.write_pointer() + RING_LEN - self.read_pointer()) % RING_LEN
    }

    /// Bytes that can be written before reaching the host read pointer.
    /// One byte stays unused so a full ring is distinct from an empty one.
    pub fn free_space(&self) -> usize {
        RING_LEN - 1 - self.pending()
    }

    /// Appends as much of `bytes` as fits without passing the host read
    /// pointer, wrapping around the ring, and returns how many were stored.
    /// Unread log is never overwritten; the remainder is dropped.
    pub fn write(&self, bytes: &[u8]) -> usize {
        let bytes = &bytes[..bytes.len().min(self.free_space())];
        if bytes.is_empty() {
            return 0;
        }
        let start = self.write_pointer();
        for (i, byte) in bytes.iter().enumerate() {
            self.put(RING + (start + i) % RING_LEN, *byte);
        }
        self.port.write(WRITE_PTR, ((start + bytes.len()) % RING_LEN) as u32);
        self.port.flush(self.address, PAGE_SIZE);
        bytes.len()
    }

    fn put(&self, offset: usize, byte: u8) {
        let word = offset & !3;
        let shift = (offset & 3) * 8;
        let old = self.port.read(word) & !(0xff << shift);
        self.port.write(word, old | (u32::from(byte) << shift));
    }

    /// Byte at ring offset `pos`.
    pub fn peek(&self, pos: usize) -> u8 {
        let offset = RING + pos % RING_LEN;
        (self.port.read(offset & !3) >> ((offset & 3) * 8)) as u8
    }
}

impl<B: Bus + CacheMaint> fmt::Write for MtraceProducer<B> {
    /// Fails when the ring could not take the whole string.
    fn write_str(&mut self, s: &str) -> fmt::Result {
        if MtraceProducer::write(self, s.as_bytes()) == s.len() {
            Ok(())
        } else {
            Err(fmt::Error)
        }
    }
}

impl<B: Bus + CacheMaint> Producer for MtraceProducer<B> {
    fn name(&self) -> &'static str {
        "mtrace"
    }

    fn resource_id(&self) -> u32 {
        self.resource_id
    }

    fn slot_id(&self) -> SlotId {
        SlotId::DEBUG_LOG.with_core(self.core)
    }

    fn buffer(&self) -> BufferHandle {
        BufferHandle::new(self.address, PAGE_SIZE)
    }

    fn init(&mut self) -> Result<(), HalError> {
        if self.address == 0 || self.address % PAGE_SIZE != 0 {
            return Err(HalError::Unaligned);
        }
        self.port.fill(0, PAGE_SIZE, 0);
        self.port.flush_invalidate(self.address, PAGE_SIZE);
        Ok(())
    }
}
