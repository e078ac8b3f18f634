// Copyright 2024 Open Nexus OS Contributors
// SPDX-License-Identifier: Apache-2.0

#![cfg_attr(not(test), no_std)]
#![forbid(unsafe_code)]

//! CONTEXT: Telemetry producer for the debug memory window
//! OWNERS: @runtime
//! STATUS: Functional
//! API_STABILITY: Stable
//! TEST_COVERAGE: 5 unit tests + tests/publish.rs
//!
//! PUBLIC API:
//!   - TelemetryProducer::new(): wrap a page-sized, page-aligned buffer
//!   - Producer::init(): zero the page and write the separator header
//!   - record() / value(): word-indexed telemetry values after the header
//!
//! DEPENDENCIES:
//!   - memwin-hal::{Bus, CacheMaint}: buffer access and cache maintenance
//!   - memwin-slots::Producer: publication into the window
//!
//! Buffer layout:
//!
//! ```text
//! 0    "TELEMETRY\0\0\0"   separator, 12 bytes
//! 12   u32[RECORD_CAPACITY] telemetry words
//! ```

use log::{debug, info};
use memwin_hal::{cache_line_span, Bus, CacheMaint, HalError, PAGE_SIZE};
use memwin_slots::{BufferHandle, Producer, SlotId};
use static_assertions::const_assert_eq;

const LOG_TARGET: &str = "telemetry";

/// Separator written at the start of the buffer.
pub const SEPARATOR: &[u8; 9] = b"TELEMETRY";

/// Bytes reserved for the separator.
pub const HEADER_LEN: usize = 12;

/// Number of 32-bit values after the header.
pub const RECORD_CAPACITY: usize = (PAGE_SIZE - HEADER_LEN) / 4;

/// Resource id the telemetry buffer is published under.
pub const DEFAULT_RESOURCE_ID: u32 = 1;

const_assert_eq!(HEADER_LEN % 4, 0);

/// Separator as the three little-endian words stored on the bus.
const HEADER_WORDS: [u32; 3] = {
    let mut bytes = [0u8; HEADER_LEN];
    let mut i = 0;
    while i < SEPARATOR.len() {
        bytes[i] = SEPARATOR[i];
        i += 1;
    }
    [
        u32::from_le_bytes([bytes[0], bytes[1], bytes[2], bytes[3]]),
        u32::from_le_bytes([bytes[4], bytes[5], bytes[6], bytes[7]]),
        u32::from_le_bytes([bytes[8], bytes[9], bytes[10], bytes[11]]),
    ]
};

/// Owns the telemetry page. `port` addresses the page from offset 0; its
/// cache maintenance takes absolute addresses.
pub struct TelemetryProducer<B: Bus + CacheMaint> {
    port: B,
    address: usize,
    resource_id: u32,
}

impl<B: Bus + CacheMaint> TelemetryProducer<B> {
    /// `address` is the page-aligned address of the buffer as published.
    pub fn new(port: B, address: usize) -> Self {
        Self { port, address, resource_id: DEFAULT_RESOURCE_ID }
    }

    pub fn with_resource_id(mut self, resource_id: u32) -> Self {
        self.resource_id = resource_id;
        self
    }

    pub fn port(&self) -> &B {
        &self.port
    }

    /// True once the separator is in place.
    pub fn has_header(&self) -> bool {
        HEADER_WORDS.iter().enumerate().all(|(i, word)| self.port.read(i * 4) == *word)
    }

    /// Stores one telemetry word and writes its cache line back.
    pub fn record(&self, index: usize, value: u32) -> Result<(), HalError> {
        let offset = record_offset(index)?;
        self.port.write(offset, value);
        let (start, len) = cache_line_span(self.address + offset, 4);
        self.port.flush(start, len);
        Ok(())
    }

    pub fn value(&self, index: usize) -> Result<u32, HalError> {
        Ok(self.port.read(record_offset(index)?))
    }
}

fn record_offset(index: usize) -> Result<usize, HalError> {
    if index >= RECORD_CAPACITY {
        debug!(target: LOG_TARGET, "record index {} out of range", index);
        return Err(HalError::OutOfRange);
    }
    Ok(HEADER_LEN + index * 4)
}

impl<B: Bus + CacheMaint> Producer for TelemetryProducer<B> {
    fn name(&self) -> &'static str {
        "telemetry"
    }

    fn resource_id(&self) -> u32 {
        self.resource_id
    }

    fn slot_id(&self) -> SlotId {
        SlotId::TELEMETRY
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
        for (i, word) in HEADER_WORDS.iter().enumerate() {
            self.port.write(i * 4, *word);
        }
        self.port.flush_invalidate(self.address, PAGE_SIZE);
        info!(target: LOG_TARGET, "telemetry buffer @{:#x} ready", self.address);
        Ok(())
    }
}
