// Copyright 2024 Open Nexus OS Contributors
// SPDX-License-Identifier: Apache-2.0

#![cfg_attr(not(test), no_std)]
#![forbid(unsafe_code)]

//! CONTEXT: Boot wiring of the debug memory window
//! OWNERS: @runtime
//! STATUS: Functional
//! API_STABILITY: Stable
//! TEST_COVERAGE: unit tests in boot.rs and mtrace.rs + tests/memwin_host/tests/boot.rs
//!
//! PUBLIC API:
//!   - boot_complete(): firmware-entered handshake on window 0, then window 2 setup
//!   - debug_memory_window_init(): probe, map, zero and publish every producer
//!   - DebugWindow: live allocator plus publication bookkeeping
//!   - platform_backend(): backend chosen by the `mtl-tlb` feature
//!   - MtraceProducer (feature `mtrace`), TelemetryProducer (feature `telemetry`)
//!
//! DEPENDENCIES:
//!   - memwin-slots: window lifecycle and slot allocator
//!   - memwin-hal: collaborator traits

mod boot;
mod debug_window;
mod error;
#[cfg(feature = "mtrace")]
pub mod mtrace;

pub use boot::{boot_complete, debug_memory_window_init, platform_backend, FIRMWARE_ENTERED};
pub use debug_window::{DebugWindow, Publication};
pub use error::BootError;

#[cfg(feature = "mtrace")]
pub use mtrace::MtraceProducer;
#[cfg(feature = "telemetry")]
pub use telemetry_intel::TelemetryProducer;

pub(crate) const LOG_TARGET: &str = "memwin-debug";
