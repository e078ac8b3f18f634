// Copyright 2024 Open Nexus OS Contributors
// SPDX-License-Identifier: Apache-2.0
//
//! CONTEXT: End-to-end boot of the debug window on the simulated SoC
//! OWNERS: @runtime
//! STATUS: Functional
//! API_STABILITY: Stable
//! TEST_COVERAGE: 6 integration tests
//!
//! TEST_SCOPE:
//!   - boot_complete handshake visibility on window 0
//!   - Telemetry and mtrace producers published and readable by the host
//!   - Device readiness and injected failures abort boot
//!
//! TEST_SCENARIOS:
//!   - boot_publishes_telemetry_and_log(): TEL->0, LOG/core0->1, headers visible
//!   - host_reads_log_through_slot(): mtrace bytes and write pointer via the slot
//!   - window2_not_ready(): DeviceNotReady after the handshake
//!   - map_fault_aborts_boot(): Mapping(err) and nothing published
//!   - flat_window_cannot_alias(): Mirror(Unsupported) with FlatBackend
//!   - republish_keeps_records_visible(): second publish leaves the buffer alone
//!
//! DEPENDENCIES:
//!   - memwin_debug::{boot_complete, debug_memory_window_init, MtraceProducer}
//!   - telemetry_intel::TelemetryProducer

use memwin_debug::{
    boot_complete, debug_memory_window_init, platform_backend, BootError, MtraceProducer,
    FIRMWARE_ENTERED,
};
use memwin_hal::{Bus, HalError, PAGE_SIZE};
use memwin_host_tests::{SimDevice, SimSoc};
use memwin_slots::{FlatBackend, Producer, SlotError, SlotId, WindowConfig, WindowReader};
use telemetry_intel::TelemetryProducer;

const WIN0: usize = 0x7000_0000;
const WIN2: usize = 0x7100_0000;
const TELEMETRY_BUF: usize = 0x3000_0000;
const MTRACE_BUF: usize = 0x3000_1000;

fn soc() -> SimSoc {
    let soc = SimSoc::new(1);
    soc.map_fresh(WIN0, PAGE_SIZE);
    soc.map_fresh(WIN2, PAGE_SIZE);
    soc.map_fresh(TELEMETRY_BUF, 2 * PAGE_SIZE);
    soc
}

fn tag(soc: &SimSoc, addr: usize) -> Vec<u8> {
    let host = soc.external(addr);
    (0..3).flat_map(|w| host.read(w * 4).to_le_bytes()).collect()
}

#[test]
fn boot_publishes_telemetry_and_log() {
    let soc = soc();
    let (win0, win2) = (SimDevice::new(WIN0), SimDevice::new(WIN2));
    let mut telemetry = TelemetryProducer::new(soc.port(0, TELEMETRY_BUF), TELEMETRY_BUF);
    let mut mtrace = MtraceProducer::new(soc.port(0, MTRACE_BUF), MTRACE_BUF, 0);

    let window = boot_complete(
        &win0,
        &soc.port(0, WIN0),
        &win2,
        &soc.port(0, WIN2),
        platform_backend(&soc),
        &mut [&mut telemetry, &mut mtrace],
    )
    .unwrap();

    assert_eq!(soc.external(WIN0).read(0), FIRMWARE_ENTERED);
    assert_eq!(window.publications().count(), 2);

    let cfg = WindowConfig::mtl(WIN2);
    let reader = WindowReader::new(cfg);
    let host = soc.external(WIN2);
    let (tel_index, tel) = reader.find(&host, SlotId::TELEMETRY).unwrap();
    let (log_index, log) = reader.find(&host, SlotId::DEBUG_LOG).unwrap();
    assert_eq!((tel_index, tel.resource_id, tel.vma), (0, 1, TELEMETRY_BUF as u32));
    assert_eq!((log_index, log.resource_id, log.slot_id.core()), (1, 2, 0));
    assert!(reader.is_consistent(&host));

    assert_eq!(tag(&soc, cfg.slot_addr(tel_index)), b"TELEMETRY\0\0\0");
    telemetry.record(3, 77).unwrap();
    assert_eq!(soc.external(cfg.slot_addr(tel_index)).read(12 + 3 * 4), 77);
}

#[test]
fn host_reads_log_through_slot() {
    let soc = soc();
    let mut mtrace = MtraceProducer::new(soc.port(0, MTRACE_BUF), MTRACE_BUF, 0);
    let window = debug_memory_window_init(
        &SimDevice::new(WIN2),
        &soc.port(0, WIN2),
        platform_backend(&soc),
        &mut [&mut mtrace],
    )
    .unwrap();
    let index = window.publications().next().map(|p| p.index).unwrap();

    mtrace.write(b"dsp up");
    let slot = soc.external(WindowConfig::mtl(WIN2).slot_addr(index));
    assert_eq!(slot.read(4), 6);
    let bytes: Vec<u8> =
        [slot.read(8), slot.read(12)].iter().flat_map(|w| w.to_le_bytes()).collect();
    assert_eq!(&bytes[..6], b"dsp up");

    // host consumes everything
    slot.write(0, 6);
    assert_eq!(mtrace.pending(), 0);
}

#[test]
fn window2_not_ready() {
    let soc = soc();
    let (win0, win2) = (SimDevice::new(WIN0), SimDevice::new(WIN2));
    win2.set_ready(false);
    let err = boot_complete(
        &win0,
        &soc.port(0, WIN0),
        &win2,
        &soc.port(0, WIN2),
        platform_backend(&soc),
        &mut [],
    )
    .err();
    assert_eq!(err, Some(BootError::Slot(SlotError::DeviceNotReady)));
    assert_eq!(soc.external(WIN0).read(0), FIRMWARE_ENTERED);
}

#[test]
fn map_fault_aborts_boot() {
    let soc = soc();
    let mut telemetry = TelemetryProducer::new(soc.port(0, TELEMETRY_BUF), TELEMETRY_BUF);
    soc.fail_next_map(HalError::OutOfRange);
    let err = debug_memory_window_init(
        &SimDevice::new(WIN2),
        &soc.port(0, WIN2),
        platform_backend(&soc),
        &mut [&mut telemetry],
    )
    .err();
    assert_eq!(err, Some(BootError::Slot(SlotError::Mapping(HalError::OutOfRange))));
    assert!(!telemetry.has_header());
    assert!(soc.mirrors().is_empty());
}

#[test]
fn flat_window_cannot_alias() {
    let soc = soc();
    soc.map_fresh(WindowConfig::mtl(WIN2).slots_base(), 7 * PAGE_SIZE);
    let mut telemetry = TelemetryProducer::new(soc.port(0, TELEMETRY_BUF), TELEMETRY_BUF);
    let err = debug_memory_window_init(
        &SimDevice::new(WIN2),
        &soc.port(0, WIN2),
        FlatBackend,
        &mut [&mut telemetry],
    )
    .err();
    assert_eq!(err, Some(BootError::Slot(SlotError::Mirror(HalError::Unsupported))));
    assert_eq!(err.map(BootError::errno), Some(-38));
    assert_eq!(telemetry.resource_id(), 1);
    let host = soc.external(WIN2);
    assert_eq!(WindowReader::new(WindowConfig::mtl(WIN2)).occupied_count(&host), 0);
}

#[test]
fn republish_keeps_records_visible() {
    let soc = soc();
    let port2 = soc.port(0, WIN2);
    let mut telemetry = TelemetryProducer::new(soc.port(0, TELEMETRY_BUF), TELEMETRY_BUF);
    let mut window = debug_memory_window_init(
        &SimDevice::new(WIN2),
        &port2,
        platform_backend(&soc),
        &mut [&mut telemetry],
    )
    .unwrap();
    telemetry.record(0, 42).unwrap();

    assert_eq!(window.publish(&port2, &mut telemetry), Ok(0));
    let slot = soc.external(WindowConfig::mtl(WIN2).slot_addr(0));
    assert_eq!(slot.read(12), 42);
    assert_eq!(tag(&soc, WindowConfig::mtl(WIN2).slot_addr(0)), b"TELEMETRY\0\0\0");
    assert_eq!(soc.mirrors().len(), 1);
}
