// Copyright 2024 Open Nexus OS Contributors
// SPDX-License-Identifier: Apache-2.0

//! CONTEXT: Early-boot bring-up of windows 0 and 2
//! INVARIANTS:
//!   - Window 0 word 0 carries FIRMWARE_ENTERED before window 2 is touched
//!   - Producers are published in slice order; the first failure aborts

use log::{error, info};
use memwin_hal::{cache_line_span, Bus, CacheMaint, Device, RegionMapper, Remapper};
use memwin_slots::{Producer, SlotAllocator, SlotError, WindowConfig, WindowRegion};

#[cfg(not(feature = "mtl-tlb"))]
use memwin_slots::FlatBackend;
#[cfg(feature = "mtl-tlb")]
use memwin_slots::TlbBackend;

use crate::{BootError, DebugWindow, LOG_TARGET};

/// Handshake value the host waits for in word 0 of window 0.
pub const FIRMWARE_ENTERED: u32 = 5;

/// Wraps the memory-management driver in the backend this build targets.
#[cfg(feature = "mtl-tlb")]
pub fn platform_backend<D: RegionMapper + Remapper>(driver: D) -> TlbBackend<D> {
    TlbBackend::new(driver)
}

/// Without the TLB driver the window is flat and cannot alias buffers.
#[cfg(not(feature = "mtl-tlb"))]
pub fn platform_backend<D>(_driver: D) -> FlatBackend {
    FlatBackend
}

/// Signals "firmware entered" through window 0, then brings up the debug
/// window on window 2.
pub fn boot_complete<D0, P0, D2, P2, R>(
    window0: &D0,
    window0_port: &P0,
    window2: &D2,
    window2_port: &P2,
    backend: R,
    producers: &mut [&mut dyn Producer],
) -> Result<DebugWindow<R>, BootError>
where
    D0: Device + ?Sized,
    P0: Bus + CacheMaint + ?Sized,
    D2: Device + ?Sized,
    P2: Bus + CacheMaint + ?Sized,
    R: RegionMapper + Remapper,
{
    if !window0.is_ready() {
        error!(target: LOG_TARGET, "window 0 not ready");
        return Err(SlotError::DeviceNotReady.into());
    }
    window0_port.write(0, FIRMWARE_ENTERED);
    let (start, len) = cache_line_span(window0.mem_base(), 4);
    window0_port.flush(start, len);
    info!(target: LOG_TARGET, "firmware entered @{:#x}", window0.mem_base());

    debug_memory_window_init(window2, window2_port, backend, producers)
}

/// Maps and zeroes the debug window, then publishes every producer.
pub fn debug_memory_window_init<D, P, R>(
    device: &D,
    port: &P,
    backend: R,
    producers: &mut [&mut dyn Producer],
) -> Result<DebugWindow<R>, BootError>
where
    D: Device + ?Sized,
    P: Bus + CacheMaint + ?Sized,
    R: RegionMapper + Remapper,
{
    let window = WindowRegion::probe(device, WindowConfig::from_device(device))?
        .initialize(port, &backend)?;
    let mut debug_window = DebugWindow::new(SlotAllocator::new(window, backend))?;

    for producer in producers.iter_mut() {
        debug_window.publish(port, &mut **producer)?;
    }

    let occupied = debug_window.log_directory(port);
    info!(target: LOG_TARGET, "debug window up, {} slot(s) in use", occupied);
    Ok(debug_window)
}
