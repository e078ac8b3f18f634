// Copyright 2024 Open Nexus OS Contributors
// SPDX-License-Identifier: Apache-2.0

//! CONTEXT: Property-based multi-core tests on the simulated SoC
//! OWNERS: @runtime
//! NOTE: Tests only. Operations alternate between cores at random.
//!
//! TEST_SCOPE:
//!   - After every completed call the external reader sees the model state
//!   - Calls from different cores never lose each other's updates
//!   - Concurrent threads, one per core, never share a slot
//!
//! TEST_SCENARIOS:
//!   - external_view_tracks_model(): random ops on random cores vs. model
//!   - threads_register_disjoint_slots(): two cores racing for slots

use memwin_hal::PAGE_SIZE;
use memwin_host_tests::SimSoc;
use memwin_slots::{
    BufferHandle, ObservedSlot, SlotAllocator, SlotDescriptor, SlotError, SlotId, WindowConfig,
    WindowReader, WindowRegion, MTL_SLOT_COUNT,
};
use proptest::prelude::*;

const WINDOW: usize = 0x7100_0000;
const BUFFERS: usize = 0x3000_0000;
const CORES: usize = 3;

#[derive(Clone, Copy, Debug)]
struct Op {
    core: usize,
    register: bool,
    resource: u32,
    page: usize,
}

fn arb_op() -> impl Strategy<Value = Op> {
    (0..CORES, any::<bool>(), 1u32..4, 0usize..4)
        .prop_map(|(core, register, resource, page)| Op { core, register, resource, page })
}

fn soc() -> SimSoc {
    let soc = SimSoc::new(CORES);
    soc.map_fresh(WINDOW, PAGE_SIZE);
    soc.map_fresh(BUFFERS, 4 * PAGE_SIZE);
    soc
}

fn allocator(soc: &SimSoc) -> SlotAllocator<&SimSoc> {
    let window = WindowRegion::new(WindowConfig::mtl(WINDOW))
        .and_then(|region| region.initialize(&soc.port(0, WINDOW), soc))
        .unwrap();
    SlotAllocator::new(window, soc)
}

fn buffer(page: usize) -> BufferHandle {
    BufferHandle::new(BUFFERS + page * PAGE_SIZE, PAGE_SIZE)
}

type Entry = (u32, usize);

/// First-fit reference; slot id is fixed per resource so tuples are (resource, page).
fn model_apply(model: &mut [Option<Entry>; MTL_SLOT_COUNT], op: &Op) -> Result<usize, SlotError> {
    let entry = Some((op.resource, op.page));
    let hit = model.iter().position(|e| *e == entry);
    if op.register {
        if let Some(index) = hit {
            return Ok(index);
        }
        let index = model.iter().position(Option::is_none).ok_or(SlotError::CapacityExceeded)?;
        model[index] = entry;
        Ok(index)
    } else {
        let index = hit.ok_or(SlotError::NotFound)?;
        model[index] = None;
        Ok(index)
    }
}

fn slot_kind(resource: u32) -> SlotId {
    [SlotId::TELEMETRY, SlotId::DEBUG_LOG, SlotId::GDB_STUB][resource as usize - 1]
}

fn expected(entry: Option<Entry>) -> ObservedSlot {
    match entry {
        None => ObservedSlot::Free,
        Some((resource, page)) => ObservedSlot::Occupied(SlotDescriptor::occupied(
            resource,
            slot_kind(resource),
            buffer(page).address as u32,
        )),
    }
}

proptest! {
    #[test]
    fn external_view_tracks_model(ops in proptest::collection::vec(arb_op(), 1..48)) {
        let soc = soc();
        let alloc = allocator(&soc);
        let reader = WindowReader::new(WindowConfig::mtl(WINDOW));
        let mut model = [None; MTL_SLOT_COUNT];

        for op in &ops {
            let port = soc.port(op.core, WINDOW);
            let kind = slot_kind(op.resource);
            let got = if op.register {
                alloc.register(&port, op.resource, buffer(op.page), kind)
            } else {
                alloc.unregister(&port, op.resource, buffer(op.page), kind)
            };
            prop_assert_eq!(got, model_apply(&mut model, op));

            let host = soc.external(WINDOW);
            for (index, slot) in reader.scan(&host) {
                prop_assert_eq!(slot, expected(model[index]));
            }
        }
        for core in 0..CORES {
            prop_assert_eq!(soc.stats(core).lost_words, 0);
        }
    }
}

#[test]
fn threads_register_disjoint_slots() {
    let soc = soc();
    let alloc = allocator(&soc);

    let mut indices: Vec<usize> = std::thread::scope(|scope| {
        let workers: Vec<_> = (0..CORES)
            .map(|core| {
                let (soc, alloc) = (&soc, &alloc);
                scope.spawn(move || {
                    let port = soc.port(core, WINDOW);
                    (0..2)
                        .map(|n| {
                            let resource = (core * 2 + n + 1) as u32;
                            alloc.register(&port, resource, buffer(n), SlotId::GDB_STUB).unwrap()
                        })
                        .collect::<Vec<_>>()
                })
            })
            .collect();
        workers.into_iter().flat_map(|w| w.join().unwrap()).collect()
    });

    indices.sort_unstable();
    assert_eq!(indices, (0..CORES * 2).collect::<Vec<_>>());
    let host = soc.external(WINDOW);
    let reader = WindowReader::new(WindowConfig::mtl(WINDOW));
    assert_eq!(reader.occupied_count(&host), CORES * 2);
    assert!(reader.is_consistent(&host));
}
