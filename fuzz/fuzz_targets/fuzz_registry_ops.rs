#![no_main]

use std::rc::Rc;

use arbitrary::Arbitrary;
use libfuzzer_sys::fuzz_target;
use panelpin_core::{NodeHandle, OffsetCell, PanelRegion, Registry, Side};

#[derive(Debug, Arbitrary)]
enum Op {
    RegisterPanel { id: u8, right: bool },
    UnregisterPanel { id: u8 },
    PanelStart { id: u8, node: Option<u8> },
    PanelEnd { id: u8, node: Option<u8> },
    RegisterZone { id: u8, left: bool, right: bool },
    UnregisterZone { id: u8 },
    ZoneStart { id: u8, node: Option<u8> },
    ZoneEnd { id: u8, node: Option<u8> },
    MoveNode { node: u8, offset: i32 },
    DetachNode { node: u8 },
    DropNode { node: u8 },
    Evaluate { scroll_top: i32, height: u16 },
}

const NODES: usize = 8;

fuzz_target!(|ops: Vec<Op>| {
    if ops.len() > 512 {
        return;
    }
    let mut cells: Vec<Option<Rc<OffsetCell>>> =
        (0..NODES).map(|i| Some(OffsetCell::handle(i as f64 * 100.0))).collect();
    let handle = |cells: &[Option<Rc<OffsetCell>>], node: Option<u8>| -> Option<NodeHandle> {
        let cell = cells[usize::from(node?) % NODES].as_ref()?;
        let handle: NodeHandle = cell.clone();
        Some(handle)
    };
    let id = |n: u8| format!("e{}", n % 16);

    let mut registry = Registry::new();
    for op in ops {
        match op {
            Op::RegisterPanel { id: n, right } => {
                let side = if right { Side::Right } else { Side::Left };
                registry.register_panel(&id(n), side);
            }
            Op::UnregisterPanel { id: n } => {
                registry.unregister_panel(&id(n));
            }
            Op::PanelStart { id: n, node } => {
                registry.update_start_node(&id(n), handle(&cells, node).as_ref());
            }
            Op::PanelEnd { id: n, node } => {
                registry.update_end_node(&id(n), handle(&cells, node).as_ref());
            }
            Op::RegisterZone { id: n, left, right } => {
                let sides = [(left, Side::Left), (right, Side::Right)]
                    .into_iter()
                    .filter_map(|(on, side)| on.then_some(side))
                    .collect::<panelpin_core::SideSet>();
                registry.register_zone(&id(n), sides);
            }
            Op::UnregisterZone { id: n } => {
                registry.unregister_zone(&id(n));
            }
            Op::ZoneStart { id: n, node } => {
                registry.update_zone_start(&id(n), handle(&cells, node).as_ref());
            }
            Op::ZoneEnd { id: n, node } => {
                registry.update_zone_end(&id(n), handle(&cells, node).as_ref());
            }
            Op::MoveNode { node, offset } => {
                if let Some(cell) = &cells[usize::from(node) % NODES] {
                    cell.set(f64::from(offset));
                }
            }
            Op::DetachNode { node } => {
                if let Some(cell) = &cells[usize::from(node) % NODES] {
                    cell.detach();
                }
            }
            Op::DropNode { node } => {
                cells[usize::from(node) % NODES] = None;
            }
            Op::Evaluate { scroll_top, height } => {
                let top = f64::from(scroll_top);
                let eval = registry.evaluate(top, f64::from(height));

                // Same inputs, same registry: same output.
                assert_eq!(eval, registry.evaluate(top, f64::from(height)));
                assert_eq!(eval.panels().len(), registry.panel_count());

                for state in eval.panels() {
                    if !state.visible {
                        assert_eq!(state.offset, 0.0, "hidden panel must hold offset 0");
                        assert!(state.region.is_none());
                        continue;
                    }
                    match state.region {
                        Some(PanelRegion::Approaching) => assert!(state.offset > 0.0),
                        Some(PanelRegion::Pinned) => assert_eq!(state.offset, 0.0),
                        Some(PanelRegion::Departed) => assert!(state.offset <= 0.0),
                        None => panic!("visible panel without region"),
                    }
                }
                for zone_id in eval.active_zones() {
                    let zone = registry.zone(zone_id).expect("active zone is registered");
                    for side in zone.sides().iter() {
                        assert!(eval.sidebars().is_active(side));
                    }
                }
            }
        }
    }
});
