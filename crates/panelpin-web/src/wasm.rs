#![forbid(unsafe_code)]

//! `wasm-bindgen` exports for browser hosts.
//!
//! Anchor markers are handed over as JS callbacks returning the marker's
//! `offsetTop` (or `null`/throwing once it is detached). The binding owns
//! the callback wrappers; replacing or clearing one drops the old node,
//! which the engine then sees as unresolved.
//!
//! Only compiled on `wasm32` targets.

use std::collections::HashMap;
use std::rc::Rc;

use js_sys::{Array, Function, Object, Reflect};
use wasm_bindgen::prelude::*;

use panelpin_core::{Detached, EngineConfig, LayoutNode, NodeHandle, Side, SideSet};

use crate::driver::FrameDriver;
use crate::event::ScrollEvent;

struct JsLayoutNode {
    offset_top: Function,
}

impl LayoutNode for JsLayoutNode {
    fn offset_top(&self) -> Result<f64, Detached> {
        self.offset_top
            .call0(&JsValue::NULL)
            .ok()
            .and_then(|value| value.as_f64())
            .ok_or(Detached)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
enum Slot {
    PanelStart,
    PanelEnd,
    ZoneStart,
    ZoneEnd,
}

fn set_js(obj: &Object, key: &str, value: JsValue) {
    let _ = Reflect::set(obj, &JsValue::from_str(key), &value);
}

fn parse_side(side: &str) -> Result<Side, JsValue> {
    side.parse::<Side>()
        .map_err(|err| JsValue::from_str(&err.to_string()))
}

fn parse_sides(sides: &str) -> Result<SideSet, JsValue> {
    sides
        .split(['+', ',', ' '])
        .filter(|part| !part.is_empty())
        .map(parse_side)
        .collect()
}

/// Browser-facing panel host.
#[wasm_bindgen]
pub struct PanelHost {
    driver: FrameDriver,
    nodes: HashMap<(String, Slot), NodeHandle>,
}

impl PanelHost {
    fn attach(&mut self, id: &str, slot: Slot, offset_top: Option<Function>) -> Option<NodeHandle> {
        let key = (id.to_owned(), slot);
        match offset_top {
            Some(offset_top) => {
                let node: NodeHandle = Rc::new(JsLayoutNode { offset_top });
                self.nodes.insert(key, Rc::clone(&node));
                Some(node)
            }
            None => {
                self.nodes.remove(&key);
                None
            }
        }
    }

    fn forget(&mut self, id: &str, slots: [Slot; 2]) {
        for slot in slots {
            self.nodes.remove(&(id.to_owned(), slot));
        }
    }
}

#[wasm_bindgen]
impl PanelHost {
    /// Create a host for a `width` x `height` viewport. `config_json` may
    /// be empty for defaults.
    #[wasm_bindgen(constructor)]
    pub fn new(width: f64, height: f64, config_json: Option<String>) -> Result<PanelHost, JsValue> {
        let config = match config_json.as_deref().filter(|s| !s.trim().is_empty()) {
            Some(json) => EngineConfig::from_json_str(json)
                .map_err(|err| JsValue::from_str(&err.to_string()))?,
            None => EngineConfig::default(),
        };
        Ok(Self {
            driver: FrameDriver::new(config, width, height),
            nodes: HashMap::new(),
        })
    }

    #[wasm_bindgen(js_name = registerPanel)]
    pub fn register_panel(&mut self, id: &str, side: &str) -> Result<(), JsValue> {
        let side = parse_side(side)?;
        self.driver.controller_mut().register_panel(id, side);
        self.driver.invalidate();
        Ok(())
    }

    #[wasm_bindgen(js_name = unregisterPanel)]
    pub fn unregister_panel(&mut self, id: &str) {
        self.forget(id, [Slot::PanelStart, Slot::PanelEnd]);
        self.driver.controller_mut().unregister_panel(id);
        self.driver.invalidate();
    }

    #[wasm_bindgen(js_name = updateStartNode)]
    pub fn update_start_node(&mut self, id: &str, offset_top: Option<Function>) {
        let node = self.attach(id, Slot::PanelStart, offset_top);
        self.driver.controller_mut().update_start_node(id, node.as_ref());
        self.driver.invalidate();
    }

    #[wasm_bindgen(js_name = updateEndNode)]
    pub fn update_end_node(&mut self, id: &str, offset_top: Option<Function>) {
        let node = self.attach(id, Slot::PanelEnd, offset_top);
        self.driver.controller_mut().update_end_node(id, node.as_ref());
        self.driver.invalidate();
    }

    /// `sides` is `"left"`, `"right"` or both joined by `+`, `,` or a space.
    #[wasm_bindgen(js_name = registerZone)]
    pub fn register_zone(&mut self, id: &str, sides: &str) -> Result<(), JsValue> {
        let sides = parse_sides(sides)?;
        self.driver.controller_mut().register_zone(id, sides);
        self.driver.invalidate();
        Ok(())
    }

    #[wasm_bindgen(js_name = unregisterZone)]
    pub fn unregister_zone(&mut self, id: &str) {
        self.forget(id, [Slot::ZoneStart, Slot::ZoneEnd]);
        self.driver.controller_mut().unregister_zone(id);
        self.driver.invalidate();
    }

    #[wasm_bindgen(js_name = updateZoneStart)]
    pub fn update_zone_start(&mut self, id: &str, offset_top: Option<Function>) {
        let node = self.attach(id, Slot::ZoneStart, offset_top);
        self.driver.controller_mut().update_zone_start(id, node.as_ref());
        self.driver.invalidate();
    }

    #[wasm_bindgen(js_name = updateZoneEnd)]
    pub fn update_zone_end(&mut self, id: &str, offset_top: Option<Function>) {
        let node = self.attach(id, Slot::ZoneEnd, offset_top);
        self.driver.controller_mut().update_zone_end(id, node.as_ref());
        self.driver.invalidate();
    }

    pub fn scroll(&mut self, scroll_top: f64) {
        self.driver.push_event(ScrollEvent::Scroll { scroll_top });
    }

    pub fn resize(&mut self, width: f64, height: f64) {
        self.driver.push_event(ScrollEvent::Resize { width, height });
    }

    #[wasm_bindgen(js_name = needsFrame)]
    pub fn needs_frame(&self) -> bool {
        self.driver.needs_frame()
    }

    /// Run one animation frame and return
    /// `{ evaluated, left, right, mobile, panels: [{id, side, offset, visible}] }`.
    pub fn frame(&mut self) -> JsValue {
        let report = self.driver.on_animation_frame();
        let out = Object::new();
        set_js(&out, "evaluated", JsValue::from_bool(report.evaluated));
        set_js(&out, "left", JsValue::from_bool(report.sidebars.left));
        set_js(&out, "right", JsValue::from_bool(report.sidebars.right));
        set_js(
            &out,
            "mobile",
            JsValue::from_bool(self.driver.controller().is_mobile().get()),
        );

        let panels = Array::new();
        if let Some(eval) = self.driver.last_evaluation() {
            for state in eval.panels() {
                let panel = Object::new();
                set_js(&panel, "id", JsValue::from_str(&state.id));
                let side = state.side.map_or(JsValue::NULL, |s| JsValue::from_str(s.label()));
                set_js(&panel, "side", side);
                set_js(&panel, "offset", JsValue::from_f64(state.offset));
                set_js(&panel, "visible", JsValue::from_bool(state.visible));
                panels.push(&panel.into());
            }
        }
        set_js(&out, "panels", panels.into());
        out.into()
    }
}
