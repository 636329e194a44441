#![forbid(unsafe_code)]

//! The host-facing controller.
//!
//! [`PanelController`] bundles one [`Registry`] with observable outputs so a
//! UI layer can bind its layout directly to the engine:
//!
//! - [`sidebars`](PanelController::sidebars): `{left, right}` activation,
//! - [`panels`](PanelController::panels): per-panel `{id, side, offset, visible}`,
//! - [`is_mobile`](PanelController::is_mobile): viewport below the breakpoint.
//!
//! Each output notifies subscribers only when its value changes, so a scroll
//! tick that moves nothing triggers no re-render.

use std::rc::Rc;

use tracing::debug;

use crate::anchor::NodeHandle;
use crate::config::EngineConfig;
use crate::evaluate::{Evaluation, PanelState, SidebarActivation};
use crate::observable::Observable;
use crate::registry::{PanelEntry, Registry, ZoneEntry};
use crate::responsive::MobileBreakpoint;
use crate::side::{Side, SideSet};

/// Registry plus reactive outputs for one hosting session.
#[derive(Debug)]
pub struct PanelController {
    registry: Registry,
    config: EngineConfig,
    breakpoint: MobileBreakpoint,
    sidebars: Observable<SidebarActivation>,
    panels: Observable<Rc<[PanelState]>>,
    is_mobile: Observable<bool>,
    last: Option<Evaluation>,
    /// Flags from the last pass before any mobile collapse.
    zone_sidebars: SidebarActivation,
}

impl Default for PanelController {
    fn default() -> Self {
        Self::new(EngineConfig::default())
    }
}

impl PanelController {
    #[must_use]
    pub fn new(config: EngineConfig) -> Self {
        let breakpoint = MobileBreakpoint::new(config.mobile_breakpoint_px);
        Self {
            registry: Registry::new(),
            config,
            breakpoint,
            sidebars: Observable::new(SidebarActivation::NONE),
            panels: Observable::new(Rc::from(Vec::new())),
            is_mobile: Observable::new(false),
            last: None,
            zone_sidebars: SidebarActivation::NONE,
        }
    }

    #[must_use]
    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    #[must_use]
    pub fn registry(&self) -> &Registry {
        &self.registry
    }

    // --- Outputs ----------------------------------------------------------

    /// Sidebar activation, updated on every evaluation.
    #[must_use]
    pub fn sidebars(&self) -> &Observable<SidebarActivation> {
        &self.sidebars
    }

    /// Snapshot of every panel, sorted by id.
    #[must_use]
    pub fn panels(&self) -> &Observable<Rc<[PanelState]>> {
        &self.panels
    }

    #[must_use]
    pub fn is_mobile(&self) -> &Observable<bool> {
        &self.is_mobile
    }

    /// Result of the most recent evaluation, if any.
    #[must_use]
    pub fn last_evaluation(&self) -> Option<&Evaluation> {
        self.last.as_ref()
    }

    // --- Registry passthrough ---------------------------------------------

    pub fn register_panel(&mut self, id: &str, side: Side) {
        self.registry.register_panel(id, side);
    }

    pub fn unregister_panel(&mut self, id: &str) -> bool {
        self.registry.unregister_panel(id)
    }

    pub fn update_start_node(&mut self, id: &str, node: Option<&NodeHandle>) {
        self.registry.update_start_node(id, node);
    }

    pub fn update_end_node(&mut self, id: &str, node: Option<&NodeHandle>) {
        self.registry.update_end_node(id, node);
    }

    pub fn register_zone(&mut self, id: &str, sides: impl Into<SideSet>) {
        self.registry.register_zone(id, sides);
    }

    pub fn unregister_zone(&mut self, id: &str) -> bool {
        self.registry.unregister_zone(id)
    }

    pub fn update_zone_start(&mut self, id: &str, node: Option<&NodeHandle>) {
        self.registry.update_zone_start(id, node);
    }

    pub fn update_zone_end(&mut self, id: &str, node: Option<&NodeHandle>) {
        self.registry.update_zone_end(id, node);
    }

    #[must_use]
    pub fn panel(&self, id: &str) -> Option<&PanelEntry> {
        self.registry.panel(id)
    }

    #[must_use]
    pub fn zone(&self, id: &str) -> Option<&ZoneEntry> {
        self.registry.zone(id)
    }

    // --- Driving ----------------------------------------------------------

    /// Record the viewport width and update [`is_mobile`](Self::is_mobile).
    /// Returns whether the mobile state changed.
    ///
    /// With `collapse_sidebars_on_mobile`, crossing the breakpoint also
    /// re-publishes the sidebar flags of the last pass, so no scroll tick is
    /// needed to collapse or restore them.
    pub fn set_viewport_width(&mut self, width: f64) -> bool {
        let mobile = self.breakpoint.is_mobile(width);
        let changed = self.is_mobile.set(mobile);
        if changed {
            debug!(target: "panelpin.registry", width, mobile, "mobile layout changed");
            if self.config.collapse_sidebars_on_mobile {
                let sidebars = self.effective_sidebars();
                if let Some(last) = self.last.as_mut() {
                    last.override_sidebars(sidebars);
                }
                self.sidebars.set(sidebars);
            }
        }
        changed
    }

    /// Run one evaluation pass and publish its outputs.
    pub fn update_scroll(&mut self, scroll_top: f64, viewport_height: f64) -> &Evaluation {
        let mut evaluation = self.registry.evaluate(scroll_top, viewport_height);
        self.zone_sidebars = evaluation.sidebars();
        let sidebars = self.effective_sidebars();
        evaluation.override_sidebars(sidebars);

        self.sidebars.set(sidebars);
        let unchanged = self
            .panels
            .with(|current| **current == *evaluation.panels());
        if !unchanged {
            self.panels.set(Rc::from(evaluation.panels()));
        }
        self.last.insert(evaluation)
    }

    fn effective_sidebars(&self) -> SidebarActivation {
        if self.config.collapse_sidebars_on_mobile && self.is_mobile.get() {
            SidebarActivation::NONE
        } else {
            self.zone_sidebars
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use crate::anchor::OffsetCell;
    use std::cell::Cell;

    fn handle(offset: f64) -> NodeHandle {
        OffsetCell::handle(offset)
    }

    #[test]
    fn publishes_sidebar_changes_once() {
        let mut controller = PanelController::default();
        let start = handle(1000.0);
        controller.register_zone("z1", Side::Left);
        controller.update_zone_start("z1", Some(&start));

        let hits = Rc::new(Cell::new(0u32));
        let hits_clone = Rc::clone(&hits);
        let _sub = controller
            .sidebars()
            .subscribe(move |_| hits_clone.set(hits_clone.get() + 1));

        controller.update_scroll(900.0, 200.0);
        controller.update_scroll(950.0, 200.0);
        assert_eq!(hits.get(), 1);
        assert!(controller.sidebars().get().left);

        controller.update_scroll(100.0, 200.0);
        assert_eq!(hits.get(), 2);
        assert!(!controller.sidebars().get().left);
    }

    #[test]
    fn panels_snapshot_only_changes_with_geometry() {
        let mut controller = PanelController::default();
        let (start, end) = (handle(500.0), handle(1200.0));
        controller.register_panel("p1", Side::Left);
        controller.update_start_node("p1", Some(&start));
        controller.update_end_node("p1", Some(&end));

        controller.update_scroll(600.0, 800.0);
        let version = controller.panels().version();
        controller.update_scroll(700.0, 800.0);
        assert_eq!(controller.panels().version(), version, "pinned offset stays 0");

        controller.update_scroll(1400.0, 800.0);
        assert_eq!(controller.panels().version(), version + 1);
        let snapshot = controller.panels().get();
        assert_eq!(snapshot[0].offset, -200.0);
    }

    #[test]
    fn mobile_collapse_is_opt_in() {
        let start = handle(0.0);

        let mut plain = PanelController::default();
        plain.register_zone("z", Side::Right);
        plain.update_zone_start("z", Some(&start));
        plain.set_viewport_width(375.0);
        assert!(plain.is_mobile().get());
        assert!(plain.update_scroll(0.0, 100.0).sidebars().right);

        let mut collapsing = PanelController::new(EngineConfig {
            collapse_sidebars_on_mobile: true,
            ..EngineConfig::default()
        });
        collapsing.register_zone("z", Side::Right);
        collapsing.update_zone_start("z", Some(&start));
        collapsing.set_viewport_width(375.0);
        assert!(!collapsing.update_scroll(0.0, 100.0).sidebars().right);

        assert!(collapsing.set_viewport_width(1280.0));
        assert!(collapsing.update_scroll(0.0, 100.0).sidebars().right);
    }

    #[test]
    fn crossing_breakpoint_republishes_sidebars() {
        let start = handle(0.0);
        let mut controller = PanelController::new(EngineConfig {
            collapse_sidebars_on_mobile: true,
            ..EngineConfig::default()
        });
        controller.register_zone("z", Side::Right);
        controller.update_zone_start("z", Some(&start));
        controller.set_viewport_width(1280.0);
        assert!(controller.update_scroll(0.0, 100.0).sidebars().right);

        let seen = Rc::new(Cell::new(SidebarActivation::NONE));
        let seen_clone = Rc::clone(&seen);
        let _sub = controller.sidebars().subscribe(move |flags| seen_clone.set(*flags));

        assert!(controller.set_viewport_width(375.0));
        assert!(!controller.sidebars().get().right);
        assert!(!seen.get().right);
        let last = controller.last_evaluation().expect("evaluated");
        assert_eq!(last.sidebars(), SidebarActivation::NONE);

        assert!(controller.set_viewport_width(1024.0));
        assert!(controller.sidebars().get().right);
        assert!(seen.get().right);
        assert!(controller.last_evaluation().expect("evaluated").sidebars().right);
    }

    #[test]
    fn last_evaluation_tracks_latest_pass() {
        let mut controller = PanelController::default();
        assert!(controller.last_evaluation().is_none());
        controller.update_scroll(10.0, 20.0);
        let last = controller.last_evaluation().expect("evaluated");
        assert_eq!(last.viewport().bottom(), 30.0);
    }
}
