#![forbid(unsafe_code)]

//! Panel and zone registry.
//!
//! The [`Registry`] exclusively owns every [`PanelEntry`] and [`ZoneEntry`],
//! keyed by caller-supplied string ids. All mutations are synchronous, total
//! and idempotent: unknown ids are silent no-ops for removal, and anchor
//! updates for an unknown id create the entry implicitly.
//!
//! # Invariants
//!
//! 1. Re-registering an existing panel changes only its side; anchors and
//!    derived fields are preserved.
//! 2. Re-registering an existing zone changes only its side set.
//! 3. An implicitly created panel has no side and never becomes visible
//!    until a `register_panel` call supplies one.
//! 4. An implicitly created zone has an empty side set and never drives a
//!    sidebar until a `register_zone` call supplies sides.
//! 5. A panel that is not visible holds `offset == 0.0`.

use rustc_hash::FxHashMap;
use tracing::{debug, trace};

use crate::anchor::{Anchor, NodeHandle};
use crate::evaluate::{self, Evaluation, PanelRegion, SidebarActivation, Viewport};
use crate::side::{Side, SideSet};

const TARGET: &str = "panelpin.registry";

// ---------------------------------------------------------------------------
// Entries
// ---------------------------------------------------------------------------

/// A registered panel: a side block whose offset tracks scroll inside its
/// anchor range.
#[derive(Debug, Clone, Default)]
pub struct PanelEntry {
    side: Option<Side>,
    start: Anchor,
    end: Anchor,
    offset: f64,
    visible: bool,
    region: Option<PanelRegion>,
}

impl PanelEntry {
    fn with_side(side: Side) -> Self {
        Self {
            side: Some(side),
            ..Self::default()
        }
    }

    /// Side supplied by the last `register_panel` call, if any.
    #[must_use]
    pub fn side(&self) -> Option<Side> {
        self.side
    }

    #[must_use]
    pub fn start(&self) -> &Anchor {
        &self.start
    }

    #[must_use]
    pub fn end(&self) -> &Anchor {
        &self.end
    }

    /// Offset computed by the last evaluation pass.
    #[must_use]
    pub fn offset(&self) -> f64 {
        self.offset
    }

    /// Visibility computed by the last evaluation pass.
    #[must_use]
    pub fn is_visible(&self) -> bool {
        self.visible
    }

    /// Region computed by the last evaluation pass (`None` while hidden).
    #[must_use]
    pub fn region(&self) -> Option<PanelRegion> {
        self.region
    }

    fn clear_derived(&mut self) {
        self.offset = 0.0;
        self.visible = false;
        self.region = None;
    }
}

/// A registered zone: a document range that activates one or both sidebars
/// while the viewport bottom is inside it.
#[derive(Debug, Clone, Default)]
pub struct ZoneEntry {
    sides: SideSet,
    start: Anchor,
    end: Anchor,
    active: bool,
}

impl ZoneEntry {
    #[must_use]
    pub fn sides(&self) -> SideSet {
        self.sides
    }

    #[must_use]
    pub fn start(&self) -> &Anchor {
        &self.start
    }

    /// End marker. Unresolved means the zone runs to the end of the document.
    #[must_use]
    pub fn end(&self) -> &Anchor {
        &self.end
    }

    /// Activation computed by the last evaluation pass.
    #[must_use]
    pub fn is_active(&self) -> bool {
        self.active
    }
}

// ---------------------------------------------------------------------------
// Registry
// ---------------------------------------------------------------------------

/// Owns the panels and zones of one hosting session.
#[derive(Debug, Default)]
pub struct Registry {
    panels: FxHashMap<String, PanelEntry>,
    zones: FxHashMap<String, ZoneEntry>,
    sidebars: SidebarActivation,
}

impl Registry {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    // --- Panels -----------------------------------------------------------

    /// Insert a panel on `side`, or update the side of an existing one.
    pub fn register_panel(&mut self, id: &str, side: Side) {
        match self.panels.get_mut(id) {
            Some(panel) => {
                if panel.side != Some(side) {
                    trace!(target: TARGET, id, side = side.label(), "panel side updated");
                }
                panel.side = Some(side);
            }
            None => {
                debug!(target: TARGET, id, side = side.label(), "panel registered");
                self.panels.insert(id.to_owned(), PanelEntry::with_side(side));
            }
        }
    }

    /// Remove a panel. Returns whether it existed.
    pub fn unregister_panel(&mut self, id: &str) -> bool {
        let removed = self.panels.remove(id).is_some();
        if removed {
            debug!(target: TARGET, id, "panel unregistered");
        }
        removed
    }

    /// Set (or clear, with `None`) the start anchor of a panel.
    pub fn update_start_node(&mut self, id: &str, node: Option<&NodeHandle>) {
        self.panel_entry(id).start.set(node);
    }

    /// Set (or clear, with `None`) the end anchor of a panel.
    pub fn update_end_node(&mut self, id: &str, node: Option<&NodeHandle>) {
        self.panel_entry(id).end.set(node);
    }

    #[must_use]
    pub fn panel(&self, id: &str) -> Option<&PanelEntry> {
        self.panels.get(id)
    }

    /// Iterate over all panels in unspecified order.
    pub fn panels(&self) -> impl Iterator<Item = (&str, &PanelEntry)> {
        self.panels.iter().map(|(id, panel)| (id.as_str(), panel))
    }

    #[must_use]
    pub fn panel_count(&self) -> usize {
        self.panels.len()
    }

    fn panel_entry(&mut self, id: &str) -> &mut PanelEntry {
        if !self.panels.contains_key(id) {
            debug!(target: TARGET, id, "panel created implicitly by anchor update");
        }
        self.panels.entry(id.to_owned()).or_default()
    }

    // --- Zones ------------------------------------------------------------

    /// Insert a zone driving `sides`, or replace the sides of an existing one.
    pub fn register_zone(&mut self, id: &str, sides: impl Into<SideSet>) {
        let sides = sides.into();
        match self.zones.get_mut(id) {
            Some(zone) => zone.sides = sides,
            None => {
                debug!(target: TARGET, id, sides = %sides, "zone registered");
                self.zones.insert(
                    id.to_owned(),
                    ZoneEntry {
                        sides,
                        ..ZoneEntry::default()
                    },
                );
            }
        }
    }

    /// Remove a zone. Returns whether it existed.
    pub fn unregister_zone(&mut self, id: &str) -> bool {
        let removed = self.zones.remove(id).is_some();
        if removed {
            debug!(target: TARGET, id, "zone unregistered");
        }
        removed
    }

    /// Set (or clear) the start anchor of a zone.
    pub fn update_zone_start(&mut self, id: &str, node: Option<&NodeHandle>) {
        self.zone_entry(id).start.set(node);
    }

    /// Set (or clear) the end anchor of a zone. A cleared end means the
    /// zone extends to the end of the document.
    pub fn update_zone_end(&mut self, id: &str, node: Option<&NodeHandle>) {
        self.zone_entry(id).end.set(node);
    }

    #[must_use]
    pub fn zone(&self, id: &str) -> Option<&ZoneEntry> {
        self.zones.get(id)
    }

    /// Iterate over all zones in unspecified order.
    pub fn zones(&self) -> impl Iterator<Item = (&str, &ZoneEntry)> {
        self.zones.iter().map(|(id, zone)| (id.as_str(), zone))
    }

    #[must_use]
    pub fn zone_count(&self) -> usize {
        self.zones.len()
    }

    fn zone_entry(&mut self, id: &str) -> &mut ZoneEntry {
        if !self.zones.contains_key(id) {
            debug!(target: TARGET, id, "zone created implicitly by anchor update");
        }
        self.zones.entry(id.to_owned()).or_default()
    }

    // --- Evaluation -------------------------------------------------------

    /// Sidebar flags from the last evaluation pass.
    #[must_use]
    pub fn sidebars(&self) -> SidebarActivation {
        self.sidebars
    }

    /// Run one evaluation pass and store the derived fields on each entry.
    pub fn evaluate(&mut self, scroll_top: f64, viewport_height: f64) -> Evaluation {
        let evaluation = evaluate::evaluate(self, Viewport::new(scroll_top, viewport_height));
        self.store(&evaluation);
        evaluation
    }

    fn store(&mut self, evaluation: &Evaluation) {
        for panel in self.panels.values_mut() {
            panel.clear_derived();
        }
        for state in evaluation.panels() {
            if let Some(panel) = self.panels.get_mut(state.id.as_str()) {
                panel.offset = state.offset;
                panel.visible = state.visible;
                panel.region = state.region;
            }
        }
        for (id, zone) in &mut self.zones {
            zone.active = evaluation.active_zones().any(|active| active == id.as_str());
        }
        self.sidebars = evaluation.sidebars();
    }

    /// Drop every panel and zone.
    pub fn clear(&mut self) {
        self.panels.clear();
        self.zones.clear();
        self.sidebars = SidebarActivation::default();
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
