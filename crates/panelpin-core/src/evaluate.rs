#![forbid(unsafe_code)]

//! Scroll evaluation: panel offsets and sidebar activation.
//!
//! One call to [`evaluate`] recomputes every derived value from scratch.
//! There is no dirty tracking; anchors resolve asynchronously on the host
//! side, so a full pass is the only way to never serve stale geometry.
//!
//! # Panel regions
//!
//! With `start`/`end` the resolved anchor offsets and `top` the scroll
//! position:
//!
//! | Condition              | Region        | Offset        |
//! |------------------------|---------------|---------------|
//! | `top < start`          | `Approaching` | `start - top` |
//! | `start <= top < end`   | `Pinned`      | `0`           |
//! | `top >= end`           | `Departed`    | `end - top`   |
//!
//! A zero-height range (`start == end`) never pins: `top == start` is
//! already `Departed`.
//!
//! # Zones
//!
//! A zone is active iff `start < viewport_bottom < end`, where an
//! unresolved end is `+inf`. Each sidebar flag is the OR over active zones
//! containing that side.
//!
//! # Failure Modes
//!
//! Anchor resolution failures are logged at `trace` and demote the entry
//! to "unresolved" for this pass only. They never abort the pass.

use serde::{Deserialize, Serialize};
use tracing::{debug_span, trace};
use web_time::Instant;

use crate::anchor::{Anchor, AnchorError};
use crate::registry::{PanelEntry, Registry, ZoneEntry};
use crate::side::Side;

const TARGET: &str = "panelpin.eval";

// ---------------------------------------------------------------------------
// Inputs
// ---------------------------------------------------------------------------

/// Scroll position and viewport height for one pass, in pixels.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Viewport {
    pub scroll_top: f64,
    pub height: f64,
}

impl Viewport {
    /// Build a viewport. Non-finite values become `0`, and a negative height
    /// is clamped to `0`. Negative scroll positions (overscroll) are kept.
    #[must_use]
    pub fn new(scroll_top: f64, height: f64) -> Self {
        let finite = |v: f64| if v.is_finite() { v } else { 0.0 };
        Self {
            scroll_top: finite(scroll_top),
            height: finite(height).max(0.0),
        }
    }

    /// Document coordinate of the viewport's bottom edge.
    #[must_use]
    pub fn bottom(&self) -> f64 {
        self.scroll_top + self.height
    }
}

// ---------------------------------------------------------------------------
// Pure geometry
// ---------------------------------------------------------------------------

/// Where the scroll position sits relative to a panel's anchor range.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PanelRegion {
    /// Scroll has not reached the start anchor; the panel rides below.
    Approaching,
    /// Inside the range; the panel sticks to the viewport top.
    Pinned,
    /// Past the end anchor; the panel leaves upward with it.
    Departed,
}

/// Region and offset for a panel with resolved anchors.
#[must_use]
pub fn panel_offset(start_top: f64, end_top: f64, scroll_top: f64) -> (PanelRegion, f64) {
    if scroll_top < start_top {
        (PanelRegion::Approaching, start_top - scroll_top)
    } else if scroll_top < end_top {
        (PanelRegion::Pinned, 0.0)
    } else {
        (PanelRegion::Departed, end_top - scroll_top)
    }
}

/// Whether a zone spanning `[start, end)` is active for `viewport_bottom`.
/// `None` as end means the zone runs to the end of the document.
#[must_use]
pub fn zone_active(start_top: f64, end_top: Option<f64>, viewport_bottom: f64) -> bool {
    let end = end_top.unwrap_or(f64::INFINITY);
    viewport_bottom > start_top && viewport_bottom < end
}

// ---------------------------------------------------------------------------
// Outputs
// ---------------------------------------------------------------------------

/// Read-only per-panel result for host binding.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PanelState {
    pub id: String,
    pub side: Option<Side>,
    /// Vertical offset in pixels. `0` whenever `visible` is false.
    pub offset: f64,
    /// Both anchors resolved and a side is known.
    pub visible: bool,
    /// `None` while not visible.
    pub region: Option<PanelRegion>,
}

/// Which sidebars are expanded.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct SidebarActivation {
    pub left: bool,
    pub right: bool,
}

impl SidebarActivation {
    pub const NONE: Self = Self {
        left: false,
        right: false,
    };

    #[must_use]
    pub const fn is_active(self, side: Side) -> bool {
        match side {
            Side::Left => self.left,
            Side::Right => self.right,
        }
    }

    pub fn activate(&mut self, side: Side) {
        match side {
            Side::Left => self.left = true,
            Side::Right => self.right = true,
        }
    }

    #[must_use]
    pub const fn any(self) -> bool {
        self.left || self.right
    }
}

/// Result of one evaluation pass.
///
/// Panels and active zones are sorted by id so equal inputs produce equal
/// snapshots regardless of registry iteration order.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Evaluation {
    viewport: Viewport,
    panels: Vec<PanelState>,
    active_zones: Vec<String>,
    sidebars: SidebarActivation,
}

impl Evaluation {
    #[must_use]
    pub fn viewport(&self) -> Viewport {
        self.viewport
    }

    #[must_use]
    pub fn panels(&self) -> &[PanelState] {
        &self.panels
    }

    #[must_use]
    pub fn panel(&self, id: &str) -> Option<&PanelState> {
        self.panels
            .binary_search_by(|state| state.id.as_str().cmp(id))
            .ok()
            .map(|idx| &self.panels[idx])
    }

    /// Panels with a meaningful position this pass.
    pub fn visible(&self) -> impl Iterator<Item = &PanelState> {
        self.panels.iter().filter(|state| state.visible)
    }

    /// Panels currently stuck to the top of the viewport.
    pub fn pinned(&self) -> impl Iterator<Item = &PanelState> {
        self.panels
            .iter()
            .filter(|state| state.region == Some(PanelRegion::Pinned))
    }

    /// Ids of zones whose range contains the viewport bottom.
    pub fn active_zones(&self) -> impl Iterator<Item = &str> {
        self.active_zones.iter().map(String::as_str)
    }

    #[must_use]
    pub fn sidebars(&self) -> SidebarActivation {
        self.sidebars
    }

    /// Replace the published flags (mobile collapse and its undo).
    pub(crate) fn override_sidebars(&mut self, sidebars: SidebarActivation) {
        self.sidebars = sidebars;
    }
}

// ---------------------------------------------------------------------------
// Evaluation pass
// ---------------------------------------------------------------------------

fn resolve_logged(kind: &str, id: &str, which: &str, anchor: &Anchor) -> Option<f64> {
    match anchor.try_resolve() {
        Ok(offset) => Some(offset),
        Err(AnchorError::Unattached) => None,
        Err(err) => {
            trace!(target: TARGET, kind, id, anchor = which, error = %err, "anchor unresolved");
            None
        }
    }
}

fn panel_state(id: &str, panel: &PanelEntry, viewport: Viewport) -> PanelState {
    let hidden = PanelState {
        id: id.to_owned(),
        side: panel.side(),
        offset: 0.0,
        visible: false,
        region: None,
    };
    if panel.side().is_none() {
        return hidden;
    }
    let Some(start) = resolve_logged("panel", id, "start", panel.start()) else {
        return hidden;
    };
    let Some(end) = resolve_logged("panel", id, "end", panel.end()) else {
        return hidden;
    };
    let (region, offset) = panel_offset(start, end, viewport.scroll_top);
    PanelState {
        offset,
        visible: true,
        region: Some(region),
        ..hidden
    }
}

fn zone_is_active(id: &str, zone: &ZoneEntry, viewport: Viewport) -> bool {
    let Some(start) = resolve_logged("zone", id, "start", zone.start()) else {
        return false;
    };
    // Any end that does not resolve leaves the zone open to the bottom.
    let end = resolve_logged("zone", id, "end", zone.end());
    zone_active(start, end, viewport.bottom())
}

/// Compute every panel's offset/visibility and the sidebar flags.
#[must_use]
pub fn evaluate(registry: &Registry, viewport: Viewport) -> Evaluation {
    let start = Instant::now();
    let span = debug_span!(
        target: TARGET,
        "panelpin.evaluate",
        scroll_top = viewport.scroll_top,
        viewport_height = viewport.height,
        panels = registry.panel_count(),
        zones = registry.zone_count(),
        duration_us = tracing::field::Empty,
    );
    let _guard = span.enter();

    let mut panels: Vec<PanelState> = registry
        .panels()
        .map(|(id, panel)| panel_state(id, panel, viewport))
        .collect();
    panels.sort_unstable_by(|a, b| a.id.cmp(&b.id));

    let mut sidebars = SidebarActivation::NONE;
    let mut active_zones = Vec::new();
    for (id, zone) in registry.zones() {
        if !zone_is_active(id, zone, viewport) {
            continue;
        }
        for side in zone.sides().iter() {
            sidebars.activate(side);
        }
        active_zones.push(id.to_owned());
    }
    active_zones.sort_unstable();

    span.record("duration_us", start.elapsed().as_micros() as u64);
    Evaluation {
        viewport,
        panels,
        active_zones,
        sidebars,
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
