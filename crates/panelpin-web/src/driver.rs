#![forbid(unsafe_code)]

//! Animation-frame coalescing.
//!
//! Scroll events arrive far more often than the display refreshes. The
//! [`FrameDriver`] queues them and, on each animation frame, folds the
//! queue into the latest viewport state and runs at most one evaluation.
//!
//! # Invariants
//!
//! 1. `on_animation_frame` evaluates at most once, and only when an event
//!    arrived or [`FrameDriver::invalidate`] was called since the last frame.
//! 2. The last event of each kind wins; intermediate positions are skipped.
//! 3. With `coalesce_frames = false`, every pushed event evaluates
//!    immediately and frames only flush invalidations.

use panelpin_core::{EngineConfig, Evaluation, PanelController, SidebarActivation};
use tracing::{debug, trace};

use crate::event::{HostEventSource, ScrollEvent};

const TARGET: &str = "panelpin.frame";

/// Latest viewport geometry known to the driver.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct ViewportState {
    pub scroll_top: f64,
    pub width: f64,
    pub height: f64,
}

impl ViewportState {
    fn apply(&mut self, event: ScrollEvent) {
        match event {
            ScrollEvent::Scroll { scroll_top } => self.scroll_top = scroll_top,
            ScrollEvent::Resize { width, height } => {
                self.width = width;
                self.height = height;
            }
        }
    }
}

/// What one animation frame did, for host instrumentation.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FrameReport {
    pub frame_idx: u64,
    /// Events folded into this frame.
    pub events_coalesced: usize,
    /// Whether an evaluation pass ran.
    pub evaluated: bool,
    /// Sidebar flags after the frame.
    pub sidebars: SidebarActivation,
}

/// Drives a [`PanelController`] from host events.
#[derive(Debug)]
pub struct FrameDriver {
    controller: PanelController,
    source: HostEventSource,
    viewport: ViewportState,
    dirty: bool,
    frame_idx: u64,
    evaluations: u64,
}

impl FrameDriver {
    /// Create a driver for a viewport of `width` x `height` at scroll 0.
    #[must_use]
    pub fn new(config: EngineConfig, width: f64, height: f64) -> Self {
        let mut controller = PanelController::new(config);
        controller.set_viewport_width(width);
        Self {
            controller,
            source: HostEventSource::new(),
            viewport: ViewportState {
                scroll_top: 0.0,
                width,
                height,
            },
            dirty: true,
            frame_idx: 0,
            evaluations: 0,
        }
    }

    #[must_use]
    pub fn controller(&self) -> &PanelController {
        &self.controller
    }

    /// Mutable access for registration and anchor updates. Call
    /// [`invalidate`](Self::invalidate) afterwards so the next frame
    /// picks up the new layout.
    pub fn controller_mut(&mut self) -> &mut PanelController {
        &mut self.controller
    }

    #[must_use]
    pub fn viewport(&self) -> ViewportState {
        self.viewport
    }

    /// Total evaluation passes run so far.
    #[must_use]
    pub fn evaluations(&self) -> u64 {
        self.evaluations
    }

    /// Force an evaluation on the next frame (anchors moved, markup mounted).
    pub fn invalidate(&mut self) {
        self.dirty = true;
    }

    /// Whether the host should schedule an animation frame.
    #[must_use]
    pub fn needs_frame(&self) -> bool {
        self.dirty || !self.source.is_empty()
    }

    /// Queue a host event, or evaluate right away when coalescing is off.
    pub fn push_event(&mut self, event: ScrollEvent) {
        if self.controller.config().coalesce_frames {
            self.source.push_event(event);
            return;
        }
        self.apply(event);
        self.run_evaluation();
    }

    /// Fold queued events and evaluate at most once.
    pub fn on_animation_frame(&mut self) -> FrameReport {
        self.frame_idx += 1;
        let mut events_coalesced = 0;
        let drained: Vec<ScrollEvent> = self.source.drain_events().collect();
        for event in drained {
            self.apply(event);
            events_coalesced += 1;
        }

        let evaluated = self.dirty;
        if evaluated {
            self.run_evaluation();
        }
        trace!(
            target: TARGET,
            frame_idx = self.frame_idx,
            events_coalesced,
            evaluated,
            "animation frame"
        );
        FrameReport {
            frame_idx: self.frame_idx,
            events_coalesced,
            evaluated,
            sidebars: self.controller.sidebars().get(),
        }
    }

    /// The most recent evaluation result.
    #[must_use]
    pub fn last_evaluation(&self) -> Option<&Evaluation> {
        self.controller.last_evaluation()
    }

    fn apply(&mut self, event: ScrollEvent) {
        let before = self.viewport;
        self.viewport.apply(event);
        if let ScrollEvent::Resize { width, .. } = event {
            if self.controller.set_viewport_width(width) {
                debug!(target: TARGET, width, "viewport crossed mobile breakpoint");
            }
        }
        if self.viewport != before {
            self.dirty = true;
        }
    }

    fn run_evaluation(&mut self) {
        self.controller
            .update_scroll(self.viewport.scroll_top, self.viewport.height);
        self.evaluations += 1;
        self.dirty = false;
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use panelpin_core::{NodeHandle, OffsetCell, Side};
    use pretty_assertions::assert_eq;

    fn driver_with_panel() -> (FrameDriver, [NodeHandle; 2]) {
        let mut driver = FrameDriver::new(EngineConfig::default(), 1280.0, 800.0);
        let anchors: [NodeHandle; 2] = [OffsetCell::handle(500.0), OffsetCell::handle(1200.0)];
        let controller = driver.controller_mut();
        controller.register_panel("p1", Side::Left);
        controller.update_start_node("p1", Some(&anchors[0]));
        controller.update_end_node("p1", Some(&anchors[1]));
        driver.invalidate();
        (driver, anchors)
    }

    #[test]
    fn first_frame_evaluates() {
        let mut driver = FrameDriver::new(EngineConfig::default(), 1280.0, 800.0);
        assert!(driver.needs_frame());
        let report = driver.on_animation_frame();
        assert!(report.evaluated);
        assert!(!driver.needs_frame());
    }

    #[test]
    fn burst_of_scrolls_is_one_evaluation() {
        let (mut driver, _anchors) = driver_with_panel();
        driver.on_animation_frame();
        let before = driver.evaluations();

        for top in [100.0, 200.0, 250.0, 300.0] {
            driver.push_event(ScrollEvent::Scroll { scroll_top: top });
        }
        let report = driver.on_animation_frame();

        assert_eq!(report.events_coalesced, 4);
        assert!(report.evaluated);
        assert_eq!(driver.evaluations(), before + 1);
        let eval = driver.last_evaluation().expect("evaluated");
        assert_eq!(eval.panel("p1").expect("p1").offset, 200.0);
    }

    #[test]
    fn idle_frame_skips_evaluation() {
        let (mut driver, _anchors) = driver_with_panel();
        driver.on_animation_frame();
        let report = driver.on_animation_frame();
        assert!(!report.evaluated);
        assert_eq!(report.events_coalesced, 0);
    }

    #[test]
    fn redundant_scroll_does_not_reevaluate() {
        let (mut driver, _anchors) = driver_with_panel();
        driver.push_event(ScrollEvent::Scroll { scroll_top: 40.0 });
        driver.on_animation_frame();
        driver.push_event(ScrollEvent::Scroll { scroll_top: 40.0 });
        let report = driver.on_animation_frame();
        assert_eq!(report.events_coalesced, 1);
        assert!(!report.evaluated);
    }

    #[test]
    fn resize_updates_mobile_flag() {
        let mut driver = FrameDriver::new(EngineConfig::default(), 1280.0, 800.0);
        assert!(!driver.controller().is_mobile().get());
        driver.push_event(ScrollEvent::Resize {
            width: 390.0,
            height: 844.0,
        });
        driver.on_animation_frame();
        assert!(driver.controller().is_mobile().get());
        assert_eq!(driver.viewport().height, 844.0);
    }

    #[test]
    fn uncoalesced_events_evaluate_immediately() {
        let config = EngineConfig {
            coalesce_frames: false,
            ..EngineConfig::default()
        };
        let mut driver = FrameDriver::new(config, 1280.0, 800.0);
        driver.push_event(ScrollEvent::Scroll { scroll_top: 10.0 });
        driver.push_event(ScrollEvent::Scroll { scroll_top: 20.0 });
        assert_eq!(driver.evaluations(), 2);
        assert!(!driver.needs_frame());
    }
}
