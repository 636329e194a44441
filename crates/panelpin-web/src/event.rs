#![forbid(unsafe_code)]

//! Host-pushed viewport events.

use std::collections::VecDeque;

/// A viewport change reported by the host.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ScrollEvent {
    /// The document scrolled; `scroll_top` is the new offset in pixels.
    Scroll { scroll_top: f64 },
    /// The viewport was resized.
    Resize { width: f64, height: f64 },
}

/// Host-driven event queue.
///
/// The host pushes events from its scroll/resize listeners; the frame driver
/// drains them once per animation frame. Nothing here blocks.
#[derive(Debug, Clone, Default)]
pub struct HostEventSource {
    queue: VecDeque<ScrollEvent>,
}

impl HostEventSource {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push_event(&mut self, event: ScrollEvent) {
        self.queue.push_back(event);
    }

    #[must_use]
    pub fn pending(&self) -> usize {
        self.queue.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.queue.is_empty()
    }

    /// Drain all pending events in arrival order.
    pub fn drain_events(&mut self) -> impl Iterator<Item = ScrollEvent> + '_ {
        self.queue.drain(..)
    }
}
