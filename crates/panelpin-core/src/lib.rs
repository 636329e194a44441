#![forbid(unsafe_code)]

//! Viewport-relative panel and sidebar-zone engine.
//!
//! Given a scroll position and viewport height, `panelpin-core` computes:
//!
//! - for every registered **panel**, a vertical offset that makes it track
//!   the viewport while its anchor range is on screen, and
//! - for every **zone**, whether the viewport bottom is inside it, folded
//!   into left/right sidebar activation flags.
//!
//! The engine never renders. Hosts register panels and zones as markup
//! mounts, hand over [`NodeHandle`]s for the anchor markers, call
//! [`PanelController::update_scroll`] on scroll/resize ticks, and bind
//! to the observable outputs.
//!
//! ```
//! use panelpin_core::{NodeHandle, OffsetCell, PanelController, Side};
//!
//! let mut controller = PanelController::default();
//! let start: NodeHandle = OffsetCell::handle(500.0);
//! let end: NodeHandle = OffsetCell::handle(1200.0);
//! controller.register_panel("p1", Side::Left);
//! controller.update_start_node("p1", Some(&start));
//! controller.update_end_node("p1", Some(&end));
//!
//! let eval = controller.update_scroll(300.0, 800.0);
//! assert_eq!(eval.panel("p1").map(|p| p.offset), Some(200.0));
//! ```

pub mod anchor;
pub mod config;
pub mod controller;
pub mod evaluate;
pub mod observable;
pub mod registry;
pub mod responsive;
pub mod side;

pub use anchor::{Anchor, AnchorError, Detached, LayoutNode, NodeHandle, OffsetCell};
pub use config::{ConfigError, EngineConfig};
pub use controller::PanelController;
pub use evaluate::{
    Evaluation, PanelRegion, PanelState, SidebarActivation, Viewport, evaluate, panel_offset,
    zone_active,
};
pub use observable::{Observable, Subscription};
pub use registry::{PanelEntry, Registry, ZoneEntry};
pub use responsive::{DEFAULT_MOBILE_BREAKPOINT, MobileBreakpoint};
pub use side::{ParseSideError, Side, SideSet};
