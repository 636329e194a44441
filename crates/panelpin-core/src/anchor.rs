#![forbid(unsafe_code)]

//! Anchors: non-owning references to host layout nodes.
//!
//! The host owns its layout nodes and hands the engine a [`NodeHandle`].
//! An [`Anchor`] keeps only a `Weak` reference, so a node dropped by the
//! host (unmount) simply stops resolving. Reading the vertical offset goes
//! through the [`LayoutNode`] capability, which may fail when the node is
//! still alive but detached from the document.
//!
//! # Failure Modes
//!
//! Every failure surfaces as an [`AnchorError`] from [`Anchor::try_resolve`].
//! [`Anchor::resolve`] folds them into `None` ("unresolved for this pass").

use std::cell::Cell;
use std::rc::{Rc, Weak};

/// Capability a host layout node must provide: its vertical offset in
/// document coordinates (`offsetTop`-equivalent), in pixels.
pub trait LayoutNode {
    /// Current offset, or [`Detached`] if the node is no longer laid out.
    fn offset_top(&self) -> Result<f64, Detached>;
}

/// Shared handle to a host layout node.
pub type NodeHandle = Rc<dyn LayoutNode>;

/// The node exists but has no layout position.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, thiserror::Error)]
#[error("layout node is detached from the document")]
pub struct Detached;

/// Why an anchor could not be resolved.
#[derive(Debug, Clone, Copy, PartialEq, thiserror::Error)]
pub enum AnchorError {
    /// No node was ever attached (or it was cleared).
    #[error("anchor has no node")]
    Unattached,
    /// The host dropped the node.
    #[error("anchor node was dropped")]
    Dropped,
    /// The node is alive but reported it is not laid out.
    #[error(transparent)]
    Detached(#[from] Detached),
    /// The node produced NaN or an infinite offset.
    #[error("anchor node reported a non-finite offset: {0}")]
    NonFinite(f64),
}

/// A lazily resolved reference to a layout position.
#[derive(Clone, Default)]
pub struct Anchor {
    node: Option<Weak<dyn LayoutNode>>,
}

impl Anchor {
    /// An anchor with no node.
    #[must_use]
    pub const fn unresolved() -> Self {
        Self { node: None }
    }

    /// An anchor tracking `node` without keeping it alive.
    #[must_use]
    pub fn attached(node: &NodeHandle) -> Self {
        Self {
            node: Some(Rc::downgrade(node)),
        }
    }

    /// Replace the backing node. `None` clears the anchor.
    pub fn set(&mut self, node: Option<&NodeHandle>) {
        self.node = node.map(Rc::downgrade);
    }

    /// Whether a node was supplied. The node may still have been dropped.
    #[must_use]
    pub fn is_attached(&self) -> bool {
        self.node.is_some()
    }

    /// Whether the anchor currently points at the same allocation as `node`.
    #[must_use]
    pub fn points_to(&self, node: &NodeHandle) -> bool {
        self.node
            .as_ref()
            .is_some_and(|weak| std::ptr::addr_eq(weak.as_ptr(), Rc::as_ptr(node)))
    }

    /// Resolve to a pixel offset, reporting why resolution failed.
    pub fn try_resolve(&self) -> Result<f64, AnchorError> {
        let weak = self.node.as_ref().ok_or(AnchorError::Unattached)?;
        let node = weak.upgrade().ok_or(AnchorError::Dropped)?;
        let offset = node.offset_top()?;
        if offset.is_finite() {
            Ok(offset)
        } else {
            Err(AnchorError::NonFinite(offset))
        }
    }

    /// Resolve to a pixel offset, or `None` when unresolved.
    #[must_use]
    pub fn resolve(&self) -> Option<f64> {
        self.try_resolve().ok()
    }
}

impl std::fmt::Debug for Anchor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let state = match self.try_resolve() {
            Ok(offset) => return f.debug_tuple("Anchor").field(&offset).finish(),
            Err(err) => err,
        };
        f.debug_tuple("Anchor").field(&state).finish()
    }
}

// ---------------------------------------------------------------------------
// OffsetCell
// ---------------------------------------------------------------------------

/// A host-side layout node whose offset is set directly.
///
/// Useful for hosts that compute layout themselves (no DOM) and for tests.
/// `None` models a node that is alive but detached.
#[derive(Debug, Default)]
pub struct OffsetCell {
    offset: Cell<Option<f64>>,
}

impl OffsetCell {
    #[must_use]
    pub fn new(offset: f64) -> Self {
        Self {
            offset: Cell::new(Some(offset)),
        }
    }

    /// A node that exists but has not been laid out yet.
    #[must_use]
    pub fn detached() -> Self {
        Self::default()
    }

    /// Build a shareable handle at `offset`.
    #[must_use]
    pub fn handle(offset: f64) -> Rc<Self> {
        Rc::new(Self::new(offset))
    }

    pub fn set(&self, offset: f64) {
        self.offset.set(Some(offset));
    }

    pub fn detach(&self) {
        self.offset.set(None);
    }

    #[must_use]
    pub fn get(&self) -> Option<f64> {
        self.offset.get()
    }
}

impl LayoutNode for OffsetCell {
    fn offset_top(&self) -> Result<f64, Detached> {
        self.offset.get().ok_or(Detached)
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    fn node(offset: f64) -> (Rc<OffsetCell>, NodeHandle) {
        let cell = OffsetCell::handle(offset);
        let handle: NodeHandle = cell.clone();
        (cell, handle)
    }

    #[test]
    fn default_is_unresolved() {
        let anchor = Anchor::default();
        assert!(!anchor.is_attached());
        assert_eq!(anchor.try_resolve(), Err(AnchorError::Unattached));
        assert_eq!(anchor.resolve(), None);
    }

    #[test]
    fn resolves_live_node() {
        let (cell, handle) = node(500.0);
        let anchor = Anchor::attached(&handle);
        assert_eq!(anchor.resolve(), Some(500.0));

        cell.set(640.0);
        assert_eq!(anchor.resolve(), Some(640.0));
    }

    #[test]
    fn does_not_keep_node_alive() {
        let (cell, handle) = node(10.0);
        let anchor = Anchor::attached(&handle);
        drop(cell);
        drop(handle);
        assert!(anchor.is_attached());
        assert_eq!(anchor.try_resolve(), Err(AnchorError::Dropped));
    }

    #[test]
    fn detached_node_is_unresolved() {
        let (cell, handle) = node(10.0);
        let anchor = Anchor::attached(&handle);
        cell.detach();
        assert_eq!(anchor.try_resolve(), Err(AnchorError::Detached(Detached)));
        cell.set(20.0);
        assert_eq!(anchor.resolve(), Some(20.0));
    }

    #[test]
    fn non_finite_offset_is_rejected() {
        let (_cell, handle) = node(f64::NAN);
        let anchor = Anchor::attached(&handle);
        assert!(matches!(
            anchor.try_resolve(),
            Err(AnchorError::NonFinite(v)) if v.is_nan()
        ));

        let (_cell, handle) = node(f64::INFINITY);
        assert_eq!(
            Anchor::attached(&handle).try_resolve(),
            Err(AnchorError::NonFinite(f64::INFINITY))
        );
    }

    #[test]
    fn set_none_clears() {
        let (_cell, handle) = node(1.0);
        let mut anchor = Anchor::attached(&handle);
        assert!(anchor.points_to(&handle));
        anchor.set(None);
        assert!(!anchor.is_attached());
        assert!(!anchor.points_to(&handle));
    }

    #[test]
    fn debug_shows_state() {
        let (_cell, handle) = node(12.0);
        assert_eq!(format!("{:?}", Anchor::attached(&handle)), "Anchor(12.0)");
        assert_eq!(format!("{:?}", Anchor::unresolved()), "Anchor(Unattached)");
    }
}
