#![forbid(unsafe_code)]

//! Observable value wrapper with change notification and version tracking.
//!
//! Hosts bind their rendering to the engine's outputs through
//! [`Observable<T>`]: each evaluation pass writes the new value, and
//! subscribers run only when it actually changed.
//!
//! # Invariants
//!
//! 1. `version` increments by exactly 1 on each value-changing mutation.
//! 2. `set(v)` where `v == current` is a no-op.
//! 3. Subscribers are notified in registration order.
//! 4. Dropped [`Subscription`] guards stop their callback; dead entries are
//!    pruned lazily on the next notification.
//!
//! # Failure Modes
//!
//! - **Re-entrant set**: setting the same observable from inside one of its
//!   callbacks is allowed; the nested notification runs to completion
//!   before the outer loop continues.

use std::cell::RefCell;
use std::rc::{Rc, Weak};
use tracing::trace_span;
use web_time::Instant;

type CallbackRc<T> = Rc<dyn Fn(&T)>;
type CallbackWeak<T> = Weak<dyn Fn(&T)>;

struct ObservableInner<T> {
    value: T,
    version: u64,
    subscribers: Vec<CallbackWeak<T>>,
}

/// A shared, version-tracked value with change notification.
///
/// Cloning an `Observable` creates a new handle to the **same** state.
pub struct Observable<T> {
    inner: Rc<RefCell<ObservableInner<T>>>,
}

impl<T> Clone for Observable<T> {
    fn clone(&self) -> Self {
        Self {
            inner: Rc::clone(&self.inner),
        }
    }
}

impl<T: std::fmt::Debug> std::fmt::Debug for Observable<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let inner = self.inner.borrow();
        f.debug_struct("Observable")
            .field("value", &inner.value)
            .field("version", &inner.version)
            .field("subscriber_count", &inner.subscribers.len())
            .finish()
    }
}

impl<T: Clone + PartialEq + 'static> Observable<T> {
    #[must_use]
    pub fn new(value: T) -> Self {
        Self {
            inner: Rc::new(RefCell::new(ObservableInner {
                value,
                version: 0,
                subscribers: Vec::new(),
            })),
        }
    }

    /// Clone of the current value.
    #[must_use]
    pub fn get(&self) -> T {
        self.inner.borrow().value.clone()
    }

    /// Borrow the current value for the duration of `f`.
    pub fn with<R>(&self, f: impl FnOnce(&T) -> R) -> R {
        f(&self.inner.borrow().value)
    }

    /// Store `value`, bumping the version and notifying subscribers if it
    /// differs from the current value. Returns whether it changed.
    pub fn set(&self, value: T) -> bool {
        {
            let mut inner = self.inner.borrow_mut();
            if inner.value == value {
                return false;
            }
            inner.value = value;
            inner.version += 1;
        }
        self.notify();
        true
    }

    /// Subscribe to changes. Dropping the returned guard unsubscribes.
    pub fn subscribe(&self, callback: impl Fn(&T) + 'static) -> Subscription {
        let strong: CallbackRc<T> = Rc::new(callback);
        self.inner
            .borrow_mut()
            .subscribers
            .push(Rc::downgrade(&strong));
        Subscription {
            _guard: Box::new(strong),
        }
    }

    /// Increments by 1 on each value-changing mutation.
    #[must_use]
    pub fn version(&self) -> u64 {
        self.inner.borrow().version
    }

    /// Registered subscribers, including dead ones not yet pruned.
    #[must_use]
    pub fn subscriber_count(&self) -> usize {
        self.inner.borrow().subscribers.len()
    }

    fn notify(&self) {
        let callbacks: Vec<CallbackRc<T>> = {
            let mut inner = self.inner.borrow_mut();
            inner.subscribers.retain(|w| w.strong_count() > 0);
            inner
                .subscribers
                .iter()
                .filter_map(Weak::upgrade)
                .collect()
        };
        if callbacks.is_empty() {
            return;
        }

        let value = self.get();
        let started = Instant::now();
        let span = trace_span!(
            target: "panelpin.notify",
            "panelpin.notify",
            subscribers = callbacks.len(),
            duration_us = tracing::field::Empty,
        );
        let _guard = span.enter();
        for cb in &callbacks {
            cb(&value);
        }
        span.record("duration_us", started.elapsed().as_micros() as u64);
    }
}

/// RAII guard for a subscriber callback.
pub struct Subscription {
    _guard: Box<dyn std::any::Any>,
}

impl std::fmt::Debug for Subscription {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Subscription").finish_non_exhaustive()
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::evaluate::SidebarActivation;
    use crate::side::Side;
    use pretty_assertions::assert_eq;
    use std::cell::Cell;

    fn counter<T: Clone + PartialEq + 'static>(obs: &Observable<T>) -> (Rc<Cell<u32>>, Subscription) {
        let hits = Rc::new(Cell::new(0u32));
        let hits_clone = Rc::clone(&hits);
        let sub = obs.subscribe(move |_| hits_clone.set(hits_clone.get() + 1));
        (hits, sub)
    }

    #[test]
    fn set_reports_whether_flags_changed() {
        let obs = Observable::new(SidebarActivation::NONE);
        let (hits, _sub) = counter(&obs);

        assert!(!obs.set(SidebarActivation::NONE));
        assert_eq!(obs.version(), 0);

        let mut right = SidebarActivation::NONE;
        right.activate(Side::Right);
        assert!(obs.set(right));
        assert!(!obs.set(right));
        assert_eq!(obs.version(), 1);
        assert_eq!(hits.get(), 1);
        assert!(obs.with(|flags| flags.is_active(Side::Right)));
    }

    #[test]
    fn slice_snapshots_compare_by_content() {
        let obs: Observable<Rc<[u32]>> = Observable::new(Rc::from(vec![1, 2]));
        let (hits, _sub) = counter(&obs);
        assert!(!obs.set(Rc::from(vec![1, 2])));
        assert!(obs.set(Rc::from(vec![1, 3])));
        assert_eq!(hits.get(), 1);
        assert_eq!(&*obs.get(), &[1, 3]);
    }

    #[test]
    fn dropped_subscription_stops_callbacks() {
        let obs = Observable::new(0);
        let (hits, sub) = counter(&obs);

        obs.set(1);
        drop(sub);
        obs.set(2);
        assert_eq!(hits.get(), 1);
        assert_eq!(obs.subscriber_count(), 0);
    }

    #[test]
    fn subscription_dropped_during_notification_still_sees_current_pass() {
        let obs = Observable::new(0u32);
        let slot: Rc<RefCell<Option<Subscription>>> = Rc::new(RefCell::new(None));
        let dropper = Rc::clone(&slot);
        let _first = obs.subscribe(move |_| {
            dropper.borrow_mut().take();
        });
        let (hits, second) = counter(&obs);
        *slot.borrow_mut() = Some(second);

        assert!(obs.set(1));
        assert_eq!(hits.get(), 1);
        assert_eq!(obs.subscriber_count(), 2, "pruned on the next notification");

        assert!(obs.set(2));
        assert_eq!(hits.get(), 1);
        assert_eq!(obs.subscriber_count(), 1);
    }

    #[test]
    fn nested_set_completes_before_outer_pass_resumes() {
        let obs = Observable::new(0u32);
        let slot: Rc<RefCell<Option<Subscription>>> = Rc::new(RefCell::new(None));
        let inner = obs.clone();
        let dropper = Rc::clone(&slot);
        let _driver = obs.subscribe(move |value| {
            if *value == 1 {
                dropper.borrow_mut().take();
                assert!(inner.set(2));
            }
        });
        let seen = Rc::new(RefCell::new(Vec::new()));
        let seen_clone = Rc::clone(&seen);
        *slot.borrow_mut() = Some(obs.subscribe(move |value| seen_clone.borrow_mut().push(*value)));

        assert!(obs.set(1));
        assert_eq!(*seen.borrow(), vec![2, 1]);
        assert_eq!(obs.get(), 2);
        assert_eq!(obs.version(), 2);

        assert!(obs.set(3));
        assert_eq!(*seen.borrow(), vec![2, 1]);
        assert_eq!(obs.subscriber_count(), 1);
    }

    #[test]
    fn subscribers_notified_in_order() {
        let obs = Observable::new(0);
        let log = Rc::new(RefCell::new(Vec::new()));
        let (a, b) = (Rc::clone(&log), Rc::clone(&log));
        let _s1 = obs.subscribe(move |_| a.borrow_mut().push("first"));
        let _s2 = obs.subscribe(move |_| b.borrow_mut().push("second"));

        obs.set(1);
        assert_eq!(*log.borrow(), vec!["first", "second"]);
    }

    #[test]
    fn reentrant_set_converges() {
        let obs = Observable::new(0);
        let inner = obs.clone();
        let _sub = obs.subscribe(move |val| {
            if *val < 3 {
                inner.set(val + 1);
            }
        });
        obs.set(1);
        assert_eq!(obs.get(), 3);
        assert_eq!(obs.version(), 3);
    }
}
