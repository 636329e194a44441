//! Structured logging emitted by the registry and the evaluation pass.

use std::sync::{Arc, Mutex};

use panelpin_core::{NodeHandle, OffsetCell, Registry, Side};
use std::rc::Rc;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::registry::LookupSpan;

#[derive(Debug, Clone)]
struct Captured {
    kind: &'static str,
    name: String,
    target: String,
    message: String,
}

#[derive(Default, Clone)]
struct Capture {
    records: Arc<Mutex<Vec<Captured>>>,
}

struct MessageVisitor(String);

impl tracing::field::Visit for MessageVisitor {
    fn record_debug(&mut self, field: &tracing::field::Field, value: &dyn std::fmt::Debug) {
        if field.name() == "message" {
            self.0 = format!("{value:?}");
        }
    }
}

impl<S> tracing_subscriber::Layer<S> for Capture
where
    S: tracing::Subscriber + for<'a> LookupSpan<'a>,
{
    fn on_new_span(
        &self,
        attrs: &tracing::span::Attributes<'_>,
        _id: &tracing::span::Id,
        _ctx: tracing_subscriber::layer::Context<'_, S>,
    ) {
        self.records.lock().unwrap().push(Captured {
            kind: "span",
            name: attrs.metadata().name().to_string(),
            target: attrs.metadata().target().to_string(),
            message: String::new(),
        });
    }

    fn on_event(&self, event: &tracing::Event<'_>, _ctx: tracing_subscriber::layer::Context<'_, S>) {
        let mut visitor = MessageVisitor(String::new());
        event.record(&mut visitor);
        self.records.lock().unwrap().push(Captured {
            kind: "event",
            name: event.metadata().name().to_string(),
            target: event.metadata().target().to_string(),
            message: visitor.0,
        });
    }
}

fn with_captured_tracing(f: impl FnOnce()) -> Vec<Captured> {
    let capture = Capture::default();
    let subscriber = tracing_subscriber::registry().with(capture.clone());
    tracing::subscriber::with_default(subscriber, f);
    let records = capture.records.lock().unwrap().clone();
    records
}

#[test]
fn evaluation_opens_one_span_per_pass() {
    let records = with_captured_tracing(|| {
        let mut registry = Registry::new();
        registry.evaluate(0.0, 100.0);
        registry.evaluate(10.0, 100.0);
    });
    let spans: Vec<_> = records
        .iter()
        .filter(|r| r.kind == "span" && r.name == "panelpin.evaluate")
        .collect();
    assert_eq!(spans.len(), 2);
    assert!(spans.iter().all(|r| r.target == "panelpin.eval"));
}

#[test]
fn registration_is_logged_under_registry_target() {
    let records = with_captured_tracing(|| {
        let mut registry = Registry::new();
        registry.register_panel("p", Side::Left);
        let start: NodeHandle = OffsetCell::handle(1.0);
        registry.update_start_node("implicit", Some(&start));
        registry.unregister_panel("p");
    });
    let messages: Vec<_> = records
        .iter()
        .filter(|r| r.kind == "event" && r.target == "panelpin.registry")
        .map(|r| r.message.as_str())
        .collect();
    assert_eq!(
        messages,
        vec![
            "panel registered",
            "panel created implicitly by anchor update",
            "panel unregistered",
        ]
    );
}

#[test]
fn detached_anchor_is_traced_not_fatal() {
    let records = with_captured_tracing(|| {
        let mut registry = Registry::new();
        let start = Rc::new(OffsetCell::detached());
        let start_handle: NodeHandle = start.clone();
        let end: NodeHandle = OffsetCell::handle(100.0);
        registry.register_panel("p", Side::Left);
        registry.update_start_node("p", Some(&start_handle));
        registry.update_end_node("p", Some(&end));
        let eval = registry.evaluate(0.0, 100.0);
        assert!(!eval.panel("p").expect("p").visible);
    });
    assert!(records.iter().any(|r| r.kind == "event"
        && r.target == "panelpin.eval"
        && r.message == "anchor unresolved"));
}
