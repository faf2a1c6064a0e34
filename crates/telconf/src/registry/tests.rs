//! Unit tests for the component registry.

use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use rstest::{fixture, rstest};

use super::*;
use crate::builtin::InMemoryExporter;
use crate::component::{LogRecord, MetricPoint, SpanData, Telemetry};

fn span_exporter_factory() -> Factory {
    Factory::exporter(|_| Ok(SpanData::exporter(Arc::new(InMemoryExporter::<SpanData>::default()))))
}

#[fixture]
fn registry() -> ComponentRegistry {
    ComponentRegistry::with_builtins()
}

// ---------------------------------------------------------------------------
// Registration
// ---------------------------------------------------------------------------

#[test]
fn new_registry_is_empty() {
    let registry = ComponentRegistry::new();
    assert!(registry.is_empty());
    assert_eq!(registry.len(), 0);
}

#[rstest]
fn builtins_are_registered(registry: ComponentRegistry) {
    assert_eq!(registry.names(Signal::Traces, Role::Exporter), ["console", "memory"]);
    assert_eq!(registry.names(Signal::Traces, Role::Stage), ["batch", "simple"]);
    assert_eq!(registry.names(Signal::Metrics, Role::Stage), ["periodic"]);
    assert_eq!(registry.names(Signal::Logs, Role::Stage), ["batch", "simple"]);
    assert_eq!(registry.len(), 11);
}

#[test]
fn register_keys_by_role_of_factory() {
    let mut registry = ComponentRegistry::new();
    assert!(registry.register(Signal::Traces, "zipkin", span_exporter_factory()).is_none());
    assert!(registry.contains(Signal::Traces, Role::Exporter, "zipkin"));
    assert!(!registry.contains(Signal::Traces, Role::Stage, "zipkin"));
    assert!(!registry.contains(Signal::Logs, Role::Exporter, "zipkin"));
}

#[test]
fn last_registration_wins() {
    let mut registry = ComponentRegistry::new();
    registry.register(Signal::Logs, "otlp", Factory::exporter(|_| {
        Err(FactoryError::unavailable("first"))
    }));
    let replaced = registry.register(
        Signal::Logs,
        "otlp",
        Factory::exporter(|_| {
            Ok(LogRecord::exporter(Arc::new(InMemoryExporter::<LogRecord>::default())))
        }),
    );
    assert!(replaced.is_some(), "the first factory is returned");
    assert_eq!(registry.len(), 1);
    let component = registry
        .resolve_exporter(Signal::Logs, "otlp", &ComponentArgs::new())
        .expect("second factory is used");
    assert_eq!(component.capability(), Capability::LogExporter);
}

// ---------------------------------------------------------------------------
// Resolution
// ---------------------------------------------------------------------------

#[rstest]
fn missing_exporter_is_not_registered(registry: ComponentRegistry) {
    let err = registry
        .resolve_exporter(Signal::Traces, "jaeger", &ComponentArgs::new())
        .expect_err("jaeger is not built in");
    assert_eq!(
        err,
        ResolutionError::NotRegistered {
            signal: Signal::Traces,
            role: Role::Exporter,
            name: String::from("jaeger"),
        }
    );
}

#[rstest]
fn missing_stage_is_not_registered(registry: ComponentRegistry) {
    let exporter = registry
        .resolve_exporter(Signal::Metrics, "memory", &ComponentArgs::new())
        .expect("memory is built in");
    let err = registry
        .resolve_stage(Signal::Metrics, &StageKind::Batch, &ComponentArgs::new(), exporter)
        .expect_err("metrics have no batch stage");
    assert!(matches!(
        err,
        ResolutionError::NotRegistered { role: Role::Stage, ref name, .. } if name == "batch"
    ));
}

#[test]
fn wrong_signal_factory_is_a_capability_mismatch() {
    let mut registry = ComponentRegistry::new();
    registry.register(Signal::Metrics, "zipkin", span_exporter_factory());
    let err = registry
        .resolve_exporter(Signal::Metrics, "zipkin", &ComponentArgs::new())
        .expect_err("span exporter registered for metrics");
    assert_eq!(
        err,
        ResolutionError::CapabilityMismatch {
            signal: Signal::Metrics,
            role: Role::Exporter,
            name: String::from("zipkin"),
            expected: Capability::MetricExporter,
            found: Capability::SpanExporter,
        }
    );
}

#[rstest]
fn rejected_arguments_are_a_construction_failure(registry: ComponentRegistry) {
    let exporter = registry
        .resolve_exporter(Signal::Traces, "memory", &ComponentArgs::new())
        .expect("memory is built in");
    let args = ComponentArgs::new().with("max_queue_size", "plenty");
    let err = registry
        .resolve_stage(Signal::Traces, &StageKind::Batch, &args, exporter)
        .expect_err("string queue size");
    assert!(matches!(
        err,
        ResolutionError::Construction {
            source: FactoryError::InvalidArgument { ref argument, .. },
            ..
        } if argument == "max_queue_size"
    ));
}

#[rstest]
fn stage_rejects_exporter_of_another_signal(registry: ComponentRegistry) {
    let exporter = registry
        .resolve_exporter(Signal::Logs, "console", &ComponentArgs::new())
        .expect("console is built in");
    let err = registry
        .resolve_stage(Signal::Traces, &StageKind::Simple, &ComponentArgs::new(), exporter)
        .expect_err("log exporter cannot feed a span processor");
    assert!(matches!(
        err,
        ResolutionError::Construction {
            source: FactoryError::WrongExporter {
                expected: Capability::SpanExporter,
                found: Capability::LogExporter,
            },
            ..
        }
    ));
}

#[test]
fn resolution_invokes_factory_with_args() {
    let calls = Arc::new(AtomicUsize::new(0));
    let seen = Arc::clone(&calls);
    let mut registry = ComponentRegistry::new();
    registry.register_exporter(Signal::Metrics, "prometheus", move |args| {
        seen.fetch_add(1, Ordering::SeqCst);
        assert_eq!(args.get_u64("port").expect("integer"), Some(9464));
        Ok(MetricPoint::exporter(Arc::new(InMemoryExporter::<MetricPoint>::default())))
    });
    let args = ComponentArgs::new().with("port", 9464);
    registry
        .resolve_exporter(Signal::Metrics, "prometheus", &args)
        .expect("resolves");
    assert_eq!(calls.load(Ordering::SeqCst), 1);
}

// ---------------------------------------------------------------------------
// Process-wide registry
// ---------------------------------------------------------------------------

#[test]
fn shared_registry_snapshot_and_reset() {
    let shared = SharedRegistry::new(ComponentRegistry::with_builtins());
    shared.register(Signal::Traces, "zipkin", span_exporter_factory());
    let snapshot = shared.snapshot();
    assert!(snapshot.contains(Signal::Traces, Role::Exporter, "zipkin"));

    shared.register_exporter(Signal::Logs, "otlp", |_| Err(FactoryError::unavailable("offline")));
    assert!(
        !snapshot.contains(Signal::Logs, Role::Exporter, "otlp"),
        "snapshots are independent of later registrations"
    );

    shared.reset();
    let restored = shared.snapshot();
    assert!(!restored.contains(Signal::Traces, Role::Exporter, "zipkin"));
    assert!(restored.contains(Signal::Traces, Role::Exporter, "console"));
}

#[test]
fn global_registry_holds_builtins() {
    assert!(global().snapshot().contains(Signal::Metrics, Role::Stage, "periodic"));
}
