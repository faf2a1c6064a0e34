//! Crate-level integration and BDD tests.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, PoisonError};

use camino::Utf8PathBuf;

use crate::builtin::InMemoryExporter;
use crate::component::{SpanData, Telemetry};
use crate::configuration::{ApplyOutcome, Configuration, resolve_configuration};
use crate::model::{ComponentArgs, Signal};
use crate::pipeline::Provider;
use crate::registry::ComponentRegistry;
use crate::sink::InstallationSink;
use crate::{ConfigSource, SchemaReference};


/// Sink keeping every installed provider for inspection.
#[derive(Debug, Default)]
struct RecordingSink {
    providers: Mutex<Vec<Provider>>,
    propagators: Mutex<Vec<String>>,
}

impl RecordingSink {
    fn push(&self, provider: Provider) {
        self.providers
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(provider);
    }

    fn installed(&self) -> Vec<Signal> {
        self.providers
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .iter()
            .map(Provider::signal)
            .collect()
    }

    fn stage_count(&self, signal: Signal) -> Option<usize> {
        self.providers
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .iter()
            .find(|provider| provider.signal() == signal)
            .map(|provider| provider.stages().len())
    }

    fn with_provider<R>(&self, signal: Signal, f: impl FnOnce(&Provider) -> R) -> Option<R> {
        self.providers
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .iter()
            .find(|provider| provider.signal() == signal)
            .map(f)
    }
}

impl InstallationSink for RecordingSink {
    fn install_trace_provider(&self, provider: Provider) {
        self.push(provider);
    }

    fn install_meter_provider(&self, provider: Provider) {
        self.push(provider);
    }

    fn install_log_provider(&self, provider: Provider) {
        self.push(provider);
    }

    fn install_propagators(&self, propagators: &[String]) {
        *self
            .propagators
            .lock()
            .unwrap_or_else(PoisonError::into_inner) = propagators.to_vec();
    }
}

/// A traces exporter whose factory records every invocation and the
/// arguments it was handed.
#[derive(Debug, Clone, Default)]
struct CountingExporter {
    calls: Arc<AtomicUsize>,
    received: Arc<Mutex<Vec<ComponentArgs>>>,
    spans: InMemoryExporter<SpanData>,
}

impl CountingExporter {
    fn register(&self, registry: &mut ComponentRegistry, name: &str) {
        let calls = Arc::clone(&self.calls);
        let received = Arc::clone(&self.received);
        let spans = self.spans.clone();
        registry.register_exporter(Signal::Traces, name, move |args| {
            calls.fetch_add(1, Ordering::SeqCst);
            received
                .lock()
                .unwrap_or_else(PoisonError::into_inner)
                .push(args.clone());
            Ok(SpanData::exporter(Arc::new(spans.clone())))
        });
    }

    fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    fn received(&self) -> Vec<ComponentArgs> {
        self.received
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }
}

fn schema() -> SchemaReference {
    let root = Utf8PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("../..");
    SchemaReference::new(root.join("schema/schema.json"))
}

fn resolve(document: &str) -> Configuration {
    resolve_configuration(&ConfigSource::from(document), &schema())
}

/// Named configuration documents shared by the scenarios.
fn document(name: &str) -> &'static str {
    match name {
        "disabled" => concat!(
            "scheme_version: \"0.1\"\n",
            "sdk:\n",
            "  disabled: true\n",
            "  traces:\n",
            "    exporters: {zipkin: {}}\n",
            "    span_processors:\n",
            "      - name: simple\n",
            "        args: {exporter: zipkin}\n",
        ),
        "single_stage" => concat!(
            "scheme_version: \"0.1\"\n",
            "sdk:\n",
            "  resource:\n",
            "    attributes: {service.name: checkout}\n",
            "  traces:\n",
            "    exporters: {zipkin: {}}\n",
            "    span_processors:\n",
            "      - name: batch\n",
            "        args: {exporter: zipkin}\n",
        ),
        "shared_exporter" => concat!(
            "scheme_version: \"0.1\"\n",
            "sdk:\n",
            "  traces:\n",
            "    exporters: {zipkin: {}}\n",
            "    span_processors:\n",
            "      - name: simple\n",
            "        args: {exporter: zipkin}\n",
            "      - name: batch\n",
            "        args: {exporter: zipkin, max_export_batch_size: 1}\n",
        ),
        "undeclared_exporter" => concat!(
            "scheme_version: \"0.1\"\n",
            "sdk:\n",
            "  traces:\n",
            "    exporters: {zipkin: {}}\n",
            "    span_processors:\n",
            "      - name: simple\n",
            "        args: {exporter: otlp}\n",
            "      - name: simple\n",
            "        args: {exporter: zipkin}\n",
        ),
        "blank_resource_key" => concat!(
            "scheme_version: \"0.1\"\n",
            "sdk:\n",
            "  resource:\n",
            "    attributes: {\"\": anonymous}\n",
            "  traces:\n",
            "    exporters: {zipkin: {}}\n",
            "    span_processors:\n",
            "      - name: simple\n",
            "        args: {exporter: zipkin}\n",
        ),
        "exporter_arguments" => concat!(
            "scheme_version: \"0.1\"\n",
            "sdk:\n",
            "  traces:\n",
            "    exporters:\n",
            "      zipkin: {endpoint: \"http://x\", timeout: 10000}\n",
            "    span_processors:\n",
            "      - name: simple\n",
            "        args: {exporter: zipkin}\n",
        ),
        "missing_version" => "sdk: {}\n",
        _ => "sdk: {traces: [\n",
    }
}

#[test]
fn end_to_end_single_stage_records_resource() {
    let exporter = CountingExporter::default();
    let mut registry = ComponentRegistry::with_builtins();
    exporter.register(&mut registry, "zipkin");
    let sink = RecordingSink::default();

    let configuration = resolve(document("single_stage"));
    let report = configuration.apply(&registry, &sink);

    assert_eq!(report.outcome(), ApplyOutcome::Applied);
    assert!(report.is_clean());
    assert_eq!(sink.installed(), [Signal::Traces]);
    assert_eq!(exporter.calls(), 1);

    sink.with_provider(Signal::Traces, |provider| {
        provider.record(SpanData::new("checkout")).expect("buffered");
        provider.shutdown().expect("flushes on shutdown");
    })
    .expect("traces provider");
    let span = exporter.spans.finished().pop().expect("one span");
    assert_eq!(
        span.resource().get("service.name"),
        Some(&crate::model::AttributeValue::from("checkout"))
    );
}

#[test]
fn missing_scheme_version_is_inert() {
    let sink = RecordingSink::default();
    let report =
        resolve(document("missing_version")).apply(&ComponentRegistry::with_builtins(), &sink);
    assert_eq!(report.outcome(), ApplyOutcome::Inert);
    assert!(sink.installed().is_empty());
    assert!(
        sink.propagators
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .is_empty()
    );
}

#[test]
fn exporter_factory_receives_declared_arguments_verbatim() {
    let exporter = CountingExporter::default();
    let mut registry = ComponentRegistry::with_builtins();
    exporter.register(&mut registry, "zipkin");
    let sink = RecordingSink::default();

    let report = resolve(document("exporter_arguments")).apply(&registry, &sink);

    assert_eq!(report.outcome(), ApplyOutcome::Applied);
    let expected = ComponentArgs::new()
        .with("endpoint", "http://x")
        .with("timeout", 10_000);
    assert_eq!(exporter.received(), [expected]);
}
