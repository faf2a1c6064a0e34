//! Unit tests for typing validated trees into the model.

use rstest::rstest;
use serde_json::json;

use super::*;
use crate::error::FactoryError;

fn kitchen_sink_tree() -> Value {
    json!({
        "scheme_version": "0.1",
        "sdk": {
            "propagators": ["tracecontext", "baggage"],
            "resource": {"attributes": {"service.name": "checkout", "replicas": 3, "canary": true}},
            "traces": {
                "exporters": {
                    "zipkin": {"endpoint": "http://localhost:9411/api/v2/spans"},
                    "console": null
                },
                "span_processors": [
                    {"name": "batch", "args": {"exporter": "zipkin", "max_queue_size": 2048}},
                    {"name": "simple", "args": {"exporter": "console"}}
                ]
            },
            "metrics": {
                "exporters": {"console": {}},
                "metric_readers": [
                    {"type": "periodic", "args": {"exporter": "console", "interval": 5000}}
                ]
            }
        }
    })
}

#[test]
fn types_every_section() {
    let config = PipelineConfig::from_tree(kitchen_sink_tree()).expect("typing succeeds");
    assert_eq!(config.scheme_version(), "0.1");
    assert!(!config.is_disabled());
    assert_eq!(config.propagators(), ["tracecontext", "baggage"]);

    let attributes = config.resource().attributes();
    assert_eq!(attributes.len(), 3);
    assert_eq!(attributes.get("service.name"), Some(&AttributeValue::from("checkout")));
    assert_eq!(attributes.get("replicas"), Some(&AttributeValue::Int(3)));
    assert_eq!(attributes.get("canary"), Some(&AttributeValue::Bool(true)));

    let traces = config.signal(Signal::Traces).expect("traces declared");
    assert_eq!(traces.exporters().len(), 2);
    assert!(traces.exporter_args("console").expect("console").is_empty());
    let kinds: Vec<&StageKind> = traces.stages().iter().map(StageSpec::kind).collect();
    assert_eq!(kinds, [&StageKind::Batch, &StageKind::Simple]);
    let first = traces.stages().first().expect("first stage");
    assert_eq!(first.exporter(), "zipkin");
    assert_eq!(first.args().get_u64("max_queue_size").expect("integer"), Some(2048));
    assert!(first.args().contains_key("exporter"), "args are kept verbatim");
}

#[test]
fn readers_may_use_type_key() {
    let config = PipelineConfig::from_tree(kitchen_sink_tree()).expect("typing succeeds");
    let metrics = config.signal(Signal::Metrics).expect("metrics declared");
    let reader = metrics.stages().first().expect("one reader");
    assert_eq!(reader.kind(), &StageKind::Periodic);
    assert_eq!(reader.exporter(), "console");
}

#[test]
fn absent_signal_is_not_configured() {
    let config = PipelineConfig::from_tree(kitchen_sink_tree()).expect("typing succeeds");
    assert!(config.signal(Signal::Logs).is_none());
}

#[test]
fn minimal_document_has_defaults() {
    let config = PipelineConfig::from_tree(json!({"scheme_version": "0.1"})).expect("typing");
    assert!(!config.is_disabled());
    assert!(config.resource().attributes().is_empty());
    assert!(config.propagators().is_empty());
    assert!(Signal::ALL.iter().all(|signal| config.signal(*signal).is_none()));
}

#[test]
fn stage_without_exporter_is_rejected() {
    let tree = json!({
        "scheme_version": "0.1",
        "sdk": {"logs": {"log_record_processors": [{"name": "batch", "args": {}}]}}
    });
    let err = PipelineConfig::from_tree(tree).expect_err("missing exporter");
    assert!(matches!(
        err,
        ModelError::MissingExporter {
            signal: Signal::Logs,
            index: 0
        }
    ));
    assert_eq!(err.to_string(), "logs.log_record_processors[0] does not name an exporter");
}

#[rstest]
#[case::missing_version(json!({"sdk": {}}))]
#[case::unknown_section(json!({"scheme_version": "0.1", "sdk": {"tracer": {}}}))]
#[case::wrong_stage_section(
    json!({"scheme_version": "0.1", "sdk": {"traces": {"metric_readers": []}}})
)]
#[case::non_scalar_attribute(
    json!({"scheme_version": "0.1", "sdk": {"resource": {"attributes": {"tags": ["a"]}}}})
)]
fn malformed_shapes_are_rejected(#[case] tree: Value) {
    let err = PipelineConfig::from_tree(tree).expect_err("shape mismatch");
    assert!(matches!(err, ModelError::Shape(_)), "got {err}");
}

#[rstest]
#[case::batch("batch", StageKind::Batch)]
#[case::simple("simple", StageKind::Simple)]
#[case::periodic("periodic", StageKind::Periodic)]
#[case::custom("tail_sampling", StageKind::Custom(String::from("tail_sampling")))]
fn stage_kind_round_trips_through_name(#[case] name: &str, #[case] kind: StageKind) {
    assert_eq!(StageKind::from_name(name), kind);
    assert_eq!(kind.as_str(), name);
}

#[rstest]
#[case::traces(Signal::Traces, "traces", "span_processors")]
#[case::metrics(Signal::Metrics, "metrics", "metric_readers")]
#[case::logs(Signal::Logs, "logs", "log_record_processors")]
fn signal_names(#[case] signal: Signal, #[case] name: &str, #[case] section: &str) {
    assert_eq!(signal.to_string(), name);
    assert_eq!(signal.stage_section(), section);
}

#[test]
fn mistyped_argument_is_reported() {
    let args = ComponentArgs::new().with("max_queue_size", "large");
    let err = args.get_u64("max_queue_size").expect_err("string is not an integer");
    assert!(err.to_string().contains("max_queue_size"));
    assert_eq!(args.get_u64("absent").expect("absent is fine"), None);
}

#[test]
fn span_limits_and_views_are_typed() {
    let tree = json!({
        "scheme_version": "0.1",
        "sdk": {
            "traces": {"span_limits": {"attribute_count_limit": 20, "link_count_limit": 4}},
            "metrics": {
                "views": [{
                    "selector": {"instrument_name": "*.server.duration", "meter_name": "http"},
                    "view": {
                        "name": "latency",
                        "aggregation": {
                            "name": "explicit_bucket_histogram",
                            "args": {"boundaries": [1.0, 5.0]}
                        }
                    }
                }]
            }
        }
    });
    let config = PipelineConfig::from_tree(tree).expect("typing succeeds");

    let limits = config.signal(Signal::Traces).expect("traces").span_limits();
    assert_eq!(limits.attribute_count_limit(), Some(20));
    assert_eq!(limits.link_count_limit(), Some(4));
    assert_eq!(limits.attribute_value_length_limit(), None);

    let views = config.signal(Signal::Metrics).expect("metrics").views();
    let view = views.first().expect("one view");
    assert_eq!(view.selector().instrument_name(), Some("*.server.duration"));
    assert_eq!(view.selector().meter_name(), Some("http"));
    assert_eq!(view.stream().name(), Some("latency"));
    let aggregation = view.stream().aggregation().expect("aggregation");
    assert_eq!(aggregation.name(), "explicit_bucket_histogram");
    assert!(!aggregation.is_drop());
    assert!(aggregation.args().contains_key("boundaries"));
}

#[test]
fn undeclared_limits_are_unbounded() {
    let config = PipelineConfig::from_tree(kitchen_sink_tree()).expect("typing succeeds");
    let traces = config.signal(Signal::Traces).expect("traces");
    assert_eq!(traces.span_limits(), &SpanLimits::new());
    assert!(config.signal(Signal::Metrics).expect("metrics").views().is_empty());
}

#[rstest]
#[case::unknown_limit(
    json!({"scheme_version": "0.1", "sdk": {"traces": {"span_limits": {"attribute_limit": 1}}}})
)]
#[case::views_under_traces(json!({"scheme_version": "0.1", "sdk": {"traces": {"views": []}}}))]
#[case::stage_with_name_and_type(json!({
    "scheme_version": "0.1",
    "sdk": {"traces": {"span_processors": [
        {"name": "batch", "type": "simple", "args": {"exporter": "x"}}
    ]}}
}))]
fn misplaced_sections_are_rejected(#[case] tree: Value) {
    let err = PipelineConfig::from_tree(tree).expect_err("shape mismatch");
    assert!(matches!(err, ModelError::Shape(_)), "got {err}");
}

#[test]
fn well_known_exporter_args_are_typed() {
    let otlp = ComponentArgs::new()
        .with("endpoint", "https://collector:4317")
        .with("headers", json!({"api-key": "1234"}))
        .with("timeout", 10_000)
        .with("temporality_preference", "delta");
    let typed: OtlpExporterArgs = otlp.parse().expect("otlp args");
    assert_eq!(typed.endpoint(), Some("https://collector:4317"));
    assert_eq!(typed.headers().get("api-key").map(String::as_str), Some("1234"));
    assert_eq!(typed.timeout(), Some(std::time::Duration::from_secs(10)));
    assert_eq!(typed.temporality_preference(), Some("delta"));

    let jaeger = ComponentArgs::new().with("agent_host", "localhost").with("agent_port", 6832);
    let typed_jaeger: JaegerExporterArgs = jaeger.parse().expect("jaeger args");
    assert_eq!(typed_jaeger.agent_port(), Some(6832));
    assert_eq!(typed_jaeger.agent_host(), Some("localhost"));
}

#[rstest]
#[case::string_timeout(ComponentArgs::new().with("timeout", "10s"))]
#[case::unknown_argument(ComponentArgs::new().with("compression", "gzip"))]
fn malformed_zipkin_args_are_rejected(#[case] args: ComponentArgs) {
    let err = args.parse::<ZipkinExporterArgs>().expect_err("not zipkin args");
    assert!(matches!(err, FactoryError::MalformedArguments { .. }), "got {err}");
}
