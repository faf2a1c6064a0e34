//! Crate-level tests running documents through the shipped schema contract.

use camino::Utf8PathBuf;
use rstest::{fixture, rstest};

use crate::{
    ConfigLoader, ConfigSource, JsonSchemaValidator, SchemaReference, SchemaValidator,
    ValidationError, YamlConfigLoader,
};

fn workspace_root() -> Utf8PathBuf {
    Utf8PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("../..")
}

#[fixture]
fn contract() -> (JsonSchemaValidator, SchemaReference) {
    let schema = SchemaReference::new(workspace_root().join("schema/schema.json"));
    (JsonSchemaValidator::new(), schema)
}

fn check(
    contract: &(JsonSchemaValidator, SchemaReference),
    yaml: &str,
) -> Result<(), ValidationError> {
    let tree = YamlConfigLoader
        .load(&ConfigSource::from(yaml))
        .expect("fixture decodes");
    contract.0.validate(&tree, &contract.1)
}

/// Renders every violation of a document under `tests/fixtures/documents`,
/// sorted so expectations can be listed in any order.
fn violations_of(contract: &(JsonSchemaValidator, SchemaReference), document: &str) -> Vec<String> {
    let path = Utf8PathBuf::from(env!("CARGO_MANIFEST_DIR"))
        .join("tests/fixtures/documents")
        .join(document);
    let tree = YamlConfigLoader
        .load(&ConfigSource::from_path(path))
        .expect("fixture decodes");
    let mut rendered: Vec<String> = contract
        .0
        .validate(&tree, &contract.1)
        .err()
        .map(|err| err.violations().iter().map(ToString::to_string).collect())
        .unwrap_or_default();
    rendered.sort();
    rendered
}

fn sorted(expected: &[&str]) -> Vec<String> {
    let mut owned: Vec<String> = expected.iter().map(|line| (*line).to_owned()).collect();
    owned.sort();
    owned
}

#[rstest]
fn kitchen_sink_conforms(contract: (JsonSchemaValidator, SchemaReference)) {
    let tree = YamlConfigLoader
        .load(&ConfigSource::from_path(workspace_root().join("config/kitchen-sink.yaml")))
        .expect("kitchen sink decodes");
    contract
        .0
        .validate(&tree, &contract.1)
        .expect("kitchen sink conforms");
}

#[rstest]
fn minimal_document_conforms(contract: (JsonSchemaValidator, SchemaReference)) {
    check(&contract, "scheme_version: \"0.1\"\n").expect("minimal document conforms");
}

#[rstest]
#[case::missing_version(
    "sdk:\n  disabled: true\n",
    "$.scheme_version: is missing but it is required"
)]
#[case::unknown_top_level(
    "scheme_version: \"0.1\"\ntelemetry: {}\n",
    "$.telemetry: is not defined in the schema and the schema does not allow additional properties"
)]
#[case::stage_without_exporter(
    "scheme_version: \"0.1\"\nsdk:\n  traces:\n    span_processors:\n      - name: batch\n        args: {}\n",
    "$.sdk.traces.span_processors[0].args.exporter: is missing but it is required"
)]
#[case::wrong_stage_section(
    "scheme_version: \"0.1\"\nsdk:\n  traces:\n    metric_readers: []\n",
    "$.sdk.traces.metric_readers: is not defined in the schema and the schema does not allow additional properties"
)]
#[case::stage_with_name_and_type(
    "scheme_version: \"0.1\"\nsdk:\n  traces:\n    span_processors:\n      - name: batch\n        type: simple\n        args: {exporter: console}\n",
    "$.sdk.traces.span_processors[0]: must be valid to one and only one schema, but 2 are valid"
)]
#[case::stage_without_name_or_type(
    "scheme_version: \"0.1\"\nsdk:\n  logs:\n    log_record_processors:\n      - args: {exporter: console}\n",
    "$.sdk.logs.log_record_processors[0]: must be valid to one and only one schema, but 0 are valid"
)]
#[case::views_outside_metrics(
    "scheme_version: \"0.1\"\nsdk:\n  traces:\n    views: []\n",
    "$.sdk.traces.views: is not defined in the schema and the schema does not allow additional properties"
)]
#[case::unknown_span_limit(
    "scheme_version: \"0.1\"\nsdk:\n  traces:\n    span_limits:\n      attribute_limit: 1\n",
    "$.sdk.traces.span_limits.attribute_limit: is not defined in the schema and the schema does not allow additional properties"
)]
#[case::view_without_selector(
    "scheme_version: \"0.1\"\nsdk:\n  metrics:\n    views:\n      - view: {name: renamed}\n",
    "$.sdk.metrics.views[0].selector: is missing but it is required"
)]
#[case::unknown_zipkin_argument(
    "scheme_version: \"0.1\"\nsdk:\n  traces:\n    exporters:\n      zipkin: {compression: gzip}\n",
    "$.sdk.traces.exporters.zipkin.compression: is not defined in the schema and the schema does not allow additional properties"
)]
#[case::non_scalar_attribute(
    "scheme_version: \"0.1\"\nsdk:\n  resource:\n    attributes:\n      tags: [a, b]\n",
    "$.sdk.resource.attributes.tags: array found, string or boolean or integer or number expected"
)]
fn nonconforming_documents_are_rejected(
    contract: (JsonSchemaValidator, SchemaReference),
    #[case] yaml: &str,
    #[case] expected: &str,
) {
    let err = check(&contract, yaml).expect_err("document must be rejected");
    let rendered: Vec<String> = err.violations().iter().map(ToString::to_string).collect();
    assert!(
        rendered.iter().any(|line| line == expected),
        "expected {expected:?} in {rendered:?}"
    );
}

#[rstest]
fn document_using_every_typed_section_conforms(contract: (JsonSchemaValidator, SchemaReference)) {
    assert_eq!(violations_of(&contract, "all-fields.yaml"), Vec::<String>::new());
}

#[rstest]
#[case::span_limits("span-limits-invalid-types.yaml", &[
    "$.sdk.traces.span_limits.attribute_count_limit: string found, integer expected",
    "$.sdk.traces.span_limits.attribute_value_length_limit: string found, integer expected",
    "$.sdk.traces.span_limits.attribute_count_per_event_limit: string found, integer expected",
    "$.sdk.traces.span_limits.attribute_count_per_link_limit: string found, integer expected",
    "$.sdk.traces.span_limits.event_count_limit: string found, integer expected",
    "$.sdk.traces.span_limits.link_count_limit: string found, integer expected",
])]
#[case::view_entry("view-invalid-types.yaml", &[
    "$.sdk.metrics.views[0].selector.instrument_name: integer found, string expected",
    "$.sdk.metrics.views[0].selector.instrument_type: integer found, string expected",
    "$.sdk.metrics.views[0].selector.meter_name: integer found, string expected",
    "$.sdk.metrics.views[0].selector.meter_version: integer found, string expected",
    "$.sdk.metrics.views[0].selector.meter_schema_url: integer found, string expected",
    "$.sdk.metrics.views[0].view.name: integer found, string expected",
    "$.sdk.metrics.views[0].view.description: integer found, string expected",
    "$.sdk.metrics.views[0].view.aggregation.name: integer found, string expected",
    "$.sdk.metrics.views[0].view.aggregation.args: integer found, object expected",
])]
#[case::otlp_exporter("otlp-invalid-types.yaml", &[
    "$.sdk.traces.exporters.otlp.endpoint: integer found, string expected",
    "$.sdk.traces.exporters.otlp.insecure: integer found, boolean expected",
    "$.sdk.traces.exporters.otlp.certificate: integer found, string expected",
    "$.sdk.traces.exporters.otlp.client_key: integer found, string expected",
    "$.sdk.traces.exporters.otlp.client_certificate: integer found, string expected",
    "$.sdk.traces.exporters.otlp.headers: integer found, object expected",
    "$.sdk.traces.exporters.otlp.compression: integer found, string expected",
    "$.sdk.traces.exporters.otlp.timeout: string found, integer expected",
    "$.sdk.traces.exporters.otlp.protocol: integer found, string expected",
])]
#[case::zipkin_exporter("zipkin-invalid-types.yaml", &[
    "$.sdk.traces.exporters.zipkin.endpoint: integer found, string expected",
    "$.sdk.traces.exporters.zipkin.timeout: string found, integer expected",
])]
#[case::jaeger_exporter("jaeger-invalid-types.yaml", &[
    "$.sdk.traces.exporters.jaeger.protocol: integer found, string expected",
    "$.sdk.traces.exporters.jaeger.endpoint: integer found, string expected",
    "$.sdk.traces.exporters.jaeger.timeout: string found, integer expected",
    "$.sdk.traces.exporters.jaeger.user: integer found, string expected",
    "$.sdk.traces.exporters.jaeger.agent_host: integer found, string expected",
    "$.sdk.traces.exporters.jaeger.agent_port: string found, integer expected",
])]
fn mistyped_sections_report_every_field(
    contract: (JsonSchemaValidator, SchemaReference),
    #[case] document: &str,
    #[case] expected: &[&str],
) {
    assert_eq!(violations_of(&contract, document), sorted(expected));
}
