//! Unit tests for the JSON schema validator.

use rstest::{fixture, rstest};
use serde_json::{Value, json};

use super::*;

fn fixture_dir() -> Utf8PathBuf {
    Utf8PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("tests/fixtures/schema")
}

#[fixture]
fn validator() -> JsonSchemaValidator {
    JsonSchemaValidator::with_base(fixture_dir())
}

fn violations(validator: &JsonSchemaValidator, instance: &Value) -> Vec<String> {
    match validator.validate(instance, &SchemaReference::new("root.json")) {
        Ok(()) => Vec::new(),
        Err(err) => err.violations().iter().map(ToString::to_string).collect(),
    }
}

// ---------------------------------------------------------------------------
// Conforming documents
// ---------------------------------------------------------------------------

#[rstest]
fn accepts_conforming_document(validator: JsonSchemaValidator) {
    let instance = json!({
        "name": "checkout",
        "mode": "fast",
        "count": 3,
        "labels": {"team": "payments"},
        "child": {"enabled": true, "sibling": 8080},
        "items": [{"id": "a"}, {"id": 7}]
    });
    assert_eq!(violations(&validator, &instance), Vec::<String>::new());
}

// ---------------------------------------------------------------------------
// Violations
// ---------------------------------------------------------------------------

#[rstest]
#[case::missing_required(json!({}), "$.name: is missing but it is required")]
#[case::wrong_type(json!({"name": 5}), "$.name: integer found, string expected")]
#[case::empty_string(json!({"name": ""}), "$.name: must be at least 1 characters long")]
#[case::unknown_field(
    json!({"name": "x", "extra": 1}),
    "$.extra: is not defined in the schema and the schema does not allow additional properties"
)]
#[case::enumeration(
    json!({"name": "x", "mode": "medium"}),
    "$.mode: does not have a value in the enumeration [\"fast\", \"slow\"]"
)]
#[case::minimum(json!({"name": "x", "count": 0}), "$.count: must have a minimum value of 1")]
#[case::additional_schema(
    json!({"name": "x", "labels": {"team": 1}}),
    "$.labels.team: integer found, string expected"
)]
#[case::empty_array(
    json!({"name": "x", "items": []}),
    "$.items: expected at least 1 items but found 0"
)]
#[case::local_ref(
    json!({"name": "x", "items": [{"id": "a"}, {}]}),
    "$.items[1].id: is missing but it is required"
)]
#[case::any_of(
    json!({"name": "x", "items": [{"id": true}]}),
    "$.items[0].id: does not match any of the allowed alternatives"
)]
fn reports_path_qualified_violation(
    validator: JsonSchemaValidator,
    #[case] instance: Value,
    #[case] expected: &str,
) {
    assert_eq!(violations(&validator, &instance), vec![expected.to_owned()]);
}

#[rstest]
fn collects_every_violation(validator: JsonSchemaValidator) {
    let instance = json!({"count": "many", "mode": "medium"});
    let found = violations(&validator, &instance);
    assert_eq!(found.len(), 3, "unexpected violations: {found:?}");
    assert!(found.contains(&String::from("$.name: is missing but it is required")));
    assert!(found.contains(&String::from("$.count: string found, integer expected")));
}

// ---------------------------------------------------------------------------
// Draft-07 assertion keywords
// ---------------------------------------------------------------------------

fn keyword_violations(validator: &JsonSchemaValidator, instance: &Value) -> Vec<String> {
    match validator.validate(instance, &SchemaReference::new("keywords.json")) {
        Ok(()) => Vec::new(),
        Err(err) => err.violations().iter().map(ToString::to_string).collect(),
    }
}

#[rstest]
fn accepts_document_satisfying_every_keyword(validator: JsonSchemaValidator) {
    let instance = json!({
        "port": 8080,
        "ratio": 0.5,
        "step": 10,
        "endpoint": "https://collector:4318",
        "stage": {"name": "batch"},
        "reserved": "public",
        "tags": ["primary", "canary"],
        "pair": ["grpc", 4317],
        "headers": {"x-team": "obs"},
        "transport": {"kind": "tls", "certificate": "ca.pem"},
        "credentials": {"user": "otel", "password": "secret"}
    });
    assert_eq!(keyword_violations(&validator, &instance), Vec::<String>::new());
}

#[rstest]
#[case::maximum(json!({"port": 70000}), "$.port: must have a maximum value of 65535")]
#[case::exclusive_maximum(
    json!({"ratio": 1}),
    "$.ratio: must have an exclusive maximum value of 1"
)]
#[case::exclusive_minimum(
    json!({"ratio": 0}),
    "$.ratio: must have an exclusive minimum value of 0"
)]
#[case::multiple_of(json!({"step": 7}), "$.step: must be multiple of 5")]
#[case::pattern(
    json!({"endpoint": "ftp://collector"}),
    "$.endpoint: does not match the regex pattern ^https?://"
)]
#[case::max_length(
    json!({"endpoint": "https://a-very-long-collector-host.example"}),
    "$.endpoint: must be at most 32 characters long"
)]
#[case::one_of_both(
    json!({"stage": {"name": "batch", "type": "batch"}}),
    "$.stage: must be valid to one and only one schema, but 2 are valid"
)]
#[case::one_of_neither(
    json!({"stage": {}}),
    "$.stage: must be valid to one and only one schema, but 0 are valid"
)]
#[case::not(
    json!({"reserved": "internal"}),
    "$.reserved: must not be valid to the excluded schema"
)]
#[case::unique_items(
    json!({"tags": ["primary", "primary"]}),
    "$.tags: must have only unique items in the array"
)]
#[case::contains(
    json!({"tags": ["canary"]}),
    "$.tags: does not contain an item matching the required schema"
)]
#[case::max_items(
    json!({"tags": ["primary", "a", "b", "c"]}),
    "$.tags: must have at most 3 items but found 4"
)]
#[case::additional_items(
    json!({"pair": ["grpc", 4317, true]}),
    "$.pair[2]: no value is allowed here"
)]
#[case::positional_items(json!({"pair": [4317]}), "$.pair[0]: integer found, string expected")]
#[case::pattern_properties(
    json!({"headers": {"x-team": 1}}),
    "$.headers.x-team: integer found, string expected"
)]
#[case::unmatched_pattern(
    json!({"headers": {"team": "obs"}}),
    "$.headers.team: is not defined in the schema and the schema does not allow additional properties"
)]
#[case::property_names(
    json!({"headers": {"x-correlation": "1"}}),
    "$.headers.x-correlation: property name 'x-correlation' is not allowed"
)]
#[case::max_properties(
    json!({"headers": {"x-a": "1", "x-b": "2", "x-c": "3"}}),
    "$.headers: must have at most 2 properties"
)]
#[case::if_then(
    json!({"transport": {"kind": "tls"}}),
    "$.transport.certificate: is missing but it is required"
)]
#[case::if_else(
    json!({"transport": {"kind": "plain", "certificate": "ca.pem"}}),
    "$.transport: must not be valid to the excluded schema"
)]
#[case::dependencies(
    json!({"credentials": {"user": "otel"}}),
    "$.credentials: must have property 'password' when property 'user' is present"
)]
#[case::min_properties(
    json!({"credentials": {}}),
    "$.credentials: must have at least 1 properties"
)]
fn reports_draft_07_keyword_violation(
    validator: JsonSchemaValidator,
    #[case] instance: Value,
    #[case] expected: &str,
) {
    assert_eq!(keyword_violations(&validator, &instance), vec![expected.to_owned()]);
}

// ---------------------------------------------------------------------------
// Schema audit
// ---------------------------------------------------------------------------

#[rstest]
#[case::unknown_keyword("unsupported.json", "keyword 'unevaluatedProperties' is not supported")]
#[case::keyword_in_referenced_file(
    "refers_unsupported.json",
    "unsupported.json#/unevaluatedProperties"
)]
#[case::invalid_pattern("bad_pattern.json", "#/pattern: invalid regex pattern (unclosed")]
#[case::dangling_reference("dangling.json", "reference '#/definitions/missing' points to nothing")]
#[case::malformed_keyword("malformed.json", "#/minLength: must be a non-negative integer")]
fn unusable_schema_is_unavailable(
    validator: JsonSchemaValidator,
    #[case] schema: &str,
    #[case] expected: &str,
) {
    let err = validator
        .validate(&json!("anything"), &SchemaReference::new(schema))
        .expect_err("schema must be refused");
    let ValidationError::SchemaUnavailable { message, .. } = err else {
        panic!("expected an unavailable schema, got {err}");
    };
    assert!(message.contains(expected), "message: {message}");
}

// ---------------------------------------------------------------------------
// Relative references
// ---------------------------------------------------------------------------

#[rstest]
fn resolves_reference_relative_to_referencing_file(validator: JsonSchemaValidator) {
    let instance = json!({"name": "x", "child": {}});
    assert_eq!(
        violations(&validator, &instance),
        vec![String::from("$.child.enabled: is missing but it is required")]
    );
}

#[rstest]
fn resolves_parent_directory_reference_with_fragment(validator: JsonSchemaValidator) {
    let instance = json!({"name": "x", "child": {"enabled": false, "sibling": "http"}});
    assert_eq!(
        violations(&validator, &instance),
        vec![String::from("$.child.sibling: string found, integer expected")]
    );
}

#[rstest]
fn reference_cycles_terminate(validator: JsonSchemaValidator) {
    let err = validator
        .validate(&json!({}), &SchemaReference::new("cycle.json"))
        .expect_err("cycle must be reported");
    assert!(
        err.violations()
            .iter()
            .any(|violation| violation.message().contains("nests too deeply")),
        "got {err}"
    );
}

// ---------------------------------------------------------------------------
// Schema availability
// ---------------------------------------------------------------------------

#[rstest]
fn missing_root_schema_is_unavailable(validator: JsonSchemaValidator) {
    let err = validator
        .validate(&json!({}), &SchemaReference::new("absent.json"))
        .expect_err("missing schema");
    assert!(matches!(err, ValidationError::SchemaUnavailable { .. }));
}

#[test]
fn reference_resolution_normalises_relative_location() {
    let reference = SchemaReference::default();
    assert_eq!(reference.location(), Utf8Path::new(DEFAULT_SCHEMA_LOCATION));
    assert_eq!(
        reference.resolve_against(Utf8Path::new("/srv/telconf/bin")),
        Utf8PathBuf::from("/srv/telconf/schema/schema.json")
    );
}

#[test]
fn absolute_reference_ignores_base() {
    let reference = SchemaReference::new("/opt/schema.json");
    assert_eq!(
        reference.resolve_against(Utf8Path::new("/srv")),
        Utf8PathBuf::from("/opt/schema.json")
    );
}
