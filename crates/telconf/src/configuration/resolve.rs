//! Entry functions turning a document into a [`Configuration`].
//!
//! The pipeline is decode, then validate, then type. The `try_*` variants
//! return the failure; the plain variants log it and fall back to the inert
//! configuration, so telemetry misconfiguration never stops the host.

use tracing::{debug, error};

use telconf_schema::{
    ConfigLoader, ConfigSource, JsonSchemaValidator, SchemaReference, SchemaValidator,
    ValidationError, YamlConfigLoader,
};

use super::Configuration;
use crate::error::ResolveError;
use crate::model::PipelineConfig;

/// Resolves a document with the bundled loader and validator.
///
/// Relative schema references resolve against the current directory.
/// Failures are logged at error level and yield the inert configuration.
///
/// # Example
///
/// ```no_run
/// use telconf::{ConfigSource, SchemaReference, resolve_configuration};
///
/// let configuration = resolve_configuration(
///     &ConfigSource::from_path("otel.yaml"),
///     &SchemaReference::new("schema/schema.json"),
/// );
/// let report = configuration.apply_global();
/// assert!(report.failures().is_empty());
/// ```
#[must_use]
pub fn resolve_configuration(source: &ConfigSource, schema: &SchemaReference) -> Configuration {
    resolve_configuration_with(&YamlConfigLoader, &JsonSchemaValidator::new(), source, schema)
}

/// Resolves a document with the bundled loader and validator, returning
/// the failure.
///
/// # Errors
///
/// Returns a [`ResolveError`] when decoding, validation, or typing fails.
pub fn try_resolve_configuration(
    source: &ConfigSource,
    schema: &SchemaReference,
) -> Result<PipelineConfig, ResolveError> {
    try_resolve_configuration_with(&YamlConfigLoader, &JsonSchemaValidator::new(), source, schema)
}

/// Resolves a document with injected collaborators.
///
/// Failures are logged at error level and yield the inert configuration.
#[must_use]
pub fn resolve_configuration_with<L, V>(
    loader: &L,
    validator: &V,
    source: &ConfigSource,
    schema: &SchemaReference,
) -> Configuration
where
    L: ConfigLoader + ?Sized,
    V: SchemaValidator + ?Sized,
{
    match try_resolve_configuration_with(loader, validator, source, schema) {
        Ok(pipeline) => Configuration::configured(pipeline),
        Err(failure) => {
            log_failure(source, &failure);
            Configuration::inert()
        }
    }
}

/// Resolves a document with injected collaborators, returning the failure.
///
/// # Errors
///
/// Returns a [`ResolveError`] when decoding, validation, or typing fails.
pub fn try_resolve_configuration_with<L, V>(
    loader: &L,
    validator: &V,
    source: &ConfigSource,
    schema: &SchemaReference,
) -> Result<PipelineConfig, ResolveError>
where
    L: ConfigLoader + ?Sized,
    V: SchemaValidator + ?Sized,
{
    let tree = loader.load(source)?;
    validator.validate(&tree, schema)?;
    let pipeline = PipelineConfig::from_tree(tree)?;
    debug!(
        scheme_version = pipeline.scheme_version(),
        disabled = pipeline.is_disabled(),
        "resolved telemetry configuration"
    );
    Ok(pipeline)
}

fn log_failure(source: &ConfigSource, failure: &ResolveError) {
    let origin = source.path().map_or("<memory>", |path| path.as_str());
    match failure {
        ResolveError::Validation(ValidationError::Violations(violations)) => {
            for violation in violations {
                error!(source = origin, %violation, "configuration violates schema");
            }
        }
        ResolveError::Decode(cause) => {
            error!(source = origin, %cause, "failed to decode configuration");
        }
        ResolveError::Validation(cause) => {
            error!(source = origin, %cause, "failed to validate configuration");
        }
        ResolveError::Typing(cause) => {
            error!(source = origin, %cause, "configuration violates schema");
        }
    }
    error!(source = origin, "telemetry configuration is inert");
}
