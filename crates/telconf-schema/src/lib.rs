//! Decoding and schema validation for telemetry configuration documents.
//!
//! This crate owns the two collaborators that sit in front of the pipeline
//! configurator: the [`ConfigLoader`], which turns raw YAML or JSON into a
//! generic [`serde_json::Value`] tree, and the [`SchemaValidator`], which
//! checks that tree against a JSON schema contract before anything downstream
//! trusts it.
//!
//! The bundled [`JsonSchemaValidator`] evaluates JSON Schema draft-07,
//! including relative `$ref` links that are resolved against the directory
//! of the schema file that declares them. Schemas using keywords it does not
//! evaluate are refused rather than partially applied.
//!
//! # Example
//!
//! ```no_run
//! use telconf_schema::{
//!     ConfigLoader, ConfigSource, JsonSchemaValidator, SchemaReference, SchemaValidator,
//!     YamlConfigLoader,
//! };
//!
//! let tree = YamlConfigLoader
//!     .load(&ConfigSource::from_path("otel.yaml"))
//!     .expect("document decodes");
//! let validator = JsonSchemaValidator::with_base("/etc/telconf");
//! validator
//!     .validate(&tree, &SchemaReference::default())
//!     .expect("document conforms");
//! ```

pub mod error;
pub mod loader;
pub mod validator;

#[cfg(test)]
mod tests;

pub use self::error::{DecodeError, ValidationError, Violation};
pub use self::loader::{ConfigLoader, ConfigSource, YamlConfigLoader};
pub use self::validator::{
    DEFAULT_SCHEMA_LOCATION, JsonSchemaValidator, SchemaReference, SchemaValidator,
};
