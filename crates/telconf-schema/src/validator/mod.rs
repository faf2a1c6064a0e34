//! Schema validation of decoded configuration trees.
//!
//! A [`SchemaReference`] names the root schema file. The
//! [`JsonSchemaValidator`] resolves it against a base directory, then
//! evaluates the tree. Every `$ref` inside a schema file is resolved against
//! the directory of that file, so a contract may be split across several
//! documents linked by relative paths.

mod audit;
mod keywords;
mod store;

use camino::{Utf8Path, Utf8PathBuf};
use serde_json::Value;
use tracing::debug;

use crate::error::ValidationError;

use self::keywords::Pass;
use self::store::{SchemaStore, normalise};

/// Location of the schema used when none is supplied.
pub const DEFAULT_SCHEMA_LOCATION: &str = "../schema/schema.json";

/// Reference to the root schema document.
///
/// Relative references are resolved against the base directory of the
/// validator that consumes them.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SchemaReference {
    location: Utf8PathBuf,
}

impl SchemaReference {
    /// Creates a reference to the schema at `location`.
    #[must_use]
    pub fn new(location: impl Into<Utf8PathBuf>) -> Self {
        Self {
            location: location.into(),
        }
    }

    /// Returns the location as written.
    #[must_use]
    pub fn location(&self) -> &Utf8Path {
        &self.location
    }

    /// Resolves the reference against `base`, normalising `.` and `..`.
    #[must_use]
    pub fn resolve_against(&self, base: &Utf8Path) -> Utf8PathBuf {
        if self.location.is_absolute() {
            normalise(&self.location)
        } else {
            normalise(&base.join(&self.location))
        }
    }
}

impl Default for SchemaReference {
    fn default() -> Self {
        Self::new(DEFAULT_SCHEMA_LOCATION)
    }
}

/// Checks a generic configuration tree against a schema.
pub trait SchemaValidator {
    /// Validates `instance` against the schema named by `schema`.
    ///
    /// # Errors
    ///
    /// Returns [`ValidationError::SchemaUnavailable`] when the schema cannot
    /// be loaded or uses keywords the validator does not evaluate, and
    /// [`ValidationError::Violations`] listing every path-qualified
    /// violation when the instance does not conform.
    fn validate(&self, instance: &Value, schema: &SchemaReference) -> Result<(), ValidationError>;
}

/// File-backed JSON Schema draft-07 validator.
///
/// Every assertion keyword of draft-07 is evaluated; `format` and the
/// content keywords are treated as annotations. Patterns use the syntax of
/// the `regex` crate, so look-around and backreferences are rejected.
///
/// Before an instance is evaluated the root schema and every document it
/// references are loaded and audited. A keyword outside the draft-07
/// vocabulary, a malformed keyword value, an invalid pattern or a dangling
/// `$ref` yields [`ValidationError::SchemaUnavailable`] instead of a schema
/// that silently checks less than it declares.
#[derive(Debug, Clone, Default)]
pub struct JsonSchemaValidator {
    base: Option<Utf8PathBuf>,
}

impl JsonSchemaValidator {
    /// Creates a validator resolving relative references against the
    /// current working directory.
    #[must_use]
    pub const fn new() -> Self {
        Self { base: None }
    }

    /// Creates a validator resolving relative references against `base`.
    #[must_use]
    pub fn with_base(base: impl Into<Utf8PathBuf>) -> Self {
        Self {
            base: Some(base.into()),
        }
    }

    fn base_directory(&self) -> Result<Utf8PathBuf, String> {
        if let Some(base) = &self.base {
            return Ok(base.clone());
        }
        let cwd = std::env::current_dir().map_err(|error| error.to_string())?;
        Utf8PathBuf::from_path_buf(cwd)
            .map_err(|path| format!("working directory '{}' is not UTF-8", path.display()))
    }
}

impl SchemaValidator for JsonSchemaValidator {
    fn validate(&self, instance: &Value, schema: &SchemaReference) -> Result<(), ValidationError> {
        let base = self
            .base_directory()
            .map_err(|message| ValidationError::SchemaUnavailable {
                location: schema.location().to_path_buf(),
                message,
            })?;
        let location = schema.resolve_against(&base);
        debug!(schema = %location, "validating configuration");

        let mut store = SchemaStore::default();
        let unavailable = |message| ValidationError::SchemaUnavailable {
            location: location.clone(),
            message,
        };
        let root = store.load(&location).map_err(unavailable)?;
        audit::audit(&mut store, &root).map_err(unavailable)?;

        let violations = Pass::new(store).run(&root, instance);
        if violations.is_empty() {
            Ok(())
        } else {
            Err(ValidationError::Violations(violations))
        }
    }
}

#[cfg(test)]
mod tests;
