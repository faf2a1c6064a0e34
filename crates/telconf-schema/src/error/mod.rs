//! Errors raised while decoding or validating configuration documents.
//!
//! Both error families are `thiserror` enums carrying structured context so
//! the fail-soft boundary in `telconf` can log them without string parsing.
//! I/O errors are wrapped in `Arc` so the enums stay `Clone`.

use std::fmt;
use std::sync::Arc;

use camino::Utf8PathBuf;
use thiserror::Error;

/// Failures turning raw bytes into a generic configuration tree.
#[derive(Debug, Clone, Error)]
pub enum DecodeError {
    /// The configuration file could not be read.
    #[error("failed to read configuration '{path}': {source}")]
    Read {
        /// Path that was read.
        path: Utf8PathBuf,
        /// Underlying I/O error.
        #[source]
        source: Arc<std::io::Error>,
    },

    /// The document is not valid UTF-8.
    #[error("configuration is not valid UTF-8: {message}")]
    Encoding {
        /// Description of the invalid byte sequence.
        message: String,
    },

    /// The document is not well-formed YAML or JSON.
    #[error("malformed configuration document: {message}")]
    Syntax {
        /// Parser message, including the location when available.
        message: String,
    },
}

impl DecodeError {
    /// Creates a new `Read` error.
    #[must_use]
    pub fn read(path: impl Into<Utf8PathBuf>, source: std::io::Error) -> Self {
        Self::Read {
            path: path.into(),
            source: Arc::new(source),
        }
    }
}

/// A single schema violation qualified by the instance path it applies to.
///
/// Paths use the `$.a.b[0]` notation, so a violation renders as
/// `$.sdk.traces.span_processors[0].args.exporter: integer found, string expected`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Violation {
    path: String,
    message: String,
}

impl Violation {
    /// Creates a violation for the given instance path.
    #[must_use]
    pub fn new(path: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            message: message.into(),
        }
    }

    /// Returns the instance path the violation applies to.
    #[must_use]
    pub fn path(&self) -> &str {
        &self.path
    }

    /// Returns the human-readable description.
    #[must_use]
    pub fn message(&self) -> &str {
        &self.message
    }
}

impl fmt::Display for Violation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.path, self.message)
    }
}

fn violation_summary(violations: &[Violation]) -> String {
    match violations {
        [] => String::from("document failed schema validation"),
        [only] => format!("schema violation: {only}"),
        [first, rest @ ..] => format!("schema violation: {first} (and {} more)", rest.len()),
    }
}

/// Failures checking a configuration tree against the schema contract.
#[derive(Debug, Clone, Error)]
pub enum ValidationError {
    /// The root schema could not be loaded.
    #[error("schema '{location}' is unavailable: {message}")]
    SchemaUnavailable {
        /// Resolved location of the schema file.
        location: Utf8PathBuf,
        /// Reason the schema could not be used.
        message: String,
    },

    /// The document does not conform to the schema.
    #[error("{}", violation_summary(.0))]
    Violations(Vec<Violation>),
}

impl ValidationError {
    /// Returns the violations carried by this error, if any.
    #[must_use]
    pub fn violations(&self) -> &[Violation] {
        match self {
            Self::Violations(violations) => violations,
            Self::SchemaUnavailable { .. } => &[],
        }
    }
}
