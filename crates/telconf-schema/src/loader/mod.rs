//! Decoding of raw configuration documents into a generic tree.
//!
//! JSON is a subset of YAML, so a single YAML decoder handles both formats.
//! The decoded tree is a [`serde_json::Value`]; it carries no typing beyond
//! maps, lists and scalars until the schema has accepted it.

use camino::{Utf8Path, Utf8PathBuf};
use serde_json::Value;
use tracing::debug;

use crate::error::DecodeError;

/// Where a configuration document comes from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfigSource {
    /// A document stored on disk.
    Path(Utf8PathBuf),
    /// A document already held in memory.
    Bytes(Vec<u8>),
}

impl ConfigSource {
    /// Creates a source backed by a file path.
    #[must_use]
    pub fn from_path(path: impl Into<Utf8PathBuf>) -> Self {
        Self::Path(path.into())
    }

    /// Creates a source backed by in-memory bytes.
    #[must_use]
    pub fn from_bytes(bytes: impl Into<Vec<u8>>) -> Self {
        Self::Bytes(bytes.into())
    }

    /// Returns the backing path, if any.
    #[must_use]
    pub fn path(&self) -> Option<&Utf8Path> {
        match self {
            Self::Path(path) => Some(path.as_path()),
            Self::Bytes(_) => None,
        }
    }
}

impl From<&str> for ConfigSource {
    fn from(text: &str) -> Self {
        Self::Bytes(text.as_bytes().to_vec())
    }
}

/// Decodes a configuration source into a generic tree.
///
/// Implementations must not interpret the tree; typing happens only after
/// schema validation succeeds.
pub trait ConfigLoader {
    /// Reads and decodes `source`.
    ///
    /// # Errors
    ///
    /// Returns a [`DecodeError`] when the source cannot be read or is not a
    /// well-formed document.
    fn load(&self, source: &ConfigSource) -> Result<Value, DecodeError>;
}

/// [`ConfigLoader`] accepting YAML and JSON documents.
#[derive(Debug, Clone, Copy, Default)]
pub struct YamlConfigLoader;

impl YamlConfigLoader {
    fn decode(text: &str) -> Result<Value, DecodeError> {
        serde_saphyr::from_str::<Value>(text).map_err(|error| DecodeError::Syntax {
            message: error.to_string(),
        })
    }
}

impl ConfigLoader for YamlConfigLoader {
    fn load(&self, source: &ConfigSource) -> Result<Value, DecodeError> {
        match source {
            ConfigSource::Path(path) => {
                debug!(path = %path, "loading configuration file");
                let text = std::fs::read_to_string(path)
                    .map_err(|error| DecodeError::read(path.clone(), error))?;
                Self::decode(&text)
            }
            ConfigSource::Bytes(bytes) => {
                let text = std::str::from_utf8(bytes).map_err(|error| DecodeError::Encoding {
                    message: error.to_string(),
                })?;
                Self::decode(text)
            }
        }
    }
}
