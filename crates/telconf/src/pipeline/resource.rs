//! Process resource attached to every provider.

use crate::error::ResourceError;
use crate::model::{AttributeValue, Attributes, ResourceSpec};

/// Identifying attributes of the process.
///
/// Attributes are taken from the configuration unmodified; nothing is
/// detected from the environment.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Resource {
    attributes: Attributes,
}

impl Resource {
    /// Creates a resource from an attribute map.
    ///
    /// # Errors
    ///
    /// Returns [`ResourceError::EmptyKey`] when an attribute key is blank.
    pub fn new(attributes: Attributes) -> Result<Self, ResourceError> {
        if attributes.keys().any(|key| key.trim().is_empty()) {
            return Err(ResourceError::EmptyKey);
        }
        Ok(Self { attributes })
    }

    /// Creates a resource from its configured specification.
    ///
    /// # Errors
    ///
    /// Returns [`ResourceError::EmptyKey`] when an attribute key is blank.
    pub fn from_spec(spec: &ResourceSpec) -> Result<Self, ResourceError> {
        Self::new(spec.attributes().clone())
    }

    /// Returns a resource with no attributes.
    #[must_use]
    pub const fn empty() -> Self {
        Self {
            attributes: Attributes::new(),
        }
    }

    /// Returns the attributes.
    #[must_use]
    pub const fn attributes(&self) -> &Attributes {
        &self.attributes
    }

    /// Returns one attribute.
    #[must_use]
    pub fn get(&self, key: &str) -> Option<&AttributeValue> {
        self.attributes.get(key)
    }
}
