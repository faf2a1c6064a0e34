//! Keyword arguments handed verbatim to component factories.

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::error::FactoryError;

/// Keyword arguments for one exporter or pipeline stage.
///
/// Keys and values are passed to factories exactly as they appeared in the
/// document. The typed accessors report a present-but-mistyped argument as a
/// [`FactoryError::InvalidArgument`] so factories can reject it.
///
/// # Example
///
/// ```
/// use serde_json::json;
/// use telconf::ComponentArgs;
///
/// let args: ComponentArgs = [
///     (String::from("endpoint"), json!("http://localhost:9411")),
///     (String::from("timeout"), json!(10_000)),
/// ]
/// .into_iter()
/// .collect();
/// assert_eq!(args.get_str("endpoint").unwrap(), Some("http://localhost:9411"));
/// assert_eq!(args.get_u64("timeout").unwrap(), Some(10_000));
/// ```
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ComponentArgs(Map<String, Value>);

impl ComponentArgs {
    /// Creates an empty argument map.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds or replaces an argument, returning the updated map.
    #[must_use]
    pub fn with(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.0.insert(key.into(), value.into());
        self
    }

    /// Returns the raw value of an argument.
    #[must_use]
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.0.get(key)
    }

    /// Returns a string argument.
    ///
    /// # Errors
    ///
    /// Returns [`FactoryError::InvalidArgument`] when the argument is present
    /// but not a string.
    pub fn get_str(&self, key: &str) -> Result<Option<&str>, FactoryError> {
        self.0.get(key).map_or(Ok(None), |value| {
            value
                .as_str()
                .map(Some)
                .ok_or_else(|| FactoryError::invalid_argument(key, "must be a string"))
        })
    }

    /// Returns a non-negative integer argument.
    ///
    /// # Errors
    ///
    /// Returns [`FactoryError::InvalidArgument`] when the argument is present
    /// but not a non-negative integer.
    pub fn get_u64(&self, key: &str) -> Result<Option<u64>, FactoryError> {
        self.0.get(key).map_or(Ok(None), |value| {
            value.as_u64().map(Some).ok_or_else(|| {
                FactoryError::invalid_argument(key, "must be a non-negative integer")
            })
        })
    }

    /// Types the whole map as `T`, such as one of the well-known exporter
    /// argument sets.
    ///
    /// # Errors
    ///
    /// Returns [`FactoryError::MalformedArguments`] when the map does not
    /// have the shape of `T`.
    pub fn parse<T: DeserializeOwned>(&self) -> Result<T, FactoryError> {
        serde_json::from_value(Value::Object(self.0.clone())).map_err(|error| {
            FactoryError::MalformedArguments {
                reason: error.to_string(),
            }
        })
    }

    /// Returns `true` when the argument is present.
    #[must_use]
    pub fn contains_key(&self, key: &str) -> bool {
        self.0.contains_key(key)
    }

    /// Iterates over the arguments in key order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &Value)> {
        self.0.iter().map(|(key, value)| (key.as_str(), value))
    }

    /// Returns the number of arguments.
    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Returns `true` when there are no arguments.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl FromIterator<(String, Value)> for ComponentArgs {
    fn from_iter<I: IntoIterator<Item = (String, Value)>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}

impl From<Map<String, Value>> for ComponentArgs {
    fn from(map: Map<String, Value>) -> Self {
        Self(map)
    }
}
