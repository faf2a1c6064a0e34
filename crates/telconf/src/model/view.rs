//! Metric views: selectors choosing instruments and the stream they
//! produce instead.

use serde::{Deserialize, Serialize};

use super::ComponentArgs;

/// Aggregation name that discards every matching measurement.
pub const DROP_AGGREGATION: &str = "drop";

/// A registered view: which instruments it applies to and what it changes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ViewSpec {
    selector: ViewSelector,
    view: ViewStream,
}

impl ViewSpec {
    /// Creates a view.
    #[must_use]
    pub const fn new(selector: ViewSelector, view: ViewStream) -> Self {
        Self { selector, view }
    }

    /// Returns the instrument selector.
    #[must_use]
    pub const fn selector(&self) -> &ViewSelector {
        &self.selector
    }

    /// Returns the stream configuration applied to selected instruments.
    #[must_use]
    pub const fn stream(&self) -> &ViewStream {
        &self.view
    }
}

/// Criteria an instrument must meet for a view to apply.
///
/// Absent criteria match anything. `instrument_name` may use `*` for any
/// run of characters and `?` for exactly one.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ViewSelector {
    instrument_name: Option<String>,
    instrument_type: Option<String>,
    meter_name: Option<String>,
    meter_version: Option<String>,
    meter_schema_url: Option<String>,
}

impl ViewSelector {
    /// Selects instruments whose name matches `pattern`.
    #[must_use]
    pub fn instrument(pattern: impl Into<String>) -> Self {
        Self {
            instrument_name: Some(pattern.into()),
            ..Self::default()
        }
    }

    /// Additionally requires the instrument type.
    #[must_use]
    pub fn with_instrument_type(mut self, kind: impl Into<String>) -> Self {
        self.instrument_type = Some(kind.into());
        self
    }

    /// Additionally requires the name of the meter owning the instrument.
    #[must_use]
    pub fn with_meter_name(mut self, name: impl Into<String>) -> Self {
        self.meter_name = Some(name.into());
        self
    }

    /// Instrument name pattern.
    #[must_use]
    pub fn instrument_name(&self) -> Option<&str> {
        self.instrument_name.as_deref()
    }

    /// Instrument type, such as `counter` or `histogram`.
    #[must_use]
    pub fn instrument_type(&self) -> Option<&str> {
        self.instrument_type.as_deref()
    }

    /// Meter name.
    #[must_use]
    pub fn meter_name(&self) -> Option<&str> {
        self.meter_name.as_deref()
    }

    /// Meter version.
    #[must_use]
    pub fn meter_version(&self) -> Option<&str> {
        self.meter_version.as_deref()
    }

    /// Meter schema URL.
    #[must_use]
    pub fn meter_schema_url(&self) -> Option<&str> {
        self.meter_schema_url.as_deref()
    }
}

/// The stream a view produces for the instruments it selects.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ViewStream {
    name: Option<String>,
    description: Option<String>,
    aggregation: Option<Aggregation>,
}

impl ViewStream {
    /// Renames the selected instruments.
    #[must_use]
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    /// Replaces the instrument description.
    #[must_use]
    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    /// Sets the aggregation.
    #[must_use]
    pub fn with_aggregation(mut self, aggregation: Aggregation) -> Self {
        self.aggregation = Some(aggregation);
        self
    }

    /// Replacement instrument name.
    #[must_use]
    pub fn name(&self) -> Option<&str> {
        self.name.as_deref()
    }

    /// Replacement description.
    #[must_use]
    pub fn description(&self) -> Option<&str> {
        self.description.as_deref()
    }

    /// Aggregation of the produced stream.
    #[must_use]
    pub const fn aggregation(&self) -> Option<&Aggregation> {
        self.aggregation.as_ref()
    }
}

/// A named aggregation with its arguments.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Aggregation {
    name: String,
    #[serde(default)]
    args: ComponentArgs,
}

impl Aggregation {
    /// Creates an aggregation.
    #[must_use]
    pub fn new(name: impl Into<String>, args: ComponentArgs) -> Self {
        Self {
            name: name.into(),
            args,
        }
    }

    /// Aggregation name, such as `sum` or `explicit_bucket_histogram`.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Aggregation arguments.
    #[must_use]
    pub const fn args(&self) -> &ComponentArgs {
        &self.args
    }

    /// Returns `true` when the aggregation discards measurements.
    #[must_use]
    pub fn is_drop(&self) -> bool {
        self.name == DROP_AGGREGATION
    }
}
