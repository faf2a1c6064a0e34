//! Typed configuration model.
//!
//! A [`PipelineConfig`] is produced only from a tree that has already passed
//! schema validation. Typing is strict: unknown fields are rejected, so a
//! document that slips past a permissive schema still cannot smuggle
//! unexpected sections into the pipeline.

mod args;
mod document;
mod exporter;
mod limits;
mod view;

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;

pub use self::args::ComponentArgs;
pub use self::exporter::{JaegerExporterArgs, OtlpExporterArgs, ZipkinExporterArgs};
pub use self::limits::SpanLimits;
pub use self::view::{Aggregation, DROP_AGGREGATION, ViewSelector, ViewSpec, ViewStream};

/// An independent telemetry data category with its own pipeline.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Signal {
    /// Distributed traces.
    Traces,
    /// Metric streams.
    Metrics,
    /// Log records.
    Logs,
}

impl Signal {
    /// Every signal, in installation order.
    pub const ALL: [Self; 3] = [Self::Traces, Self::Metrics, Self::Logs];

    /// Returns the canonical name, matching the document section.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Traces => "traces",
            Self::Metrics => "metrics",
            Self::Logs => "logs",
        }
    }

    /// Returns the document key listing this signal's pipeline stages.
    #[must_use]
    pub const fn stage_section(self) -> &'static str {
        match self {
            Self::Traces => "span_processors",
            Self::Metrics => "metric_readers",
            Self::Logs => "log_record_processors",
        }
    }
}

impl fmt::Display for Signal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The part a component plays in a signal pipeline.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Role {
    /// A sink sending signal data to an external destination.
    Exporter,
    /// A processor or reader feeding an exporter.
    Stage,
}

impl Role {
    /// Returns the canonical name.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Exporter => "exporter",
            Self::Stage => "stage",
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A scalar attribute value.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum AttributeValue {
    /// Boolean attribute.
    Bool(bool),
    /// Signed integer attribute.
    Int(i64),
    /// Floating point attribute.
    Double(f64),
    /// String attribute.
    String(String),
}

impl From<&str> for AttributeValue {
    fn from(value: &str) -> Self {
        Self::String(value.to_owned())
    }
}

impl From<String> for AttributeValue {
    fn from(value: String) -> Self {
        Self::String(value)
    }
}

impl From<bool> for AttributeValue {
    fn from(value: bool) -> Self {
        Self::Bool(value)
    }
}

impl From<i64> for AttributeValue {
    fn from(value: i64) -> Self {
        Self::Int(value)
    }
}

impl fmt::Display for AttributeValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Bool(value) => write!(f, "{value}"),
            Self::Int(value) => write!(f, "{value}"),
            Self::Double(value) => write!(f, "{value}"),
            Self::String(value) => f.write_str(value),
        }
    }
}

/// Attribute map keyed by attribute name.
pub type Attributes = BTreeMap<String, AttributeValue>;

/// Identifying attributes attached to all telemetry from the process.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ResourceSpec {
    #[serde(default)]
    attributes: Attributes,
}

impl ResourceSpec {
    /// Creates a resource specification from an attribute map.
    #[must_use]
    pub const fn new(attributes: Attributes) -> Self {
        Self { attributes }
    }

    /// Returns the declared attributes.
    #[must_use]
    pub const fn attributes(&self) -> &Attributes {
        &self.attributes
    }
}

/// The kind of a pipeline stage, used as its registry lookup name.
///
/// # Example
///
/// ```
/// use telconf::StageKind;
///
/// assert_eq!(StageKind::from_name("batch"), StageKind::Batch);
/// assert_eq!(StageKind::from_name("tail").as_str(), "tail");
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum StageKind {
    /// Buffers records and exports them in batches.
    Batch,
    /// Exports every record as soon as it ends.
    Simple,
    /// Collects metrics and exports them on a fixed interval.
    Periodic,
    /// Any other registered stage.
    Custom(String),
}

impl StageKind {
    /// Maps a declared stage name onto its kind.
    #[must_use]
    pub fn from_name(name: &str) -> Self {
        match name {
            "batch" => Self::Batch,
            "simple" => Self::Simple,
            "periodic" => Self::Periodic,
            other => Self::Custom(other.to_owned()),
        }
    }

    /// Returns the registry name for this kind.
    #[must_use]
    pub fn as_str(&self) -> &str {
        match self {
            Self::Batch => "batch",
            Self::Simple => "simple",
            Self::Periodic => "periodic",
            Self::Custom(name) => name,
        }
    }
}

impl fmt::Display for StageKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One pipeline stage: a span processor, metric reader, or log-record
/// processor bound to a named exporter.
#[derive(Debug, Clone, PartialEq)]
pub struct StageSpec {
    kind: StageKind,
    exporter: String,
    args: ComponentArgs,
}

impl StageSpec {
    /// Creates a stage specification.
    ///
    /// `args` is passed to the stage factory verbatim, including the
    /// `exporter` entry when present.
    #[must_use]
    pub fn new(kind: StageKind, exporter: impl Into<String>, args: ComponentArgs) -> Self {
        Self {
            kind,
            exporter: exporter.into(),
            args,
        }
    }

    /// Returns the stage kind.
    #[must_use]
    pub const fn kind(&self) -> &StageKind {
        &self.kind
    }

    /// Returns the name of the exporter this stage feeds.
    #[must_use]
    pub fn exporter(&self) -> &str {
        &self.exporter
    }

    /// Returns the stage arguments.
    #[must_use]
    pub const fn args(&self) -> &ComponentArgs {
        &self.args
    }
}

/// Exporters and ordered pipeline stages for one signal.
///
/// Span limits only appear under traces and views only under metrics.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SignalSpec {
    exporters: BTreeMap<String, ComponentArgs>,
    stages: Vec<StageSpec>,
    span_limits: SpanLimits,
    views: Vec<ViewSpec>,
}

impl SignalSpec {
    /// Creates a signal specification.
    #[must_use]
    pub const fn new(exporters: BTreeMap<String, ComponentArgs>, stages: Vec<StageSpec>) -> Self {
        Self {
            exporters,
            stages,
            span_limits: SpanLimits::new(),
            views: Vec::new(),
        }
    }

    /// Sets the limits applied to recorded spans.
    #[must_use]
    pub const fn with_span_limits(mut self, limits: SpanLimits) -> Self {
        self.span_limits = limits;
        self
    }

    /// Sets the views applied to recorded metric points.
    #[must_use]
    pub fn with_views(mut self, views: Vec<ViewSpec>) -> Self {
        self.views = views;
        self
    }

    /// Returns the span limits; undeclared limits are unbounded.
    #[must_use]
    pub const fn span_limits(&self) -> &SpanLimits {
        &self.span_limits
    }

    /// Returns the views in declared order.
    #[must_use]
    pub fn views(&self) -> &[ViewSpec] {
        &self.views
    }

    /// Returns the declared exporters keyed by name.
    #[must_use]
    pub const fn exporters(&self) -> &BTreeMap<String, ComponentArgs> {
        &self.exporters
    }

    /// Returns the arguments of a declared exporter.
    #[must_use]
    pub fn exporter_args(&self, name: &str) -> Option<&ComponentArgs> {
        self.exporters.get(name)
    }

    /// Returns the pipeline stages in declared order.
    #[must_use]
    pub fn stages(&self) -> &[StageSpec] {
        &self.stages
    }
}

/// Errors typing a validated tree into a [`PipelineConfig`].
#[derive(Debug, Error)]
pub enum ModelError {
    /// The tree does not have the shape of a configuration document.
    #[error("configuration does not match the expected shape: {0}")]
    Shape(#[from] serde_json::Error),

    /// A stage does not name the exporter it feeds.
    #[error(
        "{signal}.{section}[{index}] does not name an exporter",
        section = .signal.stage_section()
    )]
    MissingExporter {
        /// Signal owning the stage.
        signal: Signal,
        /// Position of the stage in declared order.
        index: usize,
    },
}

/// The fully validated, typed configuration.
#[derive(Debug, Clone, PartialEq)]
pub struct PipelineConfig {
    scheme_version: String,
    disabled: bool,
    propagators: Vec<String>,
    resource: ResourceSpec,
    traces: Option<SignalSpec>,
    metrics: Option<SignalSpec>,
    logs: Option<SignalSpec>,
}

impl PipelineConfig {
    /// Types a validated configuration tree.
    ///
    /// # Errors
    ///
    /// Returns a [`ModelError`] when the tree does not have the shape of a
    /// configuration document.
    pub fn from_tree(tree: Value) -> Result<Self, ModelError> {
        document::type_tree(tree)
    }

    /// Returns the declared scheme version.
    #[must_use]
    pub fn scheme_version(&self) -> &str {
        &self.scheme_version
    }

    /// Returns `true` when the SDK is disabled.
    #[must_use]
    pub const fn is_disabled(&self) -> bool {
        self.disabled
    }

    /// Returns the configured propagator names in declared order.
    #[must_use]
    pub fn propagators(&self) -> &[String] {
        &self.propagators
    }

    /// Returns the resource specification.
    #[must_use]
    pub const fn resource(&self) -> &ResourceSpec {
        &self.resource
    }

    /// Returns the specification of `signal`, if declared.
    #[must_use]
    pub const fn signal(&self, signal: Signal) -> Option<&SignalSpec> {
        match signal {
            Signal::Traces => self.traces.as_ref(),
            Signal::Metrics => self.metrics.as_ref(),
            Signal::Logs => self.logs.as_ref(),
        }
    }
}

#[cfg(test)]
mod tests;
