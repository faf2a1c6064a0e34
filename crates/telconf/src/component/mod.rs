//! Runtime component contracts.
//!
//! Every pipeline is made of two kinds of component: an [`Exporter`] that
//! delivers finished telemetry to a destination, and a [`Stage`] (span
//! processor, metric reader, or log-record processor) that receives
//! telemetry from a provider and forwards it to exactly one exporter.
//!
//! Factories hand components back to the registry wrapped in a
//! [`Component`], whose [`Capability`] is checked against the signal and
//! role the factory was registered for.

use std::fmt;
use std::mem;
use std::sync::Arc;

use serde::Serialize;

use crate::error::ExportError;
use crate::model::{
    Aggregation, AttributeValue, Attributes, Role, Signal, SpanLimits, ViewStream,
};
use crate::pipeline::RecordPolicy;

/// A sink delivering finished telemetry items of type `T`.
pub trait Exporter<T>: Send + Sync + fmt::Debug {
    /// Delivers a batch of items.
    ///
    /// # Errors
    ///
    /// Returns an [`ExportError`] when the destination rejects the batch.
    fn export(&self, batch: &[T]) -> Result<(), ExportError>;

    /// Releases resources held by the exporter.
    ///
    /// # Errors
    ///
    /// Returns an [`ExportError`] when pending data could not be delivered.
    fn shutdown(&self) -> Result<(), ExportError> {
        Ok(())
    }
}

/// A pipeline stage receiving items of type `T` from a provider.
pub trait Stage<T>: Send + Sync + fmt::Debug {
    /// Accepts one finished item.
    ///
    /// # Errors
    ///
    /// Returns an [`ExportError`] when the item could not be exported or the
    /// stage has been shut down.
    fn submit(&self, item: T) -> Result<(), ExportError>;

    /// Exports everything buffered so far.
    ///
    /// # Errors
    ///
    /// Returns an [`ExportError`] when the exporter rejects the data.
    fn force_flush(&self) -> Result<(), ExportError>;

    /// Flushes and closes the stage.
    ///
    /// The exporter is left open; the owning [`Provider`] shuts every
    /// distinct exporter down once all of its stages have shut down.
    ///
    /// [`Provider`]: crate::Provider
    ///
    /// # Errors
    ///
    /// Returns an [`ExportError`] when the final flush fails.
    fn shutdown(&self) -> Result<(), ExportError>;
}

/// A telemetry item belonging to one signal.
///
/// Implemented by [`SpanData`], [`MetricPoint`] and [`LogRecord`]; generic
/// components use it to wrap and unwrap themselves as [`Component`]s.
pub trait Telemetry: Serialize + Clone + Send + Sync + fmt::Debug + 'static {
    /// Signal the item belongs to.
    const SIGNAL: Signal;

    /// Attaches the resource attributes of the recording provider.
    fn set_resource(&mut self, resource: Attributes);

    /// Applies the recording provider's per-record rules. `None` drops the
    /// item.
    fn apply_policy(self, _policy: &RecordPolicy) -> Option<Self> {
        Some(self)
    }

    /// Wraps an exporter of this item type.
    fn exporter(exporter: Arc<dyn Exporter<Self>>) -> Component;

    /// Wraps a stage of this item type.
    fn stage(stage: Arc<dyn Stage<Self>>) -> Component;

    /// Extracts an exporter of this item type, if `component` is one.
    fn as_exporter(component: &Component) -> Option<Arc<dyn Exporter<Self>>>;

    /// Extracts a stage of this item type, if `component` is one.
    fn as_stage(component: &Component) -> Option<Arc<dyn Stage<Self>>>;
}

/// A finished span.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SpanData {
    name: String,
    attributes: Attributes,
    resource: Attributes,
}

impl SpanData {
    /// Creates a span with no attributes.
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            attributes: Attributes::new(),
            resource: Attributes::new(),
        }
    }

    /// Adds an attribute, returning the updated span.
    #[must_use]
    pub fn with_attribute(
        mut self,
        key: impl Into<String>,
        value: impl Into<AttributeValue>,
    ) -> Self {
        self.attributes.insert(key.into(), value.into());
        self
    }

    /// Returns the span name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Enforces the attribute limits.
    ///
    /// Attributes beyond the count limit are dropped from the end of key
    /// order; string values longer than the length limit are cut at a
    /// character boundary.
    pub(crate) fn apply_limits(&mut self, limits: &SpanLimits) {
        if let Some(count) = limits.attribute_count_limit() {
            if self.attributes.len() > count {
                let kept = mem::take(&mut self.attributes).into_iter().take(count);
                self.attributes = kept.collect();
            }
        }
        if let Some(length) = limits.attribute_value_length_limit() {
            for value in self.attributes.values_mut() {
                if let AttributeValue::String(text) = value {
                    if let Some((cut, _)) = text.char_indices().nth(length) {
                        text.truncate(cut);
                    }
                }
            }
        }
    }

    /// Returns the span attributes.
    #[must_use]
    pub const fn attributes(&self) -> &Attributes {
        &self.attributes
    }

    /// Returns the resource attributes stamped by the provider.
    #[must_use]
    pub const fn resource(&self) -> &Attributes {
        &self.resource
    }
}

/// A single metric observation.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MetricPoint {
    name: String,
    value: f64,
    attributes: Attributes,
    resource: Attributes,
    #[serde(skip_serializing_if = "Option::is_none")]
    instrument_type: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    meter: Option<MeterScope>,
    #[serde(skip_serializing_if = "Option::is_none")]
    description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    aggregation: Option<Aggregation>,
}

impl MetricPoint {
    /// Creates an observation of `value` for the instrument `name`.
    #[must_use]
    pub fn new(name: impl Into<String>, value: f64) -> Self {
        Self {
            name: name.into(),
            value,
            attributes: Attributes::new(),
            resource: Attributes::new(),
            instrument_type: None,
            meter: None,
            description: None,
            aggregation: None,
        }
    }

    /// Sets the type of the instrument that produced the point.
    #[must_use]
    pub fn with_instrument_type(mut self, kind: impl Into<String>) -> Self {
        self.instrument_type = Some(kind.into());
        self
    }

    /// Sets the meter owning the instrument.
    #[must_use]
    pub fn with_meter(mut self, meter: MeterScope) -> Self {
        self.meter = Some(meter);
        self
    }

    /// Adds an attribute, returning the updated point.
    #[must_use]
    pub fn with_attribute(
        mut self,
        key: impl Into<String>,
        value: impl Into<AttributeValue>,
    ) -> Self {
        self.attributes.insert(key.into(), value.into());
        self
    }

    /// Returns the instrument name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Returns the observed value.
    #[must_use]
    pub const fn value(&self) -> f64 {
        self.value
    }

    /// Returns the instrument type, if known.
    #[must_use]
    pub fn instrument_type(&self) -> Option<&str> {
        self.instrument_type.as_deref()
    }

    /// Returns the meter owning the instrument, if known.
    #[must_use]
    pub const fn meter(&self) -> Option<&MeterScope> {
        self.meter.as_ref()
    }

    /// Returns the description set by a view.
    #[must_use]
    pub fn description(&self) -> Option<&str> {
        self.description.as_deref()
    }

    /// Returns the aggregation set by a view.
    #[must_use]
    pub const fn aggregation(&self) -> Option<&Aggregation> {
        self.aggregation.as_ref()
    }

    /// Rewrites the point as the stream a view produces.
    pub(crate) fn apply_view(&mut self, stream: &ViewStream) {
        if let Some(name) = stream.name() {
            name.clone_into(&mut self.name);
        }
        if let Some(description) = stream.description() {
            self.description = Some(description.to_owned());
        }
        if let Some(aggregation) = stream.aggregation() {
            self.aggregation = Some(aggregation.clone());
        }
    }

    /// Returns the point attributes.
    #[must_use]
    pub const fn attributes(&self) -> &Attributes {
        &self.attributes
    }

    /// Returns the resource attributes stamped by the provider.
    #[must_use]
    pub const fn resource(&self) -> &Attributes {
        &self.resource
    }
}

/// The meter an instrument belongs to.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MeterScope {
    name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    version: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    schema_url: Option<String>,
}

impl MeterScope {
    /// Creates a scope for the meter `name`.
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            version: None,
            schema_url: None,
        }
    }

    /// Sets the meter version.
    #[must_use]
    pub fn with_version(mut self, version: impl Into<String>) -> Self {
        self.version = Some(version.into());
        self
    }

    /// Sets the meter schema URL.
    #[must_use]
    pub fn with_schema_url(mut self, schema_url: impl Into<String>) -> Self {
        self.schema_url = Some(schema_url.into());
        self
    }

    /// Meter name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Meter version.
    #[must_use]
    pub fn version(&self) -> Option<&str> {
        self.version.as_deref()
    }

    /// Meter schema URL.
    #[must_use]
    pub fn schema_url(&self) -> Option<&str> {
        self.schema_url.as_deref()
    }
}

/// A log record.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LogRecord {
    severity: String,
    body: String,
    attributes: Attributes,
    resource: Attributes,
}

impl LogRecord {
    /// Creates a record with the given severity text and body.
    #[must_use]
    pub fn new(severity: impl Into<String>, body: impl Into<String>) -> Self {
        Self {
            severity: severity.into(),
            body: body.into(),
            attributes: Attributes::new(),
            resource: Attributes::new(),
        }
    }

    /// Adds an attribute, returning the updated record.
    #[must_use]
    pub fn with_attribute(
        mut self,
        key: impl Into<String>,
        value: impl Into<AttributeValue>,
    ) -> Self {
        self.attributes.insert(key.into(), value.into());
        self
    }

    /// Returns the severity text.
    #[must_use]
    pub fn severity(&self) -> &str {
        &self.severity
    }

    /// Returns the record body.
    #[must_use]
    pub fn body(&self) -> &str {
        &self.body
    }

    /// Returns the record attributes.
    #[must_use]
    pub const fn attributes(&self) -> &Attributes {
        &self.attributes
    }

    /// Returns the resource attributes stamped by the provider.
    #[must_use]
    pub const fn resource(&self) -> &Attributes {
        &self.resource
    }
}

macro_rules! telemetry {
    ($item:ty, $signal:expr, $exporter:ident, $stage:ident $(, $policy:ident)?) => {
        impl Telemetry for $item {
            const SIGNAL: Signal = $signal;

            fn set_resource(&mut self, resource: Attributes) {
                self.resource = resource;
            }

            $(
                fn apply_policy(self, policy: &RecordPolicy) -> Option<Self> {
                    policy.$policy(self)
                }
            )?

            fn exporter(exporter: Arc<dyn Exporter<Self>>) -> Component {
                Component::$exporter(exporter)
            }

            fn stage(stage: Arc<dyn Stage<Self>>) -> Component {
                Component::$stage(stage)
            }

            fn as_exporter(component: &Component) -> Option<Arc<dyn Exporter<Self>>> {
                match component {
                    Component::$exporter(exporter) => Some(Arc::clone(exporter)),
                    _ => None,
                }
            }

            fn as_stage(component: &Component) -> Option<Arc<dyn Stage<Self>>> {
                match component {
                    Component::$stage(stage) => Some(Arc::clone(stage)),
                    _ => None,
                }
            }
        }
    };
}

telemetry!(SpanData, Signal::Traces, SpanExporter, SpanProcessor, limit_span);
telemetry!(MetricPoint, Signal::Metrics, MetricExporter, MetricReader, view_metric);
telemetry!(LogRecord, Signal::Logs, LogExporter, LogRecordProcessor);

/// What a component can do, derived from its concrete kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Capability {
    /// Exports spans.
    SpanExporter,
    /// Exports metric points.
    MetricExporter,
    /// Exports log records.
    LogExporter,
    /// Processes spans.
    SpanProcessor,
    /// Reads metric points.
    MetricReader,
    /// Processes log records.
    LogRecordProcessor,
}

impl Capability {
    /// Returns the capability a component registered for `signal` and `role`
    /// must offer.
    #[must_use]
    pub const fn expected(signal: Signal, role: Role) -> Self {
        match (signal, role) {
            (Signal::Traces, Role::Exporter) => Self::SpanExporter,
            (Signal::Metrics, Role::Exporter) => Self::MetricExporter,
            (Signal::Logs, Role::Exporter) => Self::LogExporter,
            (Signal::Traces, Role::Stage) => Self::SpanProcessor,
            (Signal::Metrics, Role::Stage) => Self::MetricReader,
            (Signal::Logs, Role::Stage) => Self::LogRecordProcessor,
        }
    }

    /// Returns a human-readable name.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::SpanExporter => "span exporter",
            Self::MetricExporter => "metric exporter",
            Self::LogExporter => "log exporter",
            Self::SpanProcessor => "span processor",
            Self::MetricReader => "metric reader",
            Self::LogRecordProcessor => "log-record processor",
        }
    }
}

impl fmt::Display for Capability {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A constructed component, as returned by a registry factory.
#[derive(Debug, Clone)]
pub enum Component {
    /// A span exporter.
    SpanExporter(Arc<dyn Exporter<SpanData>>),
    /// A metric exporter.
    MetricExporter(Arc<dyn Exporter<MetricPoint>>),
    /// A log exporter.
    LogExporter(Arc<dyn Exporter<LogRecord>>),
    /// A span processor.
    SpanProcessor(Arc<dyn Stage<SpanData>>),
    /// A metric reader.
    MetricReader(Arc<dyn Stage<MetricPoint>>),
    /// A log-record processor.
    LogRecordProcessor(Arc<dyn Stage<LogRecord>>),
}

impl Component {
    /// Returns the capability this component offers.
    #[must_use]
    pub const fn capability(&self) -> Capability {
        match self {
            Self::SpanExporter(_) => Capability::SpanExporter,
            Self::MetricExporter(_) => Capability::MetricExporter,
            Self::LogExporter(_) => Capability::LogExporter,
            Self::SpanProcessor(_) => Capability::SpanProcessor,
            Self::MetricReader(_) => Capability::MetricReader,
            Self::LogRecordProcessor(_) => Capability::LogRecordProcessor,
        }
    }

    /// Returns `true` when both values wrap the same component instance.
    #[must_use]
    pub fn same_instance(&self, other: &Self) -> bool {
        self.capability() == other.capability() && self.address() == other.address()
    }

    fn address(&self) -> *const () {
        match self {
            Self::SpanExporter(inner) => Arc::as_ptr(inner).cast::<()>(),
            Self::MetricExporter(inner) => Arc::as_ptr(inner).cast::<()>(),
            Self::LogExporter(inner) => Arc::as_ptr(inner).cast::<()>(),
            Self::SpanProcessor(inner) => Arc::as_ptr(inner).cast::<()>(),
            Self::MetricReader(inner) => Arc::as_ptr(inner).cast::<()>(),
            Self::LogRecordProcessor(inner) => Arc::as_ptr(inner).cast::<()>(),
        }
    }

    /// Exports anything a stage has buffered; a no-op for exporters.
    ///
    /// # Errors
    ///
    /// Returns an [`ExportError`] when the flush fails.
    pub fn force_flush(&self) -> Result<(), ExportError> {
        match self {
            Self::SpanProcessor(stage) => stage.force_flush(),
            Self::MetricReader(stage) => stage.force_flush(),
            Self::LogRecordProcessor(stage) => stage.force_flush(),
            Self::SpanExporter(_) | Self::MetricExporter(_) | Self::LogExporter(_) => Ok(()),
        }
    }

    /// Shuts the component down.
    ///
    /// # Errors
    ///
    /// Returns an [`ExportError`] when the component fails to shut down.
    pub fn shutdown(&self) -> Result<(), ExportError> {
        match self {
            Self::SpanExporter(exporter) => exporter.shutdown(),
            Self::MetricExporter(exporter) => exporter.shutdown(),
            Self::LogExporter(exporter) => exporter.shutdown(),
            Self::SpanProcessor(stage) => stage.shutdown(),
            Self::MetricReader(stage) => stage.shutdown(),
            Self::LogRecordProcessor(stage) => stage.shutdown(),
        }
    }
}
