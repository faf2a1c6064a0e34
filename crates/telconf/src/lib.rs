//! Declarative configuration of telemetry pipelines.
//!
//! `telconf` turns a schema-validated configuration document into one
//! provider per telemetry signal (traces, metrics, logs) and hands those
//! providers to a process-wide installation sink.
//!
//! # Architecture
//!
//! - [`resolve_configuration`] decodes and validates a document. It is the
//!   single fail-soft boundary: any defect yields the inert
//!   [`Configuration`] instead of an error.
//! - [`ComponentRegistry`] maps `(signal, role, name)` to factories and
//!   checks that each constructed component offers the expected
//!   [`Capability`].
//! - [`PipelineBuilder`] walks one signal's stages in declared order,
//!   resolving exporters lazily and sharing them across stages. Stages that
//!   fail to resolve are skipped and reported as [`BuildDiagnostic`]s.
//! - [`Configuration::apply`] builds every declared signal and installs the
//!   resulting [`Provider`]s through an [`InstallationSink`].
//!
//! # Example
//!
//! ```no_run
//! use telconf::{
//!     ConfigSource, ComponentRegistry, GlobalProviders, SchemaReference, resolve_configuration,
//! };
//!
//! let configuration = resolve_configuration(
//!     &ConfigSource::from_path("otel.yaml"),
//!     &SchemaReference::default(),
//! );
//! let report = configuration.apply(&ComponentRegistry::with_builtins(), &GlobalProviders);
//! assert!(report.diagnostics().is_empty());
//! ```

pub mod builtin;
pub mod component;
pub mod configuration;
pub mod error;
pub mod model;
pub mod pipeline;
pub mod registry;
pub mod sink;

#[cfg(test)]
mod tests;

pub use self::component::{
    Capability, Component, Exporter, LogRecord, MeterScope, MetricPoint, SpanData, Stage,
    Telemetry,
};
pub use self::configuration::{
    ApplyOutcome, ApplyReport, Configuration, SignalFailure, resolve_configuration,
    resolve_configuration_with, try_resolve_configuration, try_resolve_configuration_with,
};
pub use self::error::{ExportError, FactoryError, ResolutionError, ResolveError, ResourceError};
pub use self::model::{
    Aggregation, AttributeValue, Attributes, ComponentArgs, JaegerExporterArgs, ModelError,
    OtlpExporterArgs, PipelineConfig, ResourceSpec, Role, Signal, SignalSpec, SpanLimits,
    StageKind, StageSpec, ViewSelector, ViewSpec, ViewStream, ZipkinExporterArgs,
};
pub use self::pipeline::{
    BuildDiagnostic, PipelineBuilder, Provider, RecordPolicy, Resource, SignalBuild,
};
pub use self::registry::{
    ComponentKey, ComponentRegistry, ExporterFactory, Factory, SharedRegistry, StageFactory,
};
pub use self::sink::{GlobalProviders, InstallationSink};

pub use telconf_schema::{ConfigSource, SchemaReference};
