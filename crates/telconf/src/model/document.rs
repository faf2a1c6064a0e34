//! Document-shaped mirror of the configuration, flattened into the model.

use std::collections::BTreeMap;

use serde::Deserialize;
use serde_json::Value;

use super::{
    ComponentArgs, ModelError, PipelineConfig, ResourceSpec, Signal, SignalSpec, SpanLimits,
    StageKind, StageSpec, ViewSpec,
};

#[derive(Deserialize)]
#[serde(deny_unknown_fields)]
struct RawDocument {
    scheme_version: String,
    #[serde(default)]
    sdk: RawSdk,
}

#[derive(Default, Deserialize)]
#[serde(deny_unknown_fields)]
struct RawSdk {
    #[serde(default)]
    disabled: bool,
    #[serde(default)]
    propagators: Vec<String>,
    #[serde(default)]
    resource: ResourceSpec,
    traces: Option<RawTraces>,
    metrics: Option<RawMetrics>,
    logs: Option<RawLogs>,
}

/// Exporter arguments may be written as an empty YAML value (`console:`).
type RawExporters = BTreeMap<String, Option<ComponentArgs>>;

#[derive(Deserialize)]
#[serde(deny_unknown_fields)]
struct RawTraces {
    #[serde(default)]
    exporters: RawExporters,
    #[serde(default)]
    span_processors: Vec<RawStage>,
    #[serde(default)]
    span_limits: SpanLimits,
}

#[derive(Deserialize)]
#[serde(deny_unknown_fields)]
struct RawMetrics {
    #[serde(default)]
    exporters: RawExporters,
    #[serde(default)]
    metric_readers: Vec<RawStage>,
    #[serde(default)]
    views: Vec<ViewSpec>,
}

#[derive(Deserialize)]
#[serde(deny_unknown_fields)]
struct RawLogs {
    #[serde(default)]
    exporters: RawExporters,
    #[serde(default)]
    log_record_processors: Vec<RawStage>,
}

#[derive(Deserialize)]
#[serde(deny_unknown_fields)]
struct RawStage {
    #[serde(alias = "type")]
    name: String,
    #[serde(default)]
    args: ComponentArgs,
}

pub(super) fn type_tree(tree: Value) -> Result<PipelineConfig, ModelError> {
    let raw: RawDocument = serde_json::from_value(tree)?;
    let sdk = raw.sdk;
    let traces = sdk
        .traces
        .map(|section| {
            signal_spec(Signal::Traces, section.exporters, section.span_processors)
                .map(|spec| spec.with_span_limits(section.span_limits))
        })
        .transpose()?;
    let metrics = sdk
        .metrics
        .map(|section| {
            signal_spec(Signal::Metrics, section.exporters, section.metric_readers)
                .map(|spec| spec.with_views(section.views))
        })
        .transpose()?;
    let logs = sdk
        .logs
        .map(|section| {
            signal_spec(Signal::Logs, section.exporters, section.log_record_processors)
        })
        .transpose()?;
    Ok(PipelineConfig {
        scheme_version: raw.scheme_version,
        disabled: sdk.disabled,
        propagators: sdk.propagators,
        resource: sdk.resource,
        traces,
        metrics,
        logs,
    })
}

fn signal_spec(
    signal: Signal,
    raw_exporters: RawExporters,
    raw_stages: Vec<RawStage>,
) -> Result<SignalSpec, ModelError> {
    let exporters = raw_exporters
        .into_iter()
        .map(|(name, args)| (name, args.unwrap_or_default()))
        .collect();
    let stages = raw_stages
        .into_iter()
        .enumerate()
        .map(|(index, stage)| {
            let exporter = stage
                .args
                .get("exporter")
                .and_then(Value::as_str)
                .ok_or(ModelError::MissingExporter { signal, index })?
                .to_owned();
            Ok(StageSpec::new(
                StageKind::from_name(&stage.name),
                exporter,
                stage.args,
            ))
        })
        .collect::<Result<Vec<_>, ModelError>>()?;
    Ok(SignalSpec::new(exporters, stages))
}
