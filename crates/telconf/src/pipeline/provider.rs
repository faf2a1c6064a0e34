//! Per-signal provider owning the resource, the ordered stages and the
//! exporters they feed.

use tracing::{debug, warn};

use super::{RecordPolicy, Resource};
use crate::component::{Component, Telemetry};
use crate::error::ExportError;
use crate::model::Signal;

/// The assembled pipeline of one signal.
///
/// Items recorded through the provider pass its [`RecordPolicy`], are
/// stamped with its resource and handed to every stage in declared order.
/// Exporters shared by several stages are shut down once, after every
/// stage has flushed and closed.
#[derive(Debug)]
pub struct Provider {
    signal: Signal,
    resource: Resource,
    stages: Vec<Component>,
    exporters: Vec<Component>,
    policy: RecordPolicy,
}

impl Provider {
    /// Creates a provider over already-constructed stages.
    #[must_use]
    pub const fn new(signal: Signal, resource: Resource, stages: Vec<Component>) -> Self {
        Self {
            signal,
            resource,
            stages,
            exporters: Vec::new(),
            policy: RecordPolicy::new(),
        }
    }

    /// Sets the span limits and views applied to recorded items.
    #[must_use]
    pub fn with_policy(mut self, policy: RecordPolicy) -> Self {
        self.policy = policy;
        self
    }

    /// Hands the exporters fed by the stages to the provider, which shuts
    /// each distinct instance down once.
    #[must_use]
    pub fn with_exporters(mut self, exporters: impl IntoIterator<Item = Component>) -> Self {
        for exporter in exporters {
            if !self.exporters.iter().any(|known| known.same_instance(&exporter)) {
                self.exporters.push(exporter);
            }
        }
        self
    }

    /// Returns the signal this provider serves.
    #[must_use]
    pub const fn signal(&self) -> Signal {
        self.signal
    }

    /// Returns the resource attached to recorded items.
    #[must_use]
    pub const fn resource(&self) -> &Resource {
        &self.resource
    }

    /// Returns the stages in declared order.
    #[must_use]
    pub fn stages(&self) -> &[Component] {
        &self.stages
    }

    /// Returns the per-record rules.
    #[must_use]
    pub const fn policy(&self) -> &RecordPolicy {
        &self.policy
    }

    /// Returns the distinct exporters owned by the provider.
    #[must_use]
    pub fn exporters(&self) -> &[Component] {
        &self.exporters
    }

    /// Records one item on every stage.
    ///
    /// Items of another signal reach no stage, and items a view drops reach
    /// none either. Every stage receives the item even if an earlier one
    /// fails.
    ///
    /// # Errors
    ///
    /// Returns the first [`ExportError`] reported by a stage.
    pub fn record<T: Telemetry>(&self, item: T) -> Result<(), ExportError> {
        let Some(mut admitted) = item.apply_policy(&self.policy) else {
            debug!(signal = %self.signal, "record discarded by policy");
            return Ok(());
        };
        admitted.set_resource(self.resource.attributes().clone());
        self.stages
            .iter()
            .filter_map(T::as_stage)
            .map(|stage| stage.submit(admitted.clone()))
            .fold(Ok(()), Result::and)
    }

    /// Flushes every stage.
    ///
    /// # Errors
    ///
    /// Returns the first [`ExportError`] reported by a stage.
    pub fn force_flush(&self) -> Result<(), ExportError> {
        self.each_stage("flush", Component::force_flush)
    }

    /// Shuts every stage down, then every distinct exporter.
    ///
    /// Stages flush while closing, so all of them deliver before any
    /// exporter is closed.
    ///
    /// # Errors
    ///
    /// Returns the first [`ExportError`] reported by a stage or exporter.
    pub fn shutdown(&self) -> Result<(), ExportError> {
        let stages = self.each_stage("shut down", Component::shutdown);
        let exporters = self
            .exporters
            .iter()
            .map(|exporter| {
                exporter.shutdown().inspect_err(|error| {
                    warn!(signal = %self.signal, %error, "failed to shut down exporter");
                })
            })
            .fold(Ok(()), Result::and);
        stages.and(exporters)
    }

    fn each_stage(
        &self,
        action: &str,
        operation: fn(&Component) -> Result<(), ExportError>,
    ) -> Result<(), ExportError> {
        self.stages
            .iter()
            .enumerate()
            .map(|(index, stage)| {
                operation(stage).inspect_err(|error| {
                    warn!(signal = %self.signal, stage = index, %error, "failed to {action} stage");
                })
            })
            .fold(Ok(()), Result::and)
    }
}
