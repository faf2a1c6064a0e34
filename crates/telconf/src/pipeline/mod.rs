//! Assembly of one signal's pipeline from its specification.
//!
//! The [`PipelineBuilder`] walks the declared stages in order. Each stage's
//! exporter is resolved on first reference and cached for the rest of the
//! pass, so stages naming the same exporter share one instance and a
//! failing exporter factory runs only once. Every exporter the pass
//! constructs is handed to the provider, which owns its shutdown, together
//! with the signal's span limits and views. A stage that cannot be built is
//! skipped and reported as a [`BuildDiagnostic`]; the builder itself never
//! fails.

mod policy;
mod provider;
mod resource;

use std::collections::HashMap;
use std::fmt;

use tracing::{debug, warn};

use crate::component::Component;
use crate::error::ResolutionError;
use crate::model::{Signal, SignalSpec, StageKind, StageSpec};
use crate::registry::ComponentRegistry;

pub use self::policy::RecordPolicy;
pub use self::provider::Provider;
pub use self::resource::Resource;

/// A stage skipped while building a pipeline.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BuildDiagnostic {
    signal: Signal,
    index: usize,
    kind: StageKind,
    cause: ResolutionError,
}

impl BuildDiagnostic {
    /// Returns the signal being built.
    #[must_use]
    pub const fn signal(&self) -> Signal {
        self.signal
    }

    /// Returns the position of the skipped stage in declared order.
    #[must_use]
    pub const fn index(&self) -> usize {
        self.index
    }

    /// Returns the kind of the skipped stage.
    #[must_use]
    pub const fn kind(&self) -> &StageKind {
        &self.kind
    }

    /// Returns why the stage was skipped.
    #[must_use]
    pub const fn cause(&self) -> &ResolutionError {
        &self.cause
    }
}

impl fmt::Display for BuildDiagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}.{}[{}] ({}) skipped: {}",
            self.signal,
            self.signal.stage_section(),
            self.index,
            self.kind,
            self.cause
        )
    }
}

/// Outcome of building one signal: the provider and every skipped stage.
#[derive(Debug)]
pub struct SignalBuild {
    provider: Provider,
    diagnostics: Vec<BuildDiagnostic>,
}

impl SignalBuild {
    /// Returns the provider.
    #[must_use]
    pub const fn provider(&self) -> &Provider {
        &self.provider
    }

    /// Returns the diagnostics in declared stage order.
    #[must_use]
    pub fn diagnostics(&self) -> &[BuildDiagnostic] {
        &self.diagnostics
    }

    /// Splits the build into its provider and diagnostics.
    #[must_use]
    pub fn into_parts(self) -> (Provider, Vec<BuildDiagnostic>) {
        (self.provider, self.diagnostics)
    }
}

/// Resolved exporters of one build pass, failures included.
struct ExporterCache<'a> {
    registry: &'a ComponentRegistry,
    signal: Signal,
    spec: &'a SignalSpec,
    resolved: HashMap<&'a str, Result<Component, ResolutionError>>,
    constructed: Vec<Component>,
}

impl<'a> ExporterCache<'a> {
    fn new(registry: &'a ComponentRegistry, signal: Signal, spec: &'a SignalSpec) -> Self {
        Self {
            registry,
            signal,
            spec,
            resolved: HashMap::new(),
            constructed: Vec::new(),
        }
    }

    fn get(&mut self, name: &'a str) -> Result<Component, ResolutionError> {
        let Some(args) = self.spec.exporter_args(name) else {
            return Err(ResolutionError::UndeclaredExporter {
                signal: self.signal,
                name: name.to_owned(),
            });
        };
        let (registry, signal) = (self.registry, self.signal);
        let constructed = &mut self.constructed;
        self.resolved
            .entry(name)
            .or_insert_with(|| {
                debug!(signal = %signal, exporter = name, "resolving exporter");
                let outcome = registry.resolve_exporter(signal, name, args);
                if let Ok(exporter) = &outcome {
                    constructed.push(exporter.clone());
                }
                outcome
            })
            .clone()
    }

    /// Returns every exporter built during the pass, in first-use order.
    fn into_constructed(self) -> Vec<Component> {
        self.constructed
    }
}

/// Builds providers by resolving components through a registry.
#[derive(Debug, Clone, Copy)]
pub struct PipelineBuilder<'r> {
    registry: &'r ComponentRegistry,
}

impl<'r> PipelineBuilder<'r> {
    /// Creates a builder resolving through `registry`.
    #[must_use]
    pub const fn new(registry: &'r ComponentRegistry) -> Self {
        Self { registry }
    }

    /// Builds the provider of `signal` from `spec`.
    ///
    /// Stages are constructed in declared order; a stage whose exporter or
    /// own factory cannot be resolved is skipped and reported, so the
    /// provider may end up with zero stages.
    #[must_use]
    pub fn build(&self, signal: Signal, spec: &SignalSpec, resource: Resource) -> SignalBuild {
        let mut exporters = ExporterCache::new(self.registry, signal, spec);
        let mut stages = Vec::with_capacity(spec.stages().len());
        let mut diagnostics = Vec::new();

        for (index, stage) in spec.stages().iter().enumerate() {
            match self.build_stage(signal, stage, &mut exporters) {
                Ok(component) => stages.push(component),
                Err(cause) => {
                    let diagnostic = BuildDiagnostic {
                        signal,
                        index,
                        kind: stage.kind().clone(),
                        cause,
                    };
                    warn!(
                        signal = %signal,
                        stage = index,
                        kind = %diagnostic.kind,
                        cause = %diagnostic.cause,
                        "skipping pipeline stage"
                    );
                    diagnostics.push(diagnostic);
                }
            }
        }

        debug!(
            signal = %signal,
            stages = stages.len(),
            skipped = diagnostics.len(),
            "built provider"
        );
        SignalBuild {
            provider: Provider::new(signal, resource, stages)
                .with_exporters(exporters.into_constructed())
                .with_policy(RecordPolicy::from_spec(spec)),
            diagnostics,
        }
    }

    fn build_stage<'s>(
        &self,
        signal: Signal,
        stage: &'s StageSpec,
        exporters: &mut ExporterCache<'s>,
    ) -> Result<Component, ResolutionError> {
        let exporter = exporters.get(stage.exporter())?;
        self.registry
            .resolve_stage(signal, stage.kind(), stage.args(), exporter)
    }
}
