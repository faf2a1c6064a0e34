//! The configuration facade.
//!
//! A [`Configuration`] is either configured with a validated
//! [`PipelineConfig`] or inert. Applying an inert or disabled configuration
//! touches neither the registry nor the sink.

mod resolve;

use std::fmt;

use tracing::{debug, info, warn};

use crate::error::ResourceError;
use crate::model::{PipelineConfig, Signal};
use crate::pipeline::{BuildDiagnostic, PipelineBuilder, Resource};
use crate::registry::{self, ComponentRegistry};
use crate::sink::{GlobalProviders, InstallationSink};

pub use self::resolve::{
    resolve_configuration, resolve_configuration_with, try_resolve_configuration,
    try_resolve_configuration_with,
};

/// What an [`Configuration::apply`] call did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ApplyOutcome {
    /// The configuration is inert; nothing happened.
    Inert,
    /// The SDK is disabled; nothing happened.
    Disabled,
    /// Providers were built and handed to the sink.
    Applied,
}

impl fmt::Display for ApplyOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Inert => "inert",
            Self::Disabled => "disabled",
            Self::Applied => "applied",
        })
    }
}

/// A signal that was skipped entirely.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SignalFailure {
    signal: Signal,
    cause: ResourceError,
}

impl SignalFailure {
    /// Returns the skipped signal.
    #[must_use]
    pub const fn signal(&self) -> Signal {
        self.signal
    }

    /// Returns why the signal was skipped.
    #[must_use]
    pub const fn cause(&self) -> &ResourceError {
        &self.cause
    }
}

/// Observable result of applying a configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ApplyReport {
    outcome: ApplyOutcome,
    installed: Vec<Signal>,
    diagnostics: Vec<BuildDiagnostic>,
    failures: Vec<SignalFailure>,
}

impl ApplyReport {
    const fn idle(outcome: ApplyOutcome) -> Self {
        Self {
            outcome,
            installed: Vec::new(),
            diagnostics: Vec::new(),
            failures: Vec::new(),
        }
    }

    /// Returns the outcome.
    #[must_use]
    pub const fn outcome(&self) -> ApplyOutcome {
        self.outcome
    }

    /// Returns the signals whose provider was installed, in order.
    #[must_use]
    pub fn installed(&self) -> &[Signal] {
        &self.installed
    }

    /// Returns every stage skipped across all signals.
    #[must_use]
    pub fn diagnostics(&self) -> &[BuildDiagnostic] {
        &self.diagnostics
    }

    /// Returns the signals skipped entirely.
    #[must_use]
    pub fn failures(&self) -> &[SignalFailure] {
        &self.failures
    }

    /// Returns `true` when every declared signal and stage was installed.
    #[must_use]
    pub fn is_clean(&self) -> bool {
        self.diagnostics.is_empty() && self.failures.is_empty()
    }
}

/// A resolved configuration, possibly inert.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Configuration {
    pipeline: Option<PipelineConfig>,
}

impl Configuration {
    /// Returns the inert configuration.
    #[must_use]
    pub const fn inert() -> Self {
        Self { pipeline: None }
    }

    /// Wraps a validated pipeline configuration.
    #[must_use]
    pub const fn configured(pipeline: PipelineConfig) -> Self {
        Self {
            pipeline: Some(pipeline),
        }
    }

    /// Returns `true` for the inert configuration.
    #[must_use]
    pub const fn is_inert(&self) -> bool {
        self.pipeline.is_none()
    }

    /// Returns the pipeline configuration, unless inert.
    #[must_use]
    pub const fn pipeline(&self) -> Option<&PipelineConfig> {
        self.pipeline.as_ref()
    }

    /// Builds a provider for every declared signal and installs it.
    ///
    /// Signals without a block are skipped. A signal whose resource is
    /// invalid is skipped and recorded as a [`SignalFailure`]; stages that
    /// cannot be built are recorded as [`BuildDiagnostic`]s. May be called
    /// repeatedly; every call installs fresh providers.
    pub fn apply<S>(&self, registry: &ComponentRegistry, sink: &S) -> ApplyReport
    where
        S: InstallationSink + ?Sized,
    {
        let Some(pipeline) = self.active() else {
            return ApplyReport::idle(self.idle_outcome());
        };

        let builder = PipelineBuilder::new(registry);
        let mut report = ApplyReport::idle(ApplyOutcome::Applied);
        for signal in Signal::ALL {
            let Some(spec) = pipeline.signal(signal) else {
                debug!(signal = %signal, "signal not configured");
                continue;
            };
            let resource = match Resource::from_spec(pipeline.resource()) {
                Ok(resource) => resource,
                Err(cause) => {
                    warn!(signal = %signal, %cause, "skipping signal");
                    report.failures.push(SignalFailure { signal, cause });
                    continue;
                }
            };
            let (provider, diagnostics) = builder.build(signal, spec, resource).into_parts();
            report.diagnostics.extend(diagnostics);
            match signal {
                Signal::Traces => sink.install_trace_provider(provider),
                Signal::Metrics => sink.install_meter_provider(provider),
                Signal::Logs => sink.install_log_provider(provider),
            }
            report.installed.push(signal);
        }
        sink.install_propagators(pipeline.propagators());

        info!(
            installed = report.installed.len(),
            skipped_stages = report.diagnostics.len(),
            failed_signals = report.failures.len(),
            "applied telemetry configuration"
        );
        report
    }

    /// Applies against a snapshot of the process-wide registry, installing
    /// into [`GlobalProviders`].
    ///
    /// The registry is not consulted when the configuration is inert or
    /// disabled.
    pub fn apply_global(&self) -> ApplyReport {
        if self.active().is_none() {
            return ApplyReport::idle(self.idle_outcome());
        }
        self.apply(&registry::global().snapshot(), &GlobalProviders)
    }

    fn active(&self) -> Option<&PipelineConfig> {
        self.pipeline.as_ref().filter(|pipeline| !pipeline.is_disabled())
    }

    fn idle_outcome(&self) -> ApplyOutcome {
        if self.pipeline.is_some() {
            debug!("telemetry SDK disabled; nothing to apply");
            ApplyOutcome::Disabled
        } else {
            ApplyOutcome::Inert
        }
    }
}
