//! Installation of assembled providers.
//!
//! An [`InstallationSink`] receives one provider per configured signal.
//! [`GlobalProviders`] is the process-wide sink used by
//! [`crate::Configuration::apply_global`].

use std::sync::{Arc, PoisonError, RwLock};

use tracing::{debug, warn};

use crate::model::Signal;
use crate::pipeline::Provider;

/// Destination for the providers built by a configuration pass.
pub trait InstallationSink {
    /// Installs the traces provider.
    fn install_trace_provider(&self, provider: Provider);

    /// Installs the metrics provider.
    fn install_meter_provider(&self, provider: Provider);

    /// Installs the logs provider.
    fn install_log_provider(&self, provider: Provider);

    /// Installs the context propagators, named in declared order.
    fn install_propagators(&self, propagators: &[String]) {
        debug!(count = propagators.len(), "ignoring propagators");
    }
}

static TRACER_PROVIDER: RwLock<Option<Arc<Provider>>> = RwLock::new(None);
static METER_PROVIDER: RwLock<Option<Arc<Provider>>> = RwLock::new(None);
static LOGGER_PROVIDER: RwLock<Option<Arc<Provider>>> = RwLock::new(None);
static PROPAGATORS: RwLock<Vec<String>> = RwLock::new(Vec::new());

const fn slot(signal: Signal) -> &'static RwLock<Option<Arc<Provider>>> {
    match signal {
        Signal::Traces => &TRACER_PROVIDER,
        Signal::Metrics => &METER_PROVIDER,
        Signal::Logs => &LOGGER_PROVIDER,
    }
}

/// Process-wide provider slots.
///
/// Installation policy: the last write wins. A provider replaced by a later
/// installation is shut down, so its buffered telemetry is flushed before
/// it is dropped.
#[derive(Debug, Clone, Copy, Default)]
pub struct GlobalProviders;

impl GlobalProviders {
    /// Returns the installed provider of `signal`.
    #[must_use]
    pub fn provider(signal: Signal) -> Option<Arc<Provider>> {
        slot(signal)
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Returns the installed traces provider.
    #[must_use]
    pub fn tracer_provider() -> Option<Arc<Provider>> {
        Self::provider(Signal::Traces)
    }

    /// Returns the installed metrics provider.
    #[must_use]
    pub fn meter_provider() -> Option<Arc<Provider>> {
        Self::provider(Signal::Metrics)
    }

    /// Returns the installed logs provider.
    #[must_use]
    pub fn logger_provider() -> Option<Arc<Provider>> {
        Self::provider(Signal::Logs)
    }

    /// Returns the installed propagator names.
    #[must_use]
    pub fn propagators() -> Vec<String> {
        PROPAGATORS
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Removes and shuts down every installed provider.
    pub fn shutdown() {
        for signal in Signal::ALL {
            let taken = slot(signal)
                .write()
                .unwrap_or_else(PoisonError::into_inner)
                .take();
            if let Some(provider) = taken {
                shut_down(&provider);
            }
        }
        PROPAGATORS
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .clear();
    }

    fn install(signal: Signal, provider: Provider) {
        let replaced = slot(signal)
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .replace(Arc::new(provider));
        debug!(signal = %signal, "installed global provider");
        if let Some(previous) = replaced {
            debug!(signal = %signal, "shutting down replaced provider");
            shut_down(&previous);
        }
    }
}

fn shut_down(provider: &Provider) {
    if let Err(error) = provider.shutdown() {
        warn!(signal = %provider.signal(), %error, "provider shutdown failed");
    }
}

impl InstallationSink for GlobalProviders {
    fn install_trace_provider(&self, provider: Provider) {
        Self::install(Signal::Traces, provider);
    }

    fn install_meter_provider(&self, provider: Provider) {
        Self::install(Signal::Metrics, provider);
    }

    fn install_log_provider(&self, provider: Provider) {
        Self::install(Signal::Logs, provider);
    }

    fn install_propagators(&self, propagators: &[String]) {
        debug!(propagators = ?propagators, "installed global propagators");
        *PROPAGATORS.write().unwrap_or_else(PoisonError::into_inner) = propagators.to_vec();
    }
}
