//! The binary's own diagnostic log.
//!
//! Diagnostics always go to stderr so that stdout carries nothing but
//! `--check` results. JSON output is stamped with RFC 3339 UTC times for
//! log collectors; compact output is meant for a person reading a single
//! run and carries no timestamps.

use std::io::{self, IsTerminal};

use once_cell::sync::OnceCell;
use tracing::debug;
use tracing_subscriber::filter::EnvFilter;
use tracing_subscriber::fmt::{self, time::UtcTime};
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::{SubscriberInitExt, TryInitError};
use tracing_subscriber::{Layer, Registry};

use crate::logging::{LogFormat, LogSettings};

/// Settings of the installed log, fixed for the life of the process.
static INSTALLED: OnceCell<LogSettings> = OnceCell::new();

/// Errors installing the diagnostic log.
#[derive(Debug, thiserror::Error)]
pub enum DiagnosticsError {
    /// The `--log-filter` expression does not parse.
    #[error("invalid log filter '{filter}': {reason}")]
    Filter {
        /// Expression as given.
        filter: String,
        /// Parser message.
        reason: String,
    },
    /// Another subscriber already owns the process.
    #[error("failed to install log subscriber: {0}")]
    Install(#[from] TryInitError),
}

/// Installs the diagnostic log and returns the settings in effect.
///
/// The filter is always parsed, but only the first successful call installs
/// anything. A later call with different settings keeps the installed log
/// and notes the discarded request at debug level.
///
/// # Errors
///
/// Returns [`DiagnosticsError::Filter`] when the filter does not parse and
/// [`DiagnosticsError::Install`] when a foreign subscriber is already
/// installed.
///
/// # Examples
///
/// ```rust
/// use telconf_cli::{LogFormat, LogSettings, diagnostics};
///
/// # fn main() -> Result<(), diagnostics::DiagnosticsError> {
/// let installed = diagnostics::install(&LogSettings::default())?;
/// let kept = diagnostics::install(&LogSettings::new(LogFormat::Json, "debug"))?;
/// assert_eq!(installed, kept);
/// # Ok(())
/// # }
/// ```
pub fn install(settings: &LogSettings) -> Result<&'static LogSettings, DiagnosticsError> {
    let filter = EnvFilter::try_new(settings.filter()).map_err(|error| {
        DiagnosticsError::Filter {
            filter: settings.filter().to_owned(),
            reason: error.to_string(),
        }
    })?;
    let installed = INSTALLED.get_or_try_init(|| {
        register(settings.format(), filter)?;
        Ok::<_, DiagnosticsError>(settings.clone())
    })?;
    if installed != settings {
        debug!(
            requested_format = %settings.format(),
            requested_filter = settings.filter(),
            "diagnostic log already installed; request ignored"
        );
    }
    Ok(installed)
}

fn register(format: LogFormat, filter: EnvFilter) -> Result<(), DiagnosticsError> {
    let output: Box<dyn Layer<Registry> + Send + Sync> = match format {
        LogFormat::Json => fmt::layer()
            .json()
            .flatten_event(true)
            .with_timer(UtcTime::rfc_3339())
            .with_writer(io::stderr)
            .with_filter(filter)
            .boxed(),
        LogFormat::Compact => fmt::layer()
            .compact()
            .without_time()
            .with_ansi(io::stderr().is_terminal())
            .with_writer(io::stderr)
            .with_filter(filter)
            .boxed(),
    };
    tracing_subscriber::registry().with(output).try_init()?;
    Ok(())
}
