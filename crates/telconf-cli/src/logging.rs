//! Diagnostic log output settings.

use strum::{Display, EnumString};

/// Supported logging output formats.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, EnumString, Display)]
#[strum(serialize_all = "snake_case", ascii_case_insensitive)]
pub enum LogFormat {
    /// Structured JSON suitable for ingestion by logging stacks.
    Json,
    /// Human-readable single line output.
    #[default]
    Compact,
}

/// Errors encountered while parsing a [`LogFormat`] from text.
pub type LogFormatParseError = strum::ParseError;

/// Filter applied when `--log-filter` is absent.
pub const DEFAULT_LOG_FILTER: &str = "info";

/// Logging settings gathered from the command line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LogSettings {
    format: LogFormat,
    filter: String,
}

impl LogSettings {
    /// Creates settings from a format and an `EnvFilter` expression.
    #[must_use]
    pub fn new(format: LogFormat, filter: impl Into<String>) -> Self {
        Self {
            format,
            filter: filter.into(),
        }
    }

    /// Returns the output format.
    #[must_use]
    pub const fn format(&self) -> LogFormat {
        self.format
    }

    /// Returns the filter expression.
    #[must_use]
    pub fn filter(&self) -> &str {
        &self.filter
    }
}

impl Default for LogSettings {
    fn default() -> Self {
        Self::new(LogFormat::default(), DEFAULT_LOG_FILTER)
    }
}
