//! Command-line argument definitions.

use camino::{Utf8Path, Utf8PathBuf};
use clap::Parser;
use telconf::SchemaReference;

use crate::logging::{DEFAULT_LOG_FILTER, LogFormat, LogSettings};

/// Applies a declarative telemetry configuration document.
#[derive(Parser, Debug)]
#[command(name = "telconf", version)]
pub(crate) struct Cli {
    /// Configuration document to load (YAML or JSON).
    #[arg(value_name = "CONFIG")]
    pub(crate) config: Utf8PathBuf,
    /// Root schema the document is validated against. Defaults to
    /// `../schema/schema.json` taken from the directory holding CONFIG.
    #[arg(long, value_name = "PATH")]
    pub(crate) schema: Option<Utf8PathBuf>,
    /// Diagnostic log format (`json` or `compact`).
    #[arg(long, value_name = "FORMAT", default_value_t = LogFormat::Compact)]
    pub(crate) log_format: LogFormat,
    /// Diagnostic log filter in `RUST_LOG` syntax.
    #[arg(long, value_name = "FILTER", default_value = DEFAULT_LOG_FILTER)]
    pub(crate) log_filter: String,
    /// Validates the document and exits without installing anything.
    #[arg(long)]
    pub(crate) check: bool,
}

impl Cli {
    /// Returns the logging settings selected on the command line.
    pub(crate) fn log_settings(&self) -> LogSettings {
        LogSettings::new(self.log_format, self.log_filter.as_str())
    }

    /// Returns the schema to validate against.
    ///
    /// An explicit `--schema` is used as given. Otherwise the default
    /// location is resolved against the directory of the configuration
    /// document, so the result does not depend on the working directory.
    pub(crate) fn schema_reference(&self) -> SchemaReference {
        self.schema.clone().map_or_else(
            || {
                let base = self.config.parent().unwrap_or_else(|| Utf8Path::new(""));
                SchemaReference::new(SchemaReference::default().resolve_against(base))
            },
            SchemaReference::new,
        )
    }
}
