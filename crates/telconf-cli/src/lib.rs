//! Command-line front end for `telconf`.
//!
//! The `telconf` binary loads a configuration document, applies it to the
//! process-wide provider slots and reports the outcome through structured
//! logs on stderr. Loading is fail-soft: a defective document is logged and
//! leaves telemetry inert, and the process still exits successfully. Pass
//! `--check` to validate only; that mode exits non-zero when the document
//! would be inert and lists every schema violation.

mod cli;
pub mod diagnostics;
pub mod logging;

use std::ffi::OsString;
use std::io::Write;
use std::process::ExitCode;

use clap::Parser;
use tracing::{info, warn};

use telconf::{
    ApplyReport, ConfigSource, GlobalProviders, ResolveError, SchemaReference,
    resolve_configuration, try_resolve_configuration,
};

use crate::cli::Cli;

pub use self::logging::{LogFormat, LogFormatParseError, LogSettings};

/// Exit status for command-line usage errors.
const USAGE_EXIT_CODE: u8 = 2;

/// Runs the binary with the given arguments and output streams.
///
/// Returns the process exit status.
pub fn run<I, W, E>(args: I, stdout: &mut W, stderr: &mut E) -> ExitCode
where
    I: IntoIterator<Item = OsString>,
    W: Write,
    E: Write,
{
    let cli = match Cli::try_parse_from(args) {
        Ok(cli) => cli,
        Err(error) => return report_usage(&error, stdout, stderr),
    };
    if let Err(error) = diagnostics::install(&cli.log_settings()) {
        let _ = writeln!(stderr, "{error}");
        return ExitCode::FAILURE;
    }

    let source = ConfigSource::from_path(cli.config.clone());
    let schema = cli.schema_reference();
    if cli.check {
        check(&cli, &source, &schema, stdout, stderr)
    } else {
        apply(&source, &schema);
        ExitCode::SUCCESS
    }
}

fn report_usage<W: Write, E: Write>(
    error: &clap::Error,
    stdout: &mut W,
    stderr: &mut E,
) -> ExitCode {
    if error.use_stderr() {
        let _ = write!(stderr, "{}", error.render());
        ExitCode::from(USAGE_EXIT_CODE)
    } else {
        let _ = write!(stdout, "{}", error.render());
        ExitCode::SUCCESS
    }
}

fn check<W: Write, E: Write>(
    cli: &Cli,
    source: &ConfigSource,
    schema: &SchemaReference,
    stdout: &mut W,
    stderr: &mut E,
) -> ExitCode {
    match try_resolve_configuration(source, schema) {
        Ok(pipeline) => {
            let _ = writeln!(
                stdout,
                "{}: valid (scheme_version {})",
                cli.config,
                pipeline.scheme_version()
            );
            ExitCode::SUCCESS
        }
        Err(error) => {
            let _ = writeln!(stderr, "{}: {error}", cli.config);
            if let ResolveError::Validation(validation) = &error {
                for violation in validation.violations() {
                    let _ = writeln!(stderr, "  {violation}");
                }
            }
            ExitCode::FAILURE
        }
    }
}

fn apply(source: &ConfigSource, schema: &SchemaReference) {
    let report = resolve_configuration(source, schema).apply_global();
    log_report(&report);

    for signal in report.installed() {
        let Some(provider) = GlobalProviders::provider(*signal) else {
            continue;
        };
        if let Err(error) = provider.force_flush() {
            warn!(signal = %signal, %error, "flush failed");
        }
    }
    GlobalProviders::shutdown();
}

fn log_report(report: &ApplyReport) {
    for failure in report.failures() {
        warn!(signal = %failure.signal(), cause = %failure.cause(), "signal not installed");
    }
    info!(
        outcome = %report.outcome(),
        installed = ?report.installed(),
        skipped_stages = report.diagnostics().len(),
        "telemetry configuration processed"
    );
}
