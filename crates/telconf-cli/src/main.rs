//! Binary entry point for `telconf`.
//!
//! Delegates to [`telconf_cli::run`] with the process arguments and the
//! locked standard streams.

use std::io::{self, StderrLock, StdoutLock};
use std::process::ExitCode;

fn main() -> ExitCode {
    let mut stdout: StdoutLock<'_> = io::stdout().lock();
    let mut stderr: StderrLock<'_> = io::stderr().lock();
    telconf_cli::run(std::env::args_os(), &mut stdout, &mut stderr)
}
