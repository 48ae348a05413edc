//! Miette report conversion for CLI errors.

use crate::error::CliError;
use miette::Report;

/// Convert a `CliError` into a miette report.
///
/// Router errors carry their own diagnostic codes and help text, so they are
/// reported as-is; everything else becomes a plain message.
pub fn cli_error_to_miette(err: CliError) -> Report {
    match err {
        CliError::Router(e) => Report::new(e),
        CliError::Config(e) => miette::miette!("Configuration error: {}", e),
        _ => miette::miette!("{}", err),
    }
}
