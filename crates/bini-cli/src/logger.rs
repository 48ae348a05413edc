//! Logging setup for the Bini CLI.
//!
//! Built on `tracing-subscriber`. Verbosity flags pick a filter for the bini
//! crates; otherwise `RUST_LOG` is honored, falling back to info level.
//!
//! ```rust,no_run
//! use bini_cli::logger::init_logger;
//!
//! init_logger(false, false, false);
//! tracing::info!("Watching src/app");
//! ```

use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

const VERBOSE_FILTER: &str = "bini_cli=debug,bini_router=debug";
const QUIET_FILTER: &str = "bini_cli=error,bini_router=error";
const DEFAULT_FILTER: &str = "bini_cli=info,bini_router=info";

/// Pick the log filter for the given flags.
///
/// Precedence: `--verbose`, then `--quiet`, then `RUST_LOG`, then info.
pub fn filter_for(verbose: bool, quiet: bool) -> EnvFilter {
    if verbose {
        EnvFilter::new(VERBOSE_FILTER)
    } else if quiet {
        EnvFilter::new(QUIET_FILTER)
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_FILTER))
    }
}

/// Initialize the global tracing subscriber.
///
/// Logs go to stderr. Call once, before anything logs; later calls are
/// ignored.
pub fn init_logger(verbose: bool, quiet: bool, no_color: bool) {
    let fmt_layer = fmt::layer()
        .with_writer(std::io::stderr)
        .with_target(false)
        .with_level(true)
        .with_ansi(!no_color && should_use_colors())
        .compact();

    let _ = tracing_subscriber::registry()
        .with(filter_for(verbose, quiet))
        .with(fmt_layer)
        .try_init();
}

/// Whether colored output should be used.
///
/// `NO_COLOR` disables colors, `FORCE_COLOR` forces them; otherwise the
/// terminal decides.
pub fn should_use_colors() -> bool {
    if std::env::var_os("NO_COLOR").is_some() {
        return false;
    }
    if std::env::var_os("FORCE_COLOR").is_some() {
        return true;
    }
    console::Term::stderr().features().colors_supported()
}
