//! Terminal UI helpers: status messages, spinners and scaffold progress.
//!
//! Everything here writes to stderr so that `bini routes --json` keeps a
//! clean stdout.
//!
//! # Examples
//!
//! ```no_run
//! use bini_cli::ui;
//!
//! ui::init_colors();
//!
//! let spinner = ui::Spinner::new("Scanning src/app...");
//! spinner.finish("Found 4 routes");
//!
//! ui::success("Router written to src/App.tsx");
//! ui::warning("src/app directory not found - file-based routing disabled");
//! ```

mod messages;
mod progress;
mod spinner;

pub use messages::{error, info, success, warning};
pub use progress::ScaffoldProgress;
pub use spinner::Spinner;

/// Check if running in a CI environment.
///
/// Detects GitHub Actions, GitLab CI, CircleCI and Travis CI.
pub fn is_ci() -> bool {
    ["CI", "GITHUB_ACTIONS", "GITLAB_CI", "CIRCLECI", "TRAVIS"]
        .iter()
        .any(|var| std::env::var_os(var).is_some())
}

/// Check if color output should be enabled.
///
/// `NO_COLOR` wins over `FORCE_COLOR`; otherwise colors follow whether
/// stderr is a terminal.
pub fn should_use_color() -> bool {
    if std::env::var_os("NO_COLOR").is_some() {
        return false;
    }
    if std::env::var_os("FORCE_COLOR").is_some() {
        return true;
    }
    console::user_attended_stderr()
}

/// Initialize color support based on environment.
///
/// Call early in `main`, after the logger. The logger picks its own ANSI
/// setting; this only records the decision in the debug log.
pub fn init_colors() {
    tracing::debug!("Colored output: {}", should_use_color());
}
