//! Error handling for the Bini CLI.
//!
//! `CliError` is the top-level error returned by every command. Domain errors
//! (`ConfigError`, `ScaffoldError`, and the router's `RouterError`) convert
//! into it via `#[from]`, and `main` turns it into a `miette::Report`.
//!
//! # Example
//!
//! ```rust,no_run
//! use bini_cli::error::{Result, ResultExt};
//! use std::path::Path;
//!
//! fn read_layout(path: &Path) -> Result<String> {
//!     std::fs::read_to_string(path)
//!         .with_path(path)
//!         .with_hint("Run `bini create` to scaffold a project first")
//! }
//! ```

mod report;

pub use report::cli_error_to_miette;

use bini_router::RouterError;
use std::path::PathBuf;
use thiserror::Error;

/// Top-level CLI error type.
#[derive(Debug, Error)]
pub enum CliError {
    /// Configuration-related errors (invalid file, bad values)
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    /// Project scaffolding errors
    #[error("Scaffold error: {0}")]
    Scaffold(#[from] ScaffoldError),

    /// Route discovery or router generation errors
    #[error(transparent)]
    Router(#[from] RouterError),

    /// Invalid command-line arguments or options
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    /// File or directory not found
    #[error("File not found: {}", .0.display())]
    FileNotFound(PathBuf),

    /// I/O errors from file system operations
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Live-reload server errors
    #[error("Server error: {0}")]
    Server(String),

    /// File watching errors
    #[error("File watcher error: {0}")]
    Watch(#[from] notify::Error),

    /// JSON serialization errors
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Generic errors with custom messages
    #[error("{0}")]
    Custom(String),
}

/// Configuration errors raised while loading or validating `bini.config.json`.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// The merged configuration could not be deserialized
    #[error("Failed to load configuration: {0}\n\nHint: Check bini.config.json syntax and field types")]
    Load(String),

    /// Invalid value for a configuration option
    #[error("Invalid value for '{field}': {value}\n\nHint: {hint}")]
    InvalidValue {
        /// Name of the field with the invalid value
        field: String,
        /// The invalid value
        value: String,
        /// How to fix it
        hint: String,
    },

    /// A configured directory points outside the project
    #[error("'{field}' must stay inside the project: {}\n\nHint: Use a path relative to the project root", .path.display())]
    OutsideProject {
        /// Name of the offending field
        field: String,
        /// The configured path
        path: PathBuf,
    },
}

/// Errors raised by `bini create`.
#[derive(Debug, Error)]
pub enum ScaffoldError {
    /// The project name failed validation
    #[error("Invalid project name '{name}': {reason}")]
    InvalidName {
        /// The rejected name
        name: String,
        /// Which rule it broke
        reason: String,
    },

    /// Target directory exists and `--force` was not given
    #[error("Directory '{}' already exists\n\nHint: Choose another name or pass --force to replace it", .0.display())]
    DirectoryExists(PathBuf),

    /// `--force` refused to remove a path
    #[error("Refusing to remove {}: {reason}", .path.display())]
    UnsafeRemoval {
        /// Path that would have been removed
        path: PathBuf,
        /// Why removal was refused
        reason: String,
    },
}

/// Result type alias using `CliError` as the default error type.
pub type Result<T, E = CliError> = std::result::Result<T, E>;

/// Extension trait for adding context to `Result` types.
pub trait ResultExt<T> {
    /// Turn a not-found I/O error into [`CliError::FileNotFound`] for `path`.
    fn with_path(self, path: impl AsRef<std::path::Path>) -> Result<T>;

    /// Append a hint to the error message.
    fn with_hint(self, hint: impl std::fmt::Display) -> Result<T>;

    /// Prefix the error message.
    fn context(self, msg: impl std::fmt::Display) -> Result<T>;
}

impl<T, E: Into<CliError>> ResultExt<T> for std::result::Result<T, E> {
    fn with_path(self, path: impl AsRef<std::path::Path>) -> Result<T> {
        self.map_err(|e| match e.into() {
            CliError::Io(io_err) if io_err.kind() == std::io::ErrorKind::NotFound => {
                CliError::FileNotFound(path.as_ref().to_path_buf())
            }
            other => other,
        })
    }

    fn with_hint(self, hint: impl std::fmt::Display) -> Result<T> {
        self.map_err(|e| {
            let err: CliError = e.into();
            CliError::Custom(format!("{}\n\nHint: {}", err, hint))
        })
    }

    fn context(self, msg: impl std::fmt::Display) -> Result<T> {
        self.map_err(|e| {
            let err: CliError = e.into();
            CliError::Custom(format!("{}: {}", msg, err))
        })
    }
}
