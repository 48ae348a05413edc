//! Error types for route discovery and router regeneration

use miette::Diagnostic;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Errors that can occur while discovering routes or writing the router file
#[derive(Error, Debug, Diagnostic)]
pub enum RouterError {
    /// Filesystem operation failed
    #[error("Failed to {action} {}: {source}", path.display())]
    #[diagnostic(code(bini::router::io))]
    Io {
        action: &'static str,
        path: PathBuf,
        source: std::io::Error,
    },

    /// The pages root does not exist, so there is nothing to watch
    #[error("Pages directory not found: {}", .0.display())]
    #[diagnostic(
        code(bini::router::missing_pages_root),
        help("Create src/app/page.tsx or point `appDir` in bini.config.json at your pages directory")
    )]
    MissingPagesRoot(PathBuf),

    /// File watcher could not be created or attached
    #[error("File watcher error: {0}")]
    #[diagnostic(code(bini::router::watch))]
    Watch(#[from] notify::Error),

    /// A background generation task panicked or was cancelled
    #[error("Background task failed: {0}")]
    #[diagnostic(code(bini::router::task_failed))]
    TaskFailed(String),
}

impl RouterError {
    /// Create an Io error for a read of `path`
    pub fn read(path: impl AsRef<Path>, source: std::io::Error) -> Self {
        Self::Io {
            action: "read",
            path: path.as_ref().to_path_buf(),
            source,
        }
    }

    /// Create an Io error for a write of `path`
    pub fn write(path: impl AsRef<Path>, source: std::io::Error) -> Self {
        Self::Io {
            action: "write",
            path: path.as_ref().to_path_buf(),
            source,
        }
    }
}

/// Result type for router operations
pub type Result<T> = std::result::Result<T, RouterError>;
