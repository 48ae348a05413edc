//! Development reload server.
//!
//! - SSE endpoint that tells browsers to reload after the router changes
//! - Route listing endpoint
//! - `/api` handlers run through Node
//! - Vite child process
//! - Source watcher that feeds plugin hot-update hooks

pub mod api;
pub mod server;
pub mod state;
pub mod vite;
pub mod watcher;

pub use server::DevServer;
pub use state::{DevServerState, SharedState};
pub use watcher::{FileChange, FileWatcher};

use bini_router::RouterEvent;
use serde::{Deserialize, Serialize};

/// Events pushed to connected browsers.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "kebab-case")]
pub enum DevEvent {
    /// Sent once to each client after it connects
    Connected { id: usize },

    /// The router file was rewritten
    Regenerated { file: String, reason: String },

    /// The page should reload
    FullReload,

    /// Regeneration failed; the previous router is still in place
    Failed { error: String },
}

impl From<&RouterEvent> for DevEvent {
    fn from(event: &RouterEvent) -> Self {
        match event {
            RouterEvent::Regenerated { file, reason, .. } => DevEvent::Regenerated {
                file: file.display().to_string(),
                reason: reason.clone(),
            },
            RouterEvent::FullReload => DevEvent::FullReload,
            RouterEvent::Failed { error } => DevEvent::Failed {
                error: error.clone(),
            },
        }
    }
}
