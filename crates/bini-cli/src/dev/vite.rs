//! Vite child process for `bini dev`.
//!
//! Vite serves the app; the reload server only pushes events and answers
//! `/api`. Vite learns the reload server's port from `BINI_PORT`, which the
//! generated `vite.config.mjs` reads for its `/api` proxy and the reload
//! script URL.

use crate::error::{CliError, Result};
use std::path::{Path, PathBuf};
use std::process::{ExitStatus, Stdio};
use tokio::process::{Child, Command};

pub const PORT_ENV: &str = "BINI_PORT";

/// Local Vite binary installed by `npm install`.
pub fn vite_binary(root: &Path) -> Option<PathBuf> {
    let name = if cfg!(windows) { "vite.cmd" } else { "vite" };
    let path = root.join("node_modules").join(".bin").join(name);
    path.is_file().then_some(path)
}

/// A running Vite dev server.
pub struct ViteProcess {
    child: Child,
}

impl ViteProcess {
    /// Start Vite in `root`, pointing it at the reload server on `port`.
    ///
    /// # Errors
    ///
    /// Returns `CliError::Server` if the process cannot be spawned.
    pub fn spawn(binary: &Path, root: &Path, port: u16) -> Result<Self> {
        let child = Command::new(binary)
            .arg("--host")
            .current_dir(root)
            .env(PORT_ENV, port.to_string())
            .stdin(Stdio::null())
            .kill_on_drop(true)
            .spawn()
            .map_err(|e| {
                CliError::Server(format!("Failed to start {}: {}", binary.display(), e))
            })?;
        tracing::debug!("Vite started (pid {:?})", child.id());
        Ok(Self { child })
    }

    /// Wait for Vite to exit on its own.
    pub async fn wait(&mut self) -> Result<ExitStatus> {
        self.child
            .wait()
            .await
            .map_err(|e| CliError::Server(format!("Vite failed: {}", e)))
    }

    pub async fn stop(mut self) {
        if let Err(e) = self.child.kill().await {
            tracing::debug!("Vite already stopped: {}", e);
        }
    }
}
