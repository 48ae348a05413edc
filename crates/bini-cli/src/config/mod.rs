//! Project configuration (`bini.config.json`).
//!
//! Sources are merged with figment in increasing priority:
//! built-in defaults, the config file, `BINI_*` environment variables and
//! finally command-line flags.

mod loading;
mod validation;

pub use loading::{ConfigOverrides, CONFIG_FILE, ENV_PREFIX};

use bini_router::{RouterConfig, WatchTimings};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

fn default_app_dir() -> PathBuf {
    PathBuf::from(bini_router::config::DEFAULT_APP_DIR)
}

fn default_src_dir() -> PathBuf {
    PathBuf::from(bini_router::config::DEFAULT_SRC_DIR)
}

fn default_debounce_ms() -> u64 {
    50
}

fn default_suppression_window_ms() -> u64 {
    500
}

fn default_retention_window_ms() -> u64 {
    2000
}

fn default_dir_grace_ms() -> u64 {
    500
}

fn default_port() -> u16 {
    3000
}

fn default_node() -> String {
    "node".to_string()
}

/// Settings read from `bini.config.json`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BiniConfig {
    /// Pages root, relative to the project root
    #[serde(default = "default_app_dir")]
    pub app_dir: PathBuf,

    /// Directory generated imports are relative to
    #[serde(default = "default_src_dir")]
    pub src_dir: PathBuf,

    /// Router file to write instead of `src/App.tsx` / `src/App.jsx`
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub router_file: Option<PathBuf>,

    /// Quiet period before a regeneration pass
    #[serde(default = "default_debounce_ms")]
    pub debounce_ms: u64,

    /// Window in which repeated notifications for one file are dropped
    #[serde(default = "default_suppression_window_ms")]
    pub suppression_window_ms: u64,

    /// How long change-detector entries are kept
    #[serde(default = "default_retention_window_ms")]
    pub retention_window_ms: u64,

    /// Delay before a new directory is checked for a page file
    #[serde(default = "default_dir_grace_ms")]
    pub dir_grace_ms: u64,

    /// Port of the dev reload server
    #[serde(default = "default_port")]
    pub port: u16,

    /// Node.js binary that runs `/api` handlers
    #[serde(default = "default_node")]
    pub node: String,
}

impl Default for BiniConfig {
    fn default() -> Self {
        Self {
            app_dir: default_app_dir(),
            src_dir: default_src_dir(),
            router_file: None,
            debounce_ms: default_debounce_ms(),
            suppression_window_ms: default_suppression_window_ms(),
            retention_window_ms: default_retention_window_ms(),
            dir_grace_ms: default_dir_grace_ms(),
            port: default_port(),
            node: default_node(),
        }
    }
}

impl BiniConfig {
    /// Watch timings as durations.
    pub fn timings(&self) -> WatchTimings {
        WatchTimings {
            debounce: Duration::from_millis(self.debounce_ms),
            suppression_window: Duration::from_millis(self.suppression_window_ms),
            retention_window: Duration::from_millis(self.retention_window_ms),
            dir_grace: Duration::from_millis(self.dir_grace_ms),
        }
    }

    /// Router configuration for the project at `root`.
    pub fn to_router_config(&self, root: &Path) -> RouterConfig {
        let config = RouterConfig::new(root)
            .with_app_dir(&self.app_dir)
            .with_src_dir(&self.src_dir)
            .with_timings(self.timings());

        match &self.router_file {
            Some(file) => config.with_router_file(file),
            None => config,
        }
    }
}
