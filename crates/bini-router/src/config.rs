//! Router configuration: where pages live, where the router is written,
//! and how quickly the watcher reacts.

use std::path::{Path, PathBuf};
use std::time::Duration;

/// Default pages root, relative to the project root.
pub const DEFAULT_APP_DIR: &str = "src/app";
/// Default import base for generated module paths.
pub const DEFAULT_SRC_DIR: &str = "src";

/// Timing knobs for the watch pipeline.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WatchTimings {
    /// Quiet period after the last trigger before a regeneration pass starts.
    pub debounce: Duration,
    /// Repeats of the same (file, event kind) inside this window are dropped.
    pub suppression_window: Duration,
    /// Event log entries older than this are evicted.
    pub retention_window: Duration,
    /// Delay before probing a freshly created directory for a page file.
    pub dir_grace: Duration,
}

impl Default for WatchTimings {
    fn default() -> Self {
        Self {
            debounce: Duration::from_millis(50),
            suppression_window: Duration::from_millis(500),
            retention_window: Duration::from_millis(2000),
            dir_grace: Duration::from_millis(500),
        }
    }
}

/// Configuration for route discovery and router generation.
///
/// Relative paths are resolved against `root`.
#[derive(Debug, Clone)]
pub struct RouterConfig {
    /// Project root
    pub root: PathBuf,
    /// Pages root (the directory scanned for `page.*` files)
    pub app_dir: PathBuf,
    /// Base directory generated imports are relative to
    pub src_dir: PathBuf,
    /// Explicit router file; when unset, `src/App.tsx` is used if it exists,
    /// otherwise `src/App.jsx`
    pub router_file: Option<PathBuf>,
    /// Watch pipeline timings
    pub timings: WatchTimings,
}

impl RouterConfig {
    /// Create a configuration with default layout for the project at `root`.
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            app_dir: PathBuf::from(DEFAULT_APP_DIR),
            src_dir: PathBuf::from(DEFAULT_SRC_DIR),
            router_file: None,
            timings: WatchTimings::default(),
        }
    }

    pub fn with_app_dir(mut self, app_dir: impl Into<PathBuf>) -> Self {
        self.app_dir = app_dir.into();
        self
    }

    pub fn with_src_dir(mut self, src_dir: impl Into<PathBuf>) -> Self {
        self.src_dir = src_dir.into();
        self
    }

    pub fn with_router_file(mut self, router_file: impl Into<PathBuf>) -> Self {
        self.router_file = Some(router_file.into());
        self
    }

    pub fn with_timings(mut self, timings: WatchTimings) -> Self {
        self.timings = timings;
        self
    }

    /// Absolute pages root.
    pub fn pages_root(&self) -> PathBuf {
        self.resolve(&self.app_dir)
    }

    /// Absolute import base.
    pub fn import_base(&self) -> PathBuf {
        self.resolve(&self.src_dir)
    }

    /// Router file the next pass writes to.
    ///
    /// Re-evaluated on every call so that renaming `App.jsx` to `App.tsx`
    /// between passes is picked up.
    pub fn router_path(&self) -> PathBuf {
        if let Some(ref file) = self.router_file {
            return self.resolve(file);
        }

        let tsx = self.import_base().join("App.tsx");
        if tsx.exists() {
            tsx
        } else {
            self.import_base().join("App.jsx")
        }
    }

    fn resolve(&self, path: &Path) -> PathBuf {
        if path.is_absolute() {
            path.to_path_buf()
        } else {
            self.root.join(path)
        }
    }
}
