//! Change detector: decides which filesystem notifications can affect the
//! route table, and drops repeats of the same notification.

use crate::config::WatchTimings;
use crate::descriptor::{is_not_found_file, is_page_file, is_skipped_name};
use parking_lot::Mutex;
use serde::Serialize;
use std::collections::HashMap;
use std::fmt;
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};

/// Kind of filesystem notification.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum EventKind {
    Add,
    Unlink,
    Change,
    AddDir,
    UnlinkDir,
}

impl fmt::Display for EventKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            EventKind::Add => "add",
            EventKind::Unlink => "unlink",
            EventKind::Change => "change",
            EventKind::AddDir => "addDir",
            EventKind::UnlinkDir => "unlinkDir",
        };
        f.write_str(name)
    }
}

/// What to do with a notification.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Decision {
    /// Cannot affect routes, or is a suppressed repeat
    Ignore,
    /// Request a regeneration now
    Trigger,
    /// A directory appeared; wait the grace delay, then regenerate only if
    /// it holds a page file
    CheckDirectory,
}

/// Filters and de-duplicates notifications for one pages root.
///
/// The event log is shared with the watcher's callback thread, so it sits
/// behind a mutex.
#[derive(Debug)]
pub struct ChangeDetector {
    pages_root: PathBuf,
    suppression_window: Duration,
    retention_window: Duration,
    dir_grace: Duration,
    log: Mutex<HashMap<(PathBuf, EventKind), Instant>>,
}

impl ChangeDetector {
    pub fn new(pages_root: impl Into<PathBuf>, timings: &WatchTimings) -> Self {
        Self {
            pages_root: pages_root.into(),
            suppression_window: timings.suppression_window,
            retention_window: timings.retention_window.max(timings.suppression_window),
            dir_grace: timings.dir_grace,
            log: Mutex::new(HashMap::new()),
        }
    }

    pub fn pages_root(&self) -> &Path {
        &self.pages_root
    }

    /// Delay before a new directory is checked for a page file.
    pub fn dir_grace(&self) -> Duration {
        self.dir_grace
    }

    /// Accept `(file, kind)` unless the same pair was accepted within the
    /// suppression window.
    pub fn should_process(&self, file: &Path, kind: EventKind) -> bool {
        self.should_process_at(file, kind, Instant::now())
    }

    /// [`should_process`](Self::should_process) with an explicit clock.
    ///
    /// Entries older than the retention window are evicted on every call.
    /// Only accepted notifications refresh a pair's timestamp.
    pub fn should_process_at(&self, file: &Path, kind: EventKind, now: Instant) -> bool {
        let mut log = self.log.lock();

        let retention = self.retention_window;
        log.retain(|_, seen| now.saturating_duration_since(*seen) <= retention);

        let key = (file.to_path_buf(), kind);
        if let Some(seen) = log.get(&key) {
            if now.saturating_duration_since(*seen) < self.suppression_window {
                return false;
            }
        }

        log.insert(key, now);
        true
    }

    /// Decide what a notification means for the route table.
    pub fn classify(&self, path: &Path, kind: EventKind) -> Decision {
        self.classify_at(path, kind, Instant::now())
    }

    pub fn classify_at(&self, path: &Path, kind: EventKind, now: Instant) -> Decision {
        if !self.is_watched_path(path) {
            return Decision::Ignore;
        }

        match kind {
            EventKind::Add | EventKind::Unlink | EventKind::Change => {
                let relevant = is_page_file(path) || is_not_found_file(path);
                if relevant && self.should_process_at(path, kind, now) {
                    Decision::Trigger
                } else {
                    Decision::Ignore
                }
            }
            EventKind::AddDir => Decision::CheckDirectory,
            EventKind::UnlinkDir => Decision::Trigger,
        }
    }

    /// Number of (file, kind) pairs currently remembered.
    pub fn tracked_events(&self) -> usize {
        self.log.lock().len()
    }

    fn is_watched_path(&self, path: &Path) -> bool {
        match path.strip_prefix(&self.pages_root) {
            Ok(relative) => !relative
                .components()
                .any(|c| is_skipped_name(&c.as_os_str().to_string_lossy())),
            Err(_) => false,
        }
    }
}
