//! Source watcher for plugin hot-update hooks.
//!
//! Watches the source directory and reports changes to files outside
//! `node_modules` and hidden directories. Page additions and removals are
//! handled by the router's own watch session; this watcher exists so that
//! plugins can react to other files such as layouts.

use crate::error::{CliError, Result};
use notify::{Event, RecommendedWatcher, RecursiveMode, Watcher};
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};
use tokio::sync::mpsc;

/// File change event type.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FileChange {
    Modified(PathBuf),
    Created(PathBuf),
    Removed(PathBuf),
}

impl FileChange {
    /// Get the path affected by this change.
    pub fn path(&self) -> &Path {
        match self {
            FileChange::Modified(p) | FileChange::Created(p) | FileChange::Removed(p) => p,
        }
    }
}

/// Recursive watcher with per-file debouncing.
pub struct FileWatcher {
    _watcher: RecommendedWatcher,
    root: PathBuf,
}

impl FileWatcher {
    /// Watch `root` recursively.
    ///
    /// Repeated events for the same file within `debounce_ms` are dropped.
    ///
    /// # Errors
    ///
    /// Returns an error if `root` does not exist or the watcher cannot be
    /// created.
    pub fn new(
        root: PathBuf,
        ignore_patterns: Vec<String>,
        debounce_ms: u64,
    ) -> Result<(Self, mpsc::Receiver<FileChange>)> {
        if !root.exists() {
            return Err(CliError::FileNotFound(root));
        }

        let (tx, rx) = mpsc::channel(100);
        let debounce = Duration::from_millis(debounce_ms);
        let mut last_event: Option<(PathBuf, Instant)> = None;
        let watch_root = root.clone();

        let mut watcher = notify::recommended_watcher(move |res: notify::Result<Event>| {
            let event = match res {
                Ok(event) => event,
                Err(e) => {
                    tracing::warn!("Watch error: {}", e);
                    return;
                }
            };

            for path in &event.paths {
                if should_ignore(path, &watch_root, &ignore_patterns) {
                    continue;
                }

                let now = Instant::now();
                if let Some((last_path, last_time)) = &last_event {
                    if last_path == path && now.duration_since(*last_time) < debounce {
                        continue;
                    }
                }
                last_event = Some((path.clone(), now));

                let change = match event.kind {
                    notify::EventKind::Create(_) => FileChange::Created(path.clone()),
                    notify::EventKind::Modify(_) => FileChange::Modified(path.clone()),
                    notify::EventKind::Remove(_) => FileChange::Removed(path.clone()),
                    _ => continue,
                };

                let _ = tx.blocking_send(change);
            }
        })?;

        watcher.watch(&root, RecursiveMode::Recursive)?;

        Ok((
            Self {
                _watcher: watcher,
                root,
            },
            rx,
        ))
    }

    pub fn root(&self) -> &Path {
        &self.root
    }
}

/// Whether a path should be skipped.
///
/// Paths outside `root`, hidden entries and anything matching a pattern
/// (`name` for a directory, `*.ext` for a suffix) are skipped.
pub fn should_ignore(path: &Path, root: &Path, ignore_patterns: &[String]) -> bool {
    let rel_path = match path.strip_prefix(root) {
        Ok(p) => p,
        Err(_) => return true,
    };

    let path_str = rel_path.to_string_lossy();
    for pattern in ignore_patterns {
        if let Some(ext) = pattern.strip_prefix('*') {
            if path_str.ends_with(ext) {
                return true;
            }
        } else if rel_path
            .components()
            .any(|c| c.as_os_str() == pattern.as_str())
        {
            return true;
        }
    }

    rel_path.components().any(|component| {
        component
            .as_os_str()
            .to_str()
            .is_some_and(|name| name.starts_with('.') && name != "." && name != "..")
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn patterns() -> Vec<String> {
        vec!["node_modules".to_string(), "*.log".to_string()]
    }

    #[test]
    fn test_should_ignore_node_modules() {
        let root = PathBuf::from("/project/src");
        assert!(should_ignore(
            Path::new("/project/src/node_modules/pkg/index.js"),
            &root,
            &patterns()
        ));
        assert!(!should_ignore(
            Path::new("/project/src/app/layout.tsx"),
            &root,
            &patterns()
        ));
    }

    #[test]
    fn test_should_ignore_extension_hidden_and_outside() {
        let root = PathBuf::from("/project/src");
        assert!(should_ignore(Path::new("/project/src/debug.log"), &root, &patterns()));
        assert!(should_ignore(Path::new("/project/src/.cache/x.js"), &root, &patterns()));
        assert!(should_ignore(Path::new("/etc/passwd"), &root, &patterns()));
    }

    #[test]
    fn test_missing_root_is_an_error() {
        let result = FileWatcher::new(PathBuf::from("/no/such/dir"), vec![], 50);
        assert!(matches!(result, Err(CliError::FileNotFound(_))));
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn test_reports_created_file() {
        let temp = tempfile::TempDir::new().unwrap();
        let root = temp.path().canonicalize().unwrap();
        let (watcher, mut rx) = FileWatcher::new(root.clone(), patterns(), 10).unwrap();
        assert_eq!(watcher.root(), root);
        tokio::time::sleep(Duration::from_millis(100)).await;

        let file = root.join("layout.tsx");
        std::fs::write(&file, "export default function Layout() {}").unwrap();

        let change = tokio::time::timeout(Duration::from_secs(10), async {
            loop {
                match rx.recv().await {
                    Some(change) if change.path() == file => break change,
                    Some(_) => continue,
                    None => panic!("watcher channel closed"),
                }
            }
        })
        .await
        .expect("no change reported");
        assert_eq!(change.path(), file.as_path());
    }
}
