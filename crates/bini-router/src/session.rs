//! Watch session for one pages root.
//!
//! Wires a notify watcher to the change detector and a regeneration
//! coordinator. Sessions share nothing, so several can run side by side.

use crate::config::RouterConfig;
use crate::coordinator::{CoordinatorHandle, RegenerationCoordinator, RouterEvent, SourceGenerator};
use crate::descriptor::find_page_file;
use crate::detector::{ChangeDetector, Decision, EventKind};
use crate::error::{Result, RouterError};
use notify::event::{CreateKind, ModifyKind, RemoveKind, RenameMode};
use notify::{Event, EventKind as NotifyKind, RecommendedWatcher, RecursiveMode, Watcher};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{broadcast, mpsc};
use tokio::task::JoinHandle;

/// A filesystem notification, normalized to the detector's vocabulary.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FsEvent {
    pub path: PathBuf,
    pub kind: EventKind,
}

impl FsEvent {
    pub fn new(path: impl Into<PathBuf>, kind: EventKind) -> Self {
        Self {
            path: path.into(),
            kind,
        }
    }
}

/// Translate a notify event into zero or more [`FsEvent`]s.
///
/// Removals carry no file type on some platforms; a vanished path with an
/// extension is treated as a file, anything else as a directory.
pub fn map_event(event: &Event) -> Vec<FsEvent> {
    let paths = event.paths.iter();

    match event.kind {
        NotifyKind::Create(CreateKind::Folder) => {
            paths.map(|p| FsEvent::new(p, EventKind::AddDir)).collect()
        }
        NotifyKind::Create(CreateKind::File) => {
            paths.map(|p| FsEvent::new(p, EventKind::Add)).collect()
        }
        NotifyKind::Create(_) => paths.map(|p| appeared(p)).collect(),

        NotifyKind::Remove(RemoveKind::Folder) => {
            paths.map(|p| FsEvent::new(p, EventKind::UnlinkDir)).collect()
        }
        NotifyKind::Remove(RemoveKind::File) => {
            paths.map(|p| FsEvent::new(p, EventKind::Unlink)).collect()
        }
        NotifyKind::Remove(_) => paths.map(|p| vanished(p)).collect(),

        NotifyKind::Modify(ModifyKind::Name(RenameMode::From)) => {
            paths.map(|p| vanished(p)).collect()
        }
        NotifyKind::Modify(ModifyKind::Name(RenameMode::To)) => {
            paths.map(|p| appeared(p)).collect()
        }
        NotifyKind::Modify(ModifyKind::Name(RenameMode::Both)) => paths
            .enumerate()
            .map(|(i, p)| if i == 0 { vanished(p) } else { appeared(p) })
            .collect(),
        NotifyKind::Modify(ModifyKind::Name(_)) => paths
            .map(|p| if p.exists() { appeared(p) } else { vanished(p) })
            .collect(),
        NotifyKind::Modify(_) => paths
            .filter(|p| !p.is_dir())
            .map(|p| FsEvent::new(p, EventKind::Change))
            .collect(),

        _ => Vec::new(),
    }
}

fn appeared(path: &Path) -> FsEvent {
    let kind = if path.is_dir() {
        EventKind::AddDir
    } else {
        EventKind::Add
    };
    FsEvent::new(path, kind)
}

fn vanished(path: &Path) -> FsEvent {
    let kind = if path.extension().is_some() {
        EventKind::Unlink
    } else {
        EventKind::UnlinkDir
    };
    FsEvent::new(path, kind)
}

/// A live watch on one pages root.
pub struct WatchSession {
    _watcher: RecommendedWatcher,
    pages_root: PathBuf,
    detector: Arc<ChangeDetector>,
    coordinator: RegenerationCoordinator,
    pump: JoinHandle<()>,
}

impl WatchSession {
    /// Start watching `config`'s pages root, regenerating its router file.
    ///
    /// `last_emitted` is the source most recently written by someone else
    /// (typically the startup write), so an identical first pass is skipped.
    /// Must be called from within a tokio runtime.
    pub fn start(
        config: RouterConfig,
        events: broadcast::Sender<RouterEvent>,
        last_emitted: Option<String>,
    ) -> Result<Self> {
        let generator = Arc::new(config.clone());
        Self::start_with(generator, &config, events, last_emitted)
    }

    /// Like [`start`](Self::start), with a custom source generator.
    pub fn start_with(
        generator: Arc<dyn SourceGenerator>,
        config: &RouterConfig,
        events: broadcast::Sender<RouterEvent>,
        last_emitted: Option<String>,
    ) -> Result<Self> {
        let pages_root = config.pages_root();
        if !pages_root.is_dir() {
            return Err(RouterError::MissingPagesRoot(pages_root));
        }
        // Notify reports resolved paths on some platforms
        let pages_root = pages_root
            .canonicalize()
            .map_err(|e| RouterError::read(&pages_root, e))?;

        let timings = config.timings;
        let coordinator = RegenerationCoordinator::spawn(generator, timings.debounce, events);
        if let Some(source) = last_emitted {
            coordinator.prime(source);
        }

        let detector = Arc::new(ChangeDetector::new(pages_root.clone(), &timings));
        let (tx, rx) = mpsc::channel(256);

        let mut watcher = notify::recommended_watcher(move |res: notify::Result<Event>| {
            match res {
                Ok(event) => {
                    for fs_event in map_event(&event) {
                        // Receiver is gone once the session stops
                        if tx.blocking_send(fs_event).is_err() {
                            return;
                        }
                    }
                }
                Err(err) => tracing::warn!("File watcher error: {}", err),
            }
        })?;
        watcher.watch(&pages_root, RecursiveMode::Recursive)?;

        tracing::info!("Watching {} for route changes", pages_root.display());

        let pump = tokio::spawn(pump_events(
            rx,
            Arc::clone(&detector),
            coordinator.handle(),
            timings.dir_grace,
        ));

        Ok(Self {
            _watcher: watcher,
            pages_root,
            detector,
            coordinator,
            pump,
        })
    }

    /// Canonical pages root being watched.
    pub fn pages_root(&self) -> &Path {
        &self.pages_root
    }

    pub fn detector(&self) -> &ChangeDetector {
        &self.detector
    }

    pub fn handle(&self) -> CoordinatorHandle {
        self.coordinator.handle()
    }

    pub fn subscribe(&self) -> broadcast::Receiver<RouterEvent> {
        self.coordinator.subscribe()
    }

    /// Feed a notification through the session as if the watcher saw it.
    pub fn inject(&self, event: FsEvent) {
        dispatch(&self.detector, &self.coordinator.handle(), event, self.dir_grace());
    }

    /// Stop watching and shut the coordinator down.
    pub async fn stop(self) {
        drop(self._watcher);
        self.pump.abort();
        self.coordinator.shutdown().await;
        tracing::debug!("Stopped watching {}", self.pages_root.display());
    }

    fn dir_grace(&self) -> Duration {
        self.detector.dir_grace()
    }
}

async fn pump_events(
    mut rx: mpsc::Receiver<FsEvent>,
    detector: Arc<ChangeDetector>,
    handle: CoordinatorHandle,
    dir_grace: Duration,
) {
    while let Some(event) = rx.recv().await {
        dispatch(&detector, &handle, event, dir_grace);
    }
}

fn dispatch(detector: &ChangeDetector, handle: &CoordinatorHandle, event: FsEvent, dir_grace: Duration) {
    let FsEvent { path, kind } = event;

    match detector.classify(&path, kind) {
        Decision::Ignore => {}
        Decision::Trigger => {
            handle.trigger(format!("{} {}", kind, relative(detector, &path)));
        }
        Decision::CheckDirectory => {
            let handle = handle.clone();
            let reason = format!("{} {}", kind, relative(detector, &path));
            tokio::spawn(async move {
                tokio::time::sleep(dir_grace).await;
                if find_page_file(&path).is_some() {
                    handle.trigger(reason);
                } else {
                    tracing::debug!("New directory {} has no page yet", path.display());
                }
            });
        }
    }
}

fn relative(detector: &ChangeDetector, path: &Path) -> String {
    path.strip_prefix(detector.pages_root())
        .unwrap_or(path)
        .display()
        .to_string()
}
