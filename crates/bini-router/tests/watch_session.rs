//! Integration tests for watch sessions: change detection, debouncing and
//! pass serialization against real directory trees.

use bini_router::{
    EventKind, FsEvent, Result, RouterConfig, RouterEvent, SourceGenerator, WatchSession,
    WatchTimings,
};
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tempfile::TempDir;
use tokio::sync::broadcast;
use tokio::time::{sleep, timeout};

const PAGE: &str = "export default function Page() { return null; }";

fn project() -> TempDir {
    let temp = TempDir::new().unwrap();
    let app = temp.path().join("src/app");
    fs::create_dir_all(&app).unwrap();
    fs::write(app.join("page.tsx"), PAGE).unwrap();
    temp
}

fn config(root: &Path, suppression: Duration) -> RouterConfig {
    RouterConfig::new(root).with_timings(WatchTimings {
        debounce: Duration::from_millis(20),
        suppression_window: suppression,
        retention_window: suppression * 4,
        dir_grace: Duration::from_millis(100),
    })
}

/// Wraps the real generator to count passes and detect overlap.
struct CountingGenerator {
    inner: RouterConfig,
    delay: Duration,
    calls: AtomicUsize,
    active: AtomicUsize,
    max_active: AtomicUsize,
}

impl CountingGenerator {
    fn new(inner: RouterConfig, delay: Duration) -> Arc<Self> {
        Arc::new(Self {
            inner,
            delay,
            calls: AtomicUsize::new(0),
            active: AtomicUsize::new(0),
            max_active: AtomicUsize::new(0),
        })
    }

    fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

impl SourceGenerator for CountingGenerator {
    fn generate(&self) -> Result<String> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let now = self.active.fetch_add(1, Ordering::SeqCst) + 1;
        self.max_active.fetch_max(now, Ordering::SeqCst);
        std::thread::sleep(self.delay);
        let code = bini_router::generate(&self.inner);
        self.active.fetch_sub(1, Ordering::SeqCst);
        // Unique output so every pass writes
        Ok(format!("{}// pass {}\n", code, self.calls()))
    }

    fn target(&self) -> PathBuf {
        self.inner.router_path()
    }
}

async fn next_regenerated(rx: &mut broadcast::Receiver<RouterEvent>) -> (PathBuf, String) {
    loop {
        let event = timeout(Duration::from_secs(10), rx.recv())
            .await
            .expect("timed out waiting for regeneration")
            .expect("event channel closed");
        if let RouterEvent::Regenerated { file, reason, .. } = event {
            return (file, reason);
        }
    }
}

fn add_page(session: &WatchSession, dir: &str) -> PathBuf {
    let dir = session.pages_root().join(dir);
    fs::create_dir_all(&dir).unwrap();
    let file = dir.join("page.tsx");
    fs::write(&file, PAGE).unwrap();
    file
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_new_page_is_picked_up_by_watcher() {
    let temp = project();
    let config = config(temp.path(), Duration::from_millis(500));
    let (events, mut rx) = broadcast::channel(64);

    let session = WatchSession::start(config.clone(), events, None).unwrap();
    // Give the backend a moment to register its watches
    sleep(Duration::from_millis(100)).await;
    add_page(&session, "contact");

    let (file, _) = next_regenerated(&mut rx).await;
    session.handle().settled().await;
    let written = fs::read_to_string(file).unwrap();
    assert!(written.contains(r#"path="/contact""#));

    session.stop().await;
}

#[tokio::test]
async fn test_injected_add_triggers_pass_and_full_reload() {
    let temp = project();
    let config = config(temp.path(), Duration::from_millis(500));
    let (events, mut rx) = broadcast::channel(64);

    let session = WatchSession::start(config.clone(), events, None).unwrap();
    let file = add_page(&session, "about");
    session.inject(FsEvent::new(&file, EventKind::Add));

    let (_, reason) = next_regenerated(&mut rx).await;
    assert!(reason.contains("about"));
    let reload = timeout(Duration::from_secs(5), rx.recv()).await.unwrap().unwrap();
    assert_eq!(reload, RouterEvent::FullReload);

    session.stop().await;
}

#[tokio::test]
async fn test_repeated_notification_is_suppressed() {
    let temp = project();
    let config = config(temp.path(), Duration::from_secs(5));
    let generator = CountingGenerator::new(config.clone(), Duration::ZERO);
    let (events, mut rx) = broadcast::channel(64);

    let session = WatchSession::start_with(generator.clone(), &config, events, None).unwrap();
    let file = session.pages_root().join("page.tsx");

    session.inject(FsEvent::new(&file, EventKind::Change));
    next_regenerated(&mut rx).await;
    session.handle().settled().await;

    session.inject(FsEvent::new(&file, EventKind::Change));
    session.handle().settled().await;

    assert_eq!(generator.calls(), 1);
    session.stop().await;
}

#[tokio::test]
async fn test_irrelevant_files_are_ignored() {
    let temp = project();
    let config = config(temp.path(), Duration::from_millis(500));
    let generator = CountingGenerator::new(config.clone(), Duration::ZERO);
    let (events, _rx) = broadcast::channel(64);

    let session = WatchSession::start_with(generator.clone(), &config, events, None).unwrap();
    let root = session.pages_root().to_path_buf();
    session.inject(FsEvent::new(root.join("globals.css"), EventKind::Change));
    session.inject(FsEvent::new(root.join("node_modules/x/page.tsx"), EventKind::Add));
    session.inject(FsEvent::new(temp.path().join("src/main.tsx"), EventKind::Change));

    sleep(Duration::from_millis(200)).await;
    assert_eq!(generator.calls(), 0);
    session.stop().await;
}

#[tokio::test]
async fn test_passes_never_overlap() {
    let temp = project();
    let config = config(temp.path(), Duration::from_millis(1));
    let generator = CountingGenerator::new(config.clone(), Duration::from_millis(300));
    let (events, _rx) = broadcast::channel(64);

    let session = WatchSession::start_with(generator.clone(), &config, events, None).unwrap();
    let handle = session.handle();

    handle.trigger("first");
    sleep(Duration::from_millis(60)).await;
    // Arrive while the first pass is running; coalesce into one follow-up
    for i in 0..5 {
        handle.trigger(format!("during {}", i));
        sleep(Duration::from_millis(15)).await;
    }

    sleep(Duration::from_millis(100)).await;
    handle.settled().await;

    assert_eq!(generator.max_active.load(Ordering::SeqCst), 1);
    assert_eq!(generator.calls(), 2);
    session.stop().await;
}

#[tokio::test]
async fn test_new_directory_waits_for_page() {
    let temp = project();
    let app = temp.path().join("src/app");
    fs::create_dir_all(app.join("empty")).unwrap();
    fs::create_dir_all(app.join("users/[id]")).unwrap();
    fs::write(app.join("users/page.tsx"), PAGE).unwrap();
    fs::write(app.join("users/[id]/page.tsx"), PAGE).unwrap();

    let config = config(temp.path(), Duration::from_millis(500));
    let generator = CountingGenerator::new(config.clone(), Duration::ZERO);
    let (events, mut rx) = broadcast::channel(64);
    let session = WatchSession::start_with(generator.clone(), &config, events, None).unwrap();

    session.inject(FsEvent::new(session.pages_root().join("empty"), EventKind::AddDir));
    sleep(Duration::from_millis(250)).await;
    assert_eq!(generator.calls(), 0);

    session.inject(FsEvent::new(session.pages_root().join("users"), EventKind::AddDir));
    sleep(Duration::from_millis(50)).await;
    // Still inside the grace period
    assert_eq!(generator.calls(), 0);

    let (file, reason) = next_regenerated(&mut rx).await;
    assert_eq!(reason, "addDir users");
    let code = fs::read_to_string(file).unwrap();
    assert_eq!(code.matches(r#"path="/users""#).count(), 1);
    let users = code.find(r#"path="/users""#).unwrap();
    let user = code.find(r#"path="/users/:id""#).unwrap();
    assert!(users < user);
    session.stop().await;
}

#[tokio::test]
async fn test_removed_directory_triggers_pass() {
    let temp = project();
    let config = config(temp.path(), Duration::from_millis(500));
    let (events, mut rx) = broadcast::channel(64);

    let session = WatchSession::start(config.clone(), events, None).unwrap();
    let dir = session.pages_root().join("old");
    session.inject(FsEvent::new(&dir, EventKind::UnlinkDir));

    let (_, reason) = next_regenerated(&mut rx).await;
    assert_eq!(reason, "unlinkDir old");
    session.stop().await;
}

#[tokio::test]
async fn test_primed_session_skips_identical_pass() {
    let temp = project();
    let config = config(temp.path(), Duration::from_millis(500));
    let (_, written) = bini_router::write_router(&config).unwrap();
    let (events, mut rx) = broadcast::channel(64);

    let session = WatchSession::start(config.clone(), events, Some(written)).unwrap();
    session.handle().trigger("no-op");
    session.handle().settled().await;

    assert!(rx.try_recv().is_err());
    session.stop().await;
}

#[tokio::test]
async fn test_independent_sessions() {
    let first = project();
    let second = project();
    let (events_a, mut rx_a) = broadcast::channel(64);
    let (events_b, mut rx_b) = broadcast::channel(64);

    let a = WatchSession::start(config(first.path(), Duration::from_millis(500)), events_a, None)
        .unwrap();
    let b = WatchSession::start(config(second.path(), Duration::from_millis(500)), events_b, None)
        .unwrap();

    let file = add_page(&a, "only-a");
    a.inject(FsEvent::new(&file, EventKind::Add));
    next_regenerated(&mut rx_a).await;
    a.handle().settled().await;
    b.handle().settled().await;

    assert!(rx_b.try_recv().is_err());
    assert!(!second.path().join("src/App.jsx").exists());

    a.stop().await;
    b.stop().await;
}
