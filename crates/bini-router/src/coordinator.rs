//! Regeneration coordinator.
//!
//! One task owns all regeneration state. Triggers arrive over a channel and
//! reset a single debounce deadline; when it expires a pass runs unless one
//! is already in flight, in which case exactly one follow-up pass is queued.
//! Passes never overlap and never propagate failures to the caller.

use crate::config::RouterConfig;
use crate::error::{Result, RouterError};
use serde::Serialize;
use std::path::PathBuf;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{broadcast, mpsc, watch};
use tokio::task::JoinHandle;
use tokio::time::{sleep_until, Instant};

/// Produces router source and names the file it belongs in.
///
/// Called on a blocking thread; implementations may do filesystem I/O.
pub trait SourceGenerator: Send + Sync + 'static {
    /// Render the full router source.
    fn generate(&self) -> Result<String>;

    /// File the rendered source is written to.
    fn target(&self) -> PathBuf;
}

impl SourceGenerator for RouterConfig {
    fn generate(&self) -> Result<String> {
        Ok(crate::generate(self))
    }

    fn target(&self) -> PathBuf {
        self.router_path()
    }
}

/// Notifications published by the coordinator.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "type", rename_all = "kebab-case")]
pub enum RouterEvent {
    /// The router file was rewritten
    Regenerated {
        file: PathBuf,
        bytes: usize,
        reason: String,
    },
    /// Clients should do a full page reload
    FullReload,
    /// A pass failed; the previous router file is left in place
    Failed { error: String },
}

/// Observable coordinator state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CoordinatorState {
    Idle,
    /// A trigger is waiting out the debounce delay
    Debouncing,
    /// A pass is running; `queued` means another pass follows it
    Building { queued: bool },
    Stopped,
}

enum Command {
    Trigger(String),
    Prime(String),
    Shutdown,
}

/// Cheap, cloneable handle for talking to a running coordinator.
///
/// All methods are non-blocking and safe to call from any thread. Once the
/// coordinator has stopped they do nothing.
#[derive(Clone)]
pub struct CoordinatorHandle {
    commands: mpsc::UnboundedSender<Command>,
    state: watch::Receiver<CoordinatorState>,
    events: broadcast::Sender<RouterEvent>,
    pending: Arc<AtomicUsize>,
}

impl CoordinatorHandle {
    /// Request a regeneration. Never fails and never blocks.
    pub fn trigger(&self, reason: impl Into<String>) {
        self.pending.fetch_add(1, Ordering::SeqCst);
        if self.commands.send(Command::Trigger(reason.into())).is_err() {
            self.pending.fetch_sub(1, Ordering::SeqCst);
        }
    }

    /// Record `source` as already written, so an identical pass is a no-op.
    pub fn prime(&self, source: String) {
        let _ = self.commands.send(Command::Prime(source));
    }

    pub fn state(&self) -> CoordinatorState {
        *self.state.borrow()
    }

    pub fn subscribe(&self) -> broadcast::Receiver<RouterEvent> {
        self.events.subscribe()
    }

    /// Wait until no trigger is pending and no pass is running.
    ///
    /// Triggers sent before the call are counted even if the coordinator
    /// task has not picked them up yet.
    pub async fn settled(&self) {
        let mut state = self.state.clone();
        loop {
            // Counter first: a trigger is uncounted only after its state
            // has been published.
            let pending = self.pending.load(Ordering::SeqCst);
            match *state.borrow_and_update() {
                CoordinatorState::Stopped => return,
                CoordinatorState::Idle if pending == 0 => return,
                _ => {}
            }
            if state.changed().await.is_err() {
                return;
            }
        }
    }
}

/// A running coordinator task.
pub struct RegenerationCoordinator {
    handle: CoordinatorHandle,
    task: JoinHandle<()>,
}

impl RegenerationCoordinator {
    /// Spawn the coordinator on the current tokio runtime.
    pub fn spawn(
        generator: Arc<dyn SourceGenerator>,
        debounce: Duration,
        events: broadcast::Sender<RouterEvent>,
    ) -> Self {
        let (command_tx, command_rx) = mpsc::unbounded_channel();
        let (state_tx, state_rx) = watch::channel(CoordinatorState::Idle);
        let pending = Arc::new(AtomicUsize::new(0));

        let worker = Worker {
            generator,
            debounce,
            commands: command_rx,
            state: state_tx,
            events: events.clone(),
            deadline: None,
            pass: None,
            queued: false,
            reason: None,
            last_emitted: None,
            pending: Arc::clone(&pending),
        };
        let task = tokio::spawn(worker.run());

        Self {
            handle: CoordinatorHandle {
                commands: command_tx,
                state: state_rx,
                events,
                pending,
            },
            task,
        }
    }

    pub fn handle(&self) -> CoordinatorHandle {
        self.handle.clone()
    }

    pub fn trigger(&self, reason: impl Into<String>) {
        self.handle.trigger(reason);
    }

    pub fn prime(&self, source: String) {
        self.handle.prime(source);
    }

    pub fn state(&self) -> CoordinatorState {
        self.handle.state()
    }

    pub fn subscribe(&self) -> broadcast::Receiver<RouterEvent> {
        self.handle.subscribe()
    }

    pub async fn settled(&self) {
        self.handle.settled().await;
    }

    /// Stop the coordinator.
    ///
    /// A pending debounce is dropped; an in-flight pass is allowed to finish.
    pub async fn shutdown(self) {
        let _ = self.handle.commands.send(Command::Shutdown);
        if let Err(err) = self.task.await {
            tracing::warn!("Regeneration coordinator ended abnormally: {}", err);
        }
    }
}

enum PassOutcome {
    Written {
        code: String,
        target: PathBuf,
        reason: String,
    },
    Unchanged,
    Failed(String),
}

struct Worker {
    generator: Arc<dyn SourceGenerator>,
    debounce: Duration,
    commands: mpsc::UnboundedReceiver<Command>,
    state: watch::Sender<CoordinatorState>,
    events: broadcast::Sender<RouterEvent>,
    deadline: Option<Instant>,
    pass: Option<JoinHandle<PassOutcome>>,
    queued: bool,
    reason: Option<String>,
    last_emitted: Option<String>,
    /// Triggers sent but not yet taken off the channel
    pending: Arc<AtomicUsize>,
}

impl Worker {
    async fn run(mut self) {
        loop {
            let deadline = self.deadline;
            let building = self.pass.is_some();
            let mut received = false;

            tokio::select! {
                command = self.commands.recv() => match command {
                    Some(Command::Trigger(reason)) => {
                        tracing::debug!("Regeneration requested: {}", reason);
                        self.reason = Some(reason);
                        self.deadline = Some(Instant::now() + self.debounce);
                        received = true;
                    }
                    Some(Command::Prime(source)) => self.last_emitted = Some(source),
                    Some(Command::Shutdown) | None => break,
                },

                _ = sleep_until(deadline.unwrap_or_else(Instant::now)), if deadline.is_some() => {
                    self.deadline = None;
                    if building {
                        self.queued = true;
                    } else {
                        self.start_pass();
                    }
                }

                outcome = join_pass(&mut self.pass), if building => {
                    self.pass = None;
                    self.finish_pass(outcome);
                    if self.queued {
                        self.queued = false;
                        self.start_pass();
                    }
                }
            }

            self.publish_state();
            // Only after the Debouncing state is visible
            if received {
                self.pending.fetch_sub(1, Ordering::SeqCst);
            }
        }

        if let Some(pass) = self.pass.take() {
            let outcome = match pass.await {
                Ok(outcome) => outcome,
                Err(err) => PassOutcome::Failed(RouterError::TaskFailed(err.to_string()).to_string()),
            };
            self.finish_pass(outcome);
        }

        self.state.send_replace(CoordinatorState::Stopped);
    }

    fn start_pass(&mut self) {
        let generator = Arc::clone(&self.generator);
        let previous = self.last_emitted.clone();
        let reason = self.reason.take().unwrap_or_else(|| "queued".to_string());
        self.pass = Some(tokio::spawn(run_pass(generator, previous, reason)));
    }

    fn finish_pass(&mut self, outcome: PassOutcome) {
        match outcome {
            PassOutcome::Written {
                code,
                target,
                reason,
            } => {
                tracing::info!("Routes regenerated: {} ({})", target.display(), reason);
                let bytes = code.len();
                self.last_emitted = Some(code);
                let _ = self.events.send(RouterEvent::Regenerated {
                    file: target,
                    bytes,
                    reason,
                });
                let _ = self.events.send(RouterEvent::FullReload);
            }
            PassOutcome::Unchanged => {
                tracing::debug!("Routes unchanged, skipping write");
            }
            PassOutcome::Failed(error) => {
                tracing::error!("Route regeneration failed: {}", error);
                let _ = self.events.send(RouterEvent::Failed { error });
            }
        }
    }

    fn publish_state(&self) {
        let state = match (&self.pass, self.deadline) {
            (Some(_), _) => CoordinatorState::Building {
                queued: self.queued,
            },
            (None, Some(_)) => CoordinatorState::Debouncing,
            (None, None) => CoordinatorState::Idle,
        };
        self.state.send_if_modified(|current| {
            if *current == state {
                false
            } else {
                *current = state;
                true
            }
        });
    }
}

async fn join_pass(pass: &mut Option<JoinHandle<PassOutcome>>) -> PassOutcome {
    match pass {
        Some(handle) => match handle.await {
            Ok(outcome) => outcome,
            Err(err) => PassOutcome::Failed(RouterError::TaskFailed(err.to_string()).to_string()),
        },
        None => std::future::pending().await,
    }
}

/// One regeneration pass: generate, compare, write if changed.
async fn run_pass(
    generator: Arc<dyn SourceGenerator>,
    previous: Option<String>,
    reason: String,
) -> PassOutcome {
    let generated = tokio::task::spawn_blocking(move || {
        let code = generator.generate()?;
        Ok::<_, RouterError>((code, generator.target()))
    })
    .await;

    let (code, target) = match generated {
        Ok(Ok(pair)) => pair,
        Ok(Err(err)) => return PassOutcome::Failed(err.to_string()),
        Err(err) => {
            return PassOutcome::Failed(RouterError::TaskFailed(err.to_string()).to_string())
        }
    };

    if previous.as_deref() == Some(code.as_str()) {
        return PassOutcome::Unchanged;
    }

    if let Err(err) = tokio::fs::write(&target, &code).await {
        return PassOutcome::Failed(RouterError::write(&target, err).to_string());
    }

    PassOutcome::Written {
        code,
        target,
        reason,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use parking_lot::Mutex;
    use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
    use tempfile::TempDir;

    struct FakeGenerator {
        output: Mutex<String>,
        target: PathBuf,
        fail: AtomicBool,
        calls: AtomicUsize,
    }

    impl FakeGenerator {
        fn new(target: PathBuf) -> Arc<Self> {
            Arc::new(Self {
                output: Mutex::new("v1".to_string()),
                target,
                fail: AtomicBool::new(false),
                calls: AtomicUsize::new(0),
            })
        }
    }

    impl SourceGenerator for FakeGenerator {
        fn generate(&self) -> Result<String> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            if self.fail.load(Ordering::SeqCst) {
                return Err(RouterError::TaskFailed("boom".to_string()));
            }
            Ok(self.output.lock().clone())
        }

        fn target(&self) -> PathBuf {
            self.target.clone()
        }
    }

    async fn next_event(rx: &mut broadcast::Receiver<RouterEvent>) -> RouterEvent {
        tokio::time::timeout(Duration::from_secs(5), rx.recv())
            .await
            .expect("timed out waiting for event")
            .expect("event channel closed")
    }

    #[tokio::test]
    async fn test_trigger_writes_and_signals_reload() {
        let temp = TempDir::new().unwrap();
        let target = temp.path().join("App.jsx");
        let generator = FakeGenerator::new(target.clone());
        let (events, mut rx) = broadcast::channel(16);

        let coordinator =
            RegenerationCoordinator::spawn(generator.clone(), Duration::from_millis(10), events);
        coordinator.trigger("test");

        assert!(matches!(next_event(&mut rx).await, RouterEvent::Regenerated { .. }));
        assert_eq!(next_event(&mut rx).await, RouterEvent::FullReload);
        assert_eq!(std::fs::read_to_string(&target).unwrap(), "v1");

        coordinator.shutdown().await;
    }

    #[tokio::test]
    async fn test_triggers_within_debounce_coalesce() {
        let temp = TempDir::new().unwrap();
        let generator = FakeGenerator::new(temp.path().join("App.jsx"));
        let (events, mut rx) = broadcast::channel(16);

        let coordinator =
            RegenerationCoordinator::spawn(generator.clone(), Duration::from_millis(50), events);
        for i in 0..5 {
            coordinator.trigger(format!("burst {}", i));
        }

        next_event(&mut rx).await;
        tokio::time::sleep(Duration::from_millis(150)).await;
        coordinator.settled().await;

        assert_eq!(generator.calls.load(Ordering::SeqCst), 1);
        coordinator.shutdown().await;
    }

    #[tokio::test]
    async fn test_primed_source_is_not_rewritten() {
        let temp = TempDir::new().unwrap();
        let target = temp.path().join("App.jsx");
        let generator = FakeGenerator::new(target.clone());
        let (events, mut rx) = broadcast::channel(16);

        let coordinator =
            RegenerationCoordinator::spawn(generator.clone(), Duration::from_millis(10), events);
        coordinator.prime("v1".to_string());
        coordinator.trigger("no-op");
        coordinator.settled().await;

        assert_eq!(generator.calls.load(Ordering::SeqCst), 1);
        assert!(!target.exists());
        assert!(matches!(
            rx.try_recv(),
            Err(broadcast::error::TryRecvError::Empty)
        ));
        coordinator.shutdown().await;
    }

    #[tokio::test]
    async fn test_failure_is_reported_and_retried_later() {
        let temp = TempDir::new().unwrap();
        let target = temp.path().join("App.jsx");
        let generator = FakeGenerator::new(target.clone());
        generator.fail.store(true, Ordering::SeqCst);
        let (events, mut rx) = broadcast::channel(16);

        let coordinator =
            RegenerationCoordinator::spawn(generator.clone(), Duration::from_millis(10), events);
        coordinator.trigger("first");

        match next_event(&mut rx).await {
            RouterEvent::Failed { error } => assert!(error.contains("boom")),
            other => panic!("expected failure, got {:?}", other),
        }
        assert!(!target.exists());
        coordinator.settled().await;
        assert_eq!(coordinator.state(), CoordinatorState::Idle);

        // Failed passes leave last_emitted untouched, so the retry writes
        generator.fail.store(false, Ordering::SeqCst);
        coordinator.trigger("second");
        assert!(matches!(next_event(&mut rx).await, RouterEvent::Regenerated { .. }));
        assert_eq!(std::fs::read_to_string(&target).unwrap(), "v1");

        coordinator.shutdown().await;
    }

    #[tokio::test]
    async fn test_write_failure_is_not_propagated() {
        let temp = TempDir::new().unwrap();
        let target = temp.path().join("missing-dir").join("App.jsx");
        let generator = FakeGenerator::new(target);
        let (events, mut rx) = broadcast::channel(16);

        let coordinator =
            RegenerationCoordinator::spawn(generator, Duration::from_millis(10), events);
        coordinator.trigger("write");

        match next_event(&mut rx).await {
            RouterEvent::Failed { error } => assert!(error.contains("Failed to write")),
            other => panic!("expected failure, got {:?}", other),
        }
        coordinator.shutdown().await;
    }

    #[tokio::test]
    async fn test_shutdown_stops_and_ignores_later_triggers() {
        let temp = TempDir::new().unwrap();
        let generator = FakeGenerator::new(temp.path().join("App.jsx"));
        let (events, _rx) = broadcast::channel(16);

        let coordinator =
            RegenerationCoordinator::spawn(generator.clone(), Duration::from_millis(10), events);
        let handle = coordinator.handle();
        coordinator.shutdown().await;

        handle.trigger("after stop");
        assert_eq!(handle.state(), CoordinatorState::Stopped);
        tokio::time::sleep(Duration::from_millis(50)).await;
        assert_eq!(generator.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_settled_waits_for_unprocessed_trigger() {
        let temp = TempDir::new().unwrap();
        let target = temp.path().join("App.jsx");
        let generator = FakeGenerator::new(target.clone());
        let (events, _rx) = broadcast::channel(16);

        let coordinator =
            RegenerationCoordinator::spawn(generator.clone(), Duration::from_millis(20), events);
        coordinator.trigger("immediate");
        coordinator.settled().await;

        assert_eq!(generator.calls.load(Ordering::SeqCst), 1);
        assert_eq!(std::fs::read_to_string(&target).unwrap(), "v1");
        assert_eq!(coordinator.state(), CoordinatorState::Idle);
        coordinator.shutdown().await;
    }

    #[test]
    fn test_router_event_serialization() {
        let json = serde_json::to_string(&RouterEvent::FullReload).unwrap();
        assert_eq!(json, r#"{"type":"full-reload"}"#);

        let json = serde_json::to_string(&RouterEvent::Failed {
            error: "x".to_string(),
        })
        .unwrap();
        assert_eq!(json, r#"{"type":"failed","error":"x"}"#);
    }
}
