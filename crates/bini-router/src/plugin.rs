//! Dev server plugin hooks.
//!
//! A [`DevPlugin`] exposes the lifecycle hooks a dev server calls, each with
//! a no-op default so plugins implement only what they need. The
//! [`PluginContainer`] runs hooks across all registered plugins in
//! registration order.

use crate::config::RouterConfig;
use crate::coordinator::RouterEvent;
use crate::error::Result;
use crate::session::WatchSession;
use async_trait::async_trait;
use parking_lot::Mutex;
use std::path::Path;
use std::sync::Arc;
use tokio::sync::broadcast;

/// What a plugin wants done with a changed file.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HotUpdate {
    /// No opinion; later plugins or the server default decide
    Default,
    /// The plugin dealt with the change; nothing else should happen
    Handled,
    /// Connected clients should reload the whole page
    FullReload,
}

/// Lifecycle hooks called by the dev server and the build.
#[async_trait]
pub trait DevPlugin: Send + Sync {
    /// Plugin name, used in logs.
    fn name(&self) -> &'static str;

    /// Called once when configuration is resolved, before anything starts.
    fn config(&self) -> Result<()> {
        Ok(())
    }

    /// Called once the dev server exists, so the plugin can attach watchers.
    async fn configure_server(&self, _ctx: &mut ServerContext) -> Result<()> {
        Ok(())
    }

    /// Called at the start of a production build.
    fn build_start(&self) -> Result<()> {
        Ok(())
    }

    /// Called for source files that changed outside any watch session.
    fn handle_hot_update(&self, _file: &Path) -> HotUpdate {
        HotUpdate::Default
    }
}

/// What plugins can reach while configuring the dev server.
pub struct ServerContext {
    events: broadcast::Sender<RouterEvent>,
    sessions: Vec<WatchSession>,
}

impl ServerContext {
    pub fn new(events: broadcast::Sender<RouterEvent>) -> Self {
        Self {
            events,
            sessions: Vec::new(),
        }
    }

    /// Sender used to notify connected clients.
    pub fn events(&self) -> broadcast::Sender<RouterEvent> {
        self.events.clone()
    }

    pub fn subscribe(&self) -> broadcast::Receiver<RouterEvent> {
        self.events.subscribe()
    }

    /// Ask every connected client to reload.
    pub fn send_full_reload(&self) {
        let _ = self.events.send(RouterEvent::FullReload);
    }

    /// Keep a watch session alive for the lifetime of the server.
    pub fn attach(&mut self, session: WatchSession) {
        self.sessions.push(session);
    }

    pub fn sessions(&self) -> &[WatchSession] {
        &self.sessions
    }

    /// Stop every attached watch session.
    pub async fn close(&mut self) {
        for session in self.sessions.drain(..) {
            session.stop().await;
        }
    }
}

/// Keeps the router file in sync with the pages root.
pub struct RouterPlugin {
    config: RouterConfig,
    last_written: Mutex<Option<String>>,
}

impl RouterPlugin {
    pub fn new(config: RouterConfig) -> Self {
        Self {
            config,
            last_written: Mutex::new(None),
        }
    }

    pub fn router_config(&self) -> &RouterConfig {
        &self.config
    }

    /// Source most recently written by a hook, if any.
    pub fn last_written(&self) -> Option<String> {
        self.last_written.lock().clone()
    }

    fn write(&self) -> Result<()> {
        let (path, source) = crate::write_router(&self.config)?;
        tracing::debug!("Router written to {}", path.display());
        *self.last_written.lock() = Some(source);
        Ok(())
    }
}

#[async_trait]
impl DevPlugin for RouterPlugin {
    fn name(&self) -> &'static str {
        "bini-router"
    }

    fn config(&self) -> Result<()> {
        let pages_root = self.config.pages_root();
        if !pages_root.is_dir() {
            tracing::warn!(
                "{} not found - file-based routing disabled",
                pages_root.display()
            );
            return Ok(());
        }
        self.write()
    }

    async fn configure_server(&self, ctx: &mut ServerContext) -> Result<()> {
        if !self.config.pages_root().is_dir() {
            return Ok(());
        }
        let session = WatchSession::start(self.config.clone(), ctx.events(), self.last_written())?;
        ctx.attach(session);
        Ok(())
    }

    fn build_start(&self) -> Result<()> {
        if !self.config.pages_root().is_dir() {
            return Ok(());
        }
        self.write()
    }

    fn handle_hot_update(&self, file: &Path) -> HotUpdate {
        // The watch session already reloads clients after rewriting it
        if file == self.config.router_path() {
            HotUpdate::Handled
        } else {
            HotUpdate::Default
        }
    }
}

/// Forces a full reload when a root layout file changes.
pub struct LayoutReloadPlugin {
    config: RouterConfig,
}

impl LayoutReloadPlugin {
    pub fn new(config: RouterConfig) -> Self {
        Self { config }
    }
}

#[async_trait]
impl DevPlugin for LayoutReloadPlugin {
    fn name(&self) -> &'static str {
        "bini-layout-reload"
    }

    fn handle_hot_update(&self, file: &Path) -> HotUpdate {
        let pages_root = self.config.pages_root();
        let is_layout = ["layout.tsx", "layout.jsx"]
            .iter()
            .any(|name| file == pages_root.join(name));
        if is_layout {
            HotUpdate::FullReload
        } else {
            HotUpdate::Default
        }
    }
}

/// Ordered set of plugins.
#[derive(Default, Clone)]
pub struct PluginContainer {
    plugins: Vec<Arc<dyn DevPlugin>>,
}

impl PluginContainer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, plugin: impl DevPlugin + 'static) -> Self {
        self.register(Arc::new(plugin));
        self
    }

    pub fn register(&mut self, plugin: Arc<dyn DevPlugin>) {
        tracing::debug!("Registered plugin {}", plugin.name());
        self.plugins.push(plugin);
    }

    pub fn names(&self) -> Vec<&'static str> {
        self.plugins.iter().map(|p| p.name()).collect()
    }

    pub fn config(&self) -> Result<()> {
        for plugin in &self.plugins {
            plugin.config()?;
        }
        Ok(())
    }

    pub async fn configure_server(&self, ctx: &mut ServerContext) -> Result<()> {
        for plugin in &self.plugins {
            plugin.configure_server(ctx).await?;
        }
        Ok(())
    }

    pub fn build_start(&self) -> Result<()> {
        for plugin in &self.plugins {
            plugin.build_start()?;
        }
        Ok(())
    }

    /// First non-default answer wins.
    pub fn handle_hot_update(&self, file: &Path) -> HotUpdate {
        for plugin in &self.plugins {
            let update = plugin.handle_hot_update(file);
            if update != HotUpdate::Default {
                tracing::debug!("{} handled {}: {:?}", plugin.name(), file.display(), update);
                return update;
            }
        }
        HotUpdate::Default
    }
}
