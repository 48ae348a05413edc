//! `bini dev`: start Vite, keep the router in sync and push reloads to
//! browsers.

use crate::cli::DevArgs;
use crate::commands::utils;
use crate::config::ConfigOverrides;
use crate::dev::api::ApiDispatcher;
use crate::dev::vite::{self, ViteProcess};
use crate::dev::{DevEvent, DevServer, DevServerState, FileChange, FileWatcher, SharedState};
use crate::error::{CliError, Result};
use crate::plugins::project_plugins;
use crate::ui;
use bini_router::{HotUpdate, PluginContainer, RouterConfig, RouterEvent, ServerContext};
use std::net::SocketAddr;
use std::path::Path;
use std::sync::Arc;
use tokio::sync::{broadcast, mpsc, oneshot};
use tokio::task::JoinHandle;

/// Execute the dev command.
///
/// # Process
///
/// 1. Load configuration and run the `config` hooks (initial router write)
/// 2. Run `configure_server`, which starts the pages watch session
/// 3. Start the reload server unless `--no-server`
/// 4. Start Vite unless `--no-vite`
/// 5. Route source changes through `handle_hot_update` until Ctrl+C or
///    until Vite exits
pub async fn execute(args: DevArgs) -> Result<()> {
    let overrides = ConfigOverrides::default().with_port(args.port);
    let (root, config) = utils::load_project(args.cwd.as_deref(), &overrides)?;
    let router = config.to_router_config(&root);

    let plugins = project_plugins(&router);
    tracing::debug!("Plugins: {}", plugins.names().join(", "));

    // Warns on its own when the pages root is missing
    plugins.config()?;

    let (events, _) = broadcast::channel(256);
    let mut ctx = ServerContext::new(events);
    plugins.configure_server(&mut ctx).await?;
    if !ctx.sessions().is_empty() {
        ui::success(&format!("Watching {}", config.app_dir.display()));
    }

    let api = ApiDispatcher::new(router.pages_root().join("api"), config.node.clone());
    let state: SharedState = Arc::new(DevServerState::new(router.clone()).with_api(api));
    let forwarder = tokio::spawn(forward_events(ctx.subscribe(), state.clone()));

    let import_base = router.import_base();
    let (_watcher, mut changes) = if import_base.is_dir() {
        let (watcher, rx) = FileWatcher::new(
            import_base,
            vec!["node_modules".to_string()],
            config.debounce_ms,
        )?;
        (Some(watcher), Some(rx))
    } else {
        (None, None)
    };

    let (shutdown_tx, shutdown_rx) = oneshot::channel::<()>();
    let mut server = if args.no_server {
        None
    } else {
        let addr = SocketAddr::from(([127, 0, 0, 1], config.port));
        let server = DevServer::new(addr, state.clone());
        Some(tokio::spawn(server.start(async {
            let _ = shutdown_rx.await;
        })))
    };

    let mut vite = if args.no_vite {
        None
    } else {
        start_vite(&root, config.port)
    };

    ui::info("Press Ctrl+C to stop");

    let outcome = loop {
        tokio::select! {
            change = next_change(&mut changes) => match change {
                Some(change) => on_change(&plugins, &ctx, &change),
                None => changes = None,
            },
            result = join_server(&mut server) => {
                server = None;
                break result;
            }
            status = wait_vite(&mut vite) => {
                match status {
                    Ok(status) if status.success() => ui::info("Vite exited"),
                    Ok(status) => ui::warning(&format!("Vite exited with {}", status)),
                    Err(e) => ui::error(&e.to_string()),
                }
                vite = None;
                break Ok(());
            }
            signal = tokio::signal::ctrl_c() => {
                if let Err(e) = signal {
                    tracing::warn!("Failed to listen for Ctrl+C: {}", e);
                }
                break Ok(());
            }
        }
    };

    ui::info("Shutting down...");
    if let Some(vite) = vite {
        vite.stop().await;
    }
    ctx.close().await;
    state.disconnect_all();
    let _ = shutdown_tx.send(());
    if let Some(server) = server {
        let _ = server.await;
    }
    forwarder.abort();

    outcome
}

/// Spawn the project's Vite, or warn and carry on without it.
fn start_vite(root: &Path, port: u16) -> Option<ViteProcess> {
    let Some(binary) = vite::vite_binary(root) else {
        ui::warning("Vite not found in node_modules - run `npm install`, or pass --no-vite");
        return None;
    };
    match ViteProcess::spawn(&binary, root, port) {
        Ok(process) => Some(process),
        Err(e) => {
            ui::warning(&e.to_string());
            None
        }
    }
}

async fn wait_vite(vite: &mut Option<ViteProcess>) -> Result<std::process::ExitStatus> {
    match vite {
        Some(process) => process.wait().await,
        None => std::future::pending().await,
    }
}

/// Apply the plugins' verdict for one changed source file.
fn on_change(plugins: &PluginContainer, ctx: &ServerContext, change: &FileChange) {
    match plugins.handle_hot_update(change.path()) {
        HotUpdate::FullReload => {
            tracing::info!("{} changed, reloading", change.path().display());
            ctx.send_full_reload();
        }
        HotUpdate::Handled => {}
        HotUpdate::Default => tracing::debug!("{:?}", change),
    }
}

async fn next_change(changes: &mut Option<mpsc::Receiver<FileChange>>) -> Option<FileChange> {
    match changes {
        Some(rx) => rx.recv().await,
        None => std::future::pending().await,
    }
}

async fn join_server(server: &mut Option<JoinHandle<Result<()>>>) -> Result<()> {
    match server {
        Some(handle) => match handle.await {
            Ok(result) => result,
            Err(e) => Err(CliError::Server(format!("Server task failed: {}", e))),
        },
        None => std::future::pending().await,
    }
}

/// Relay router events to browsers and the terminal.
async fn forward_events(mut rx: broadcast::Receiver<RouterEvent>, state: SharedState) {
    loop {
        match rx.recv().await {
            Ok(event) => {
                report(&event, state.router());
                if matches!(event, RouterEvent::Regenerated { .. }) {
                    state.refresh_routes();
                }
                state.broadcast(&DevEvent::from(&event)).await;
            }
            Err(broadcast::error::RecvError::Lagged(skipped)) => {
                tracing::warn!("Dropped {} router events", skipped);
            }
            Err(broadcast::error::RecvError::Closed) => break,
        }
    }
}

fn report(event: &RouterEvent, router: &RouterConfig) {
    match event {
        RouterEvent::Regenerated { file, reason, .. } => {
            ui::success(&format!(
                "Regenerated {} ({})",
                relative(file, &router.root),
                reason
            ));
        }
        RouterEvent::Failed { error } => ui::error(&format!("Route regeneration failed: {}", error)),
        RouterEvent::FullReload => tracing::debug!("Full reload sent"),
    }
}

fn relative(path: &Path, root: &Path) -> String {
    path.strip_prefix(root)
        .unwrap_or(path)
        .display()
        .to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use std::time::Duration;
    use tempfile::TempDir;

    #[tokio::test]
    async fn test_layout_change_sends_full_reload() {
        let temp = TempDir::new().unwrap();
        let router = RouterConfig::new(temp.path());
        let plugins = project_plugins(&router);
        let (events, mut rx) = broadcast::channel(8);
        let ctx = ServerContext::new(events);

        let layout = router.pages_root().join("layout.tsx");
        on_change(&plugins, &ctx, &FileChange::Modified(layout));
        assert_eq!(rx.try_recv().unwrap(), RouterEvent::FullReload);

        let handler = router.pages_root().join("api/hello.js");
        on_change(&plugins, &ctx, &FileChange::Modified(handler));
        assert_eq!(rx.try_recv().unwrap(), RouterEvent::FullReload);

        let other = router.pages_root().join("about/page.tsx");
        on_change(&plugins, &ctx, &FileChange::Modified(other));
        assert!(rx.try_recv().is_err());
    }

    #[test]
    fn test_missing_vite_is_not_fatal() {
        let temp = TempDir::new().unwrap();
        assert!(start_vite(temp.path(), 3000).is_none());
    }

    #[tokio::test]
    async fn test_forward_events_reaches_clients() {
        let temp = TempDir::new().unwrap();
        fs::create_dir_all(temp.path().join("src/app")).unwrap();
        let state: SharedState = Arc::new(DevServerState::new(RouterConfig::new(temp.path())));
        let (_, mut client) = state.register_client();

        let (tx, rx) = broadcast::channel(8);
        let task = tokio::spawn(forward_events(rx, state.clone()));
        tx.send(RouterEvent::FullReload).unwrap();

        let message = tokio::time::timeout(Duration::from_secs(5), client.recv())
            .await
            .unwrap()
            .unwrap();
        assert_eq!(message, r#"{"type":"full-reload"}"#);

        drop(tx);
        task.await.unwrap();
    }

    #[test]
    fn test_relative() {
        assert_eq!(
            relative(Path::new("/p/src/App.jsx"), Path::new("/p")),
            "src/App.jsx"
        );
        assert_eq!(relative(Path::new("/x/App.jsx"), Path::new("/p")), "/x/App.jsx");
    }
}
