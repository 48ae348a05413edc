//! Shared state for the reload server.
//!
//! Tracks connected SSE clients and the latest route listing behind
//! parking_lot locks, and owns the API dispatcher.

use crate::commands::routes::RouteListing;
use crate::dev::api::ApiDispatcher;
use crate::dev::DevEvent;
use bini_router::RouterConfig;
use parking_lot::RwLock;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::mpsc;

/// Connected SSE clients by id.
pub type ClientRegistry = Arc<RwLock<HashMap<usize, mpsc::Sender<String>>>>;

/// Shared reload server state.
pub struct DevServerState {
    router: RouterConfig,
    routes: RwLock<RouteListing>,
    clients: ClientRegistry,
    next_client_id: RwLock<usize>,
    api: ApiDispatcher,
}

impl DevServerState {
    /// Create state for `router`, scanning its routes once.
    ///
    /// API handlers are looked up under `<pages root>/api` and run with `node`.
    pub fn new(router: RouterConfig) -> Self {
        let routes = RouteListing::current(&router);
        let api = ApiDispatcher::new(router.pages_root().join("api"), "node");
        Self {
            router,
            api,
            routes: RwLock::new(routes),
            clients: Arc::new(RwLock::new(HashMap::new())),
            next_client_id: RwLock::new(0),
        }
    }

    pub fn with_api(mut self, api: ApiDispatcher) -> Self {
        self.api = api;
        self
    }

    pub fn router(&self) -> &RouterConfig {
        &self.router
    }

    pub fn api(&self) -> &ApiDispatcher {
        &self.api
    }

    /// Latest route listing.
    pub fn routes(&self) -> RouteListing {
        self.routes.read().clone()
    }

    /// Rescan the pages root.
    pub fn refresh_routes(&self) {
        let listing = RouteListing::current(&self.router);
        *self.routes.write() = listing;
    }

    /// Register a new SSE client.
    ///
    /// Returns the client id and the receiver its stream reads from.
    pub fn register_client(&self) -> (usize, mpsc::Receiver<String>) {
        let id = {
            let mut next_id = self.next_client_id.write();
            let id = *next_id;
            *next_id += 1;
            id
        };

        let (tx, rx) = mpsc::channel(100);
        self.clients.write().insert(id, tx);

        (id, rx)
    }

    pub fn unregister_client(&self, id: usize) {
        self.clients.write().remove(&id);
    }

    /// Drop every client, which ends their event streams.
    pub fn disconnect_all(&self) {
        self.clients.write().clear();
    }

    /// Send `event` to one client.
    pub async fn send_to(&self, id: usize, event: &DevEvent) {
        let tx = self.clients.read().get(&id).cloned();
        if let Some(tx) = tx {
            if tx.send(encode(event)).await.is_err() {
                self.unregister_client(id);
            }
        }
    }

    /// Broadcast an event to all connected clients.
    ///
    /// Clients whose stream has gone away are removed.
    pub async fn broadcast(&self, event: &DevEvent) {
        let json = encode(event);
        let clients = self.clients.read().clone();

        let mut failed_ids = Vec::new();
        for (id, tx) in clients {
            if tx.send(json.clone()).await.is_err() {
                failed_ids.push(id);
            }
        }

        for id in failed_ids {
            tracing::debug!("Client {} disconnected", id);
            self.unregister_client(id);
        }
    }

    pub fn client_count(&self) -> usize {
        self.clients.read().len()
    }
}

fn encode(event: &DevEvent) -> String {
    serde_json::to_string(event).unwrap_or_else(|_| "{}".to_string())
}

/// Shared state handle.
pub type SharedState = Arc<DevServerState>;
