//! Reload server: SSE events, the reload client script, the route list and
//! the `/api` handlers.

use crate::dev::api::{self, API_INFO_PATH, API_PREFIX};
use crate::dev::{DevEvent, SharedState};
use crate::error::{CliError, Result};
use axum::{
    extract::State,
    http::{header, StatusCode},
    response::{sse::Event, sse::KeepAlive, IntoResponse, Sse},
    routing::{any, get},
    Json, Router,
};
use std::convert::Infallible;
use std::future::Future;
use std::net::SocketAddr;
use std::time::Duration;
use tokio_stream::{wrappers::ReceiverStream, Stream, StreamExt};
use tower_http::cors::{Any, CorsLayer};

const RELOAD_SCRIPT: &str = include_str!("../../assets/reload-client.js");

pub const SSE_PATH: &str = "/__bini_sse__";
pub const RELOAD_SCRIPT_PATH: &str = "/__bini_reload__.js";
pub const ROUTES_PATH: &str = "/__bini_routes__";

/// Development reload server.
pub struct DevServer {
    addr: SocketAddr,
    state: SharedState,
}

impl DevServer {
    pub fn new(addr: SocketAddr, state: SharedState) -> Self {
        Self { addr, state }
    }

    pub fn url(&self) -> String {
        format!("http://{}", self.addr)
    }

    /// Serve until `shutdown` resolves.
    ///
    /// # Errors
    ///
    /// Returns `CliError::Server` if the address cannot be bound.
    pub async fn start(self, shutdown: impl Future<Output = ()> + Send + 'static) -> Result<()> {
        let listener = tokio::net::TcpListener::bind(self.addr)
            .await
            .map_err(|e| CliError::Server(format!("Failed to bind to {}: {}", self.addr, e)))?;

        crate::ui::success(&format!("Reload server running at {}", self.url()));

        let app = router(self.state).into_make_service_with_connect_info::<SocketAddr>();
        axum::serve(listener, app)
            .with_graceful_shutdown(shutdown)
            .await
            .map_err(|e| CliError::Server(e.to_string()))
    }
}

/// Build the axum router.
pub fn router(state: SharedState) -> Router {
    Router::new()
        .route(SSE_PATH, get(handle_sse))
        .route(RELOAD_SCRIPT_PATH, get(handle_reload_script))
        .route(ROUTES_PATH, get(handle_routes))
        .route(API_INFO_PATH, get(api::handle_api_info))
        .route(API_PREFIX, any(api::handle_api))
        .route("/api/{*path}", any(api::handle_api))
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
        )
        .with_state(state)
}

async fn handle_sse(
    State(state): State<SharedState>,
) -> Sse<impl Stream<Item = std::result::Result<Event, Infallible>>> {
    let (id, rx) = state.register_client();
    tracing::debug!("Client {} connected", id);
    state.send_to(id, &DevEvent::Connected { id }).await;

    let stream = ReceiverStream::new(rx).map(|data| Ok(Event::default().data(data)));

    Sse::new(stream).keep_alive(
        KeepAlive::new()
            .interval(Duration::from_secs(15))
            .text("ping"),
    )
}

async fn handle_reload_script() -> impl IntoResponse {
    (
        StatusCode::OK,
        [
            (header::CONTENT_TYPE, "application/javascript"),
            (header::CACHE_CONTROL, "no-cache"),
        ],
        RELOAD_SCRIPT,
    )
}

async fn handle_routes(State(state): State<SharedState>) -> impl IntoResponse {
    Json(state.routes())
}
