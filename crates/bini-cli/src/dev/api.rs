//! `/api/*` routes for `bini dev`.
//!
//! Handlers live under `src/app/api` as `name.{js,ts,mjs,cjs}` modules whose
//! default export takes `(req, res)`. `/api/users/list` maps to
//! `api/users/list.*` and a bare `/api` maps to `api/index.*`. Each request
//! runs its handler in a fresh Node process through a small runner script,
//! so edits take effect on the next request without a restart.

use crate::dev::SharedState;
use axum::{
    body::{to_bytes, Body},
    extract::{ConnectInfo, Request, State},
    http::{header, HeaderMap, HeaderName, HeaderValue, Method, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use std::collections::{BTreeMap, HashMap};
use std::net::{IpAddr, Ipv4Addr, SocketAddr};
use std::path::{Path, PathBuf};
use std::process::Stdio;
use std::time::{Duration, Instant, SystemTime, UNIX_EPOCH};
use tokio::io::AsyncWriteExt;
use tokio::process::Command;

const RUNNER: &str = include_str!("../../assets/api-runner.mjs");

pub const API_PREFIX: &str = "/api";
pub const API_INFO_PATH: &str = "/api/_dev";
pub const API_EXTENSIONS: [&str; 4] = ["js", "ts", "mjs", "cjs"];

pub const RATE_LIMIT: usize = 100;
pub const RATE_WINDOW: Duration = Duration::from_secs(60);
pub const HANDLER_TIMEOUT: Duration = Duration::from_secs(30);
const BODY_LIMIT: usize = 1024 * 1024;

/// Sliding-window request counter per client address.
pub struct RateLimiter {
    limit: usize,
    window: Duration,
    hits: Mutex<HashMap<IpAddr, Vec<Instant>>>,
}

impl RateLimiter {
    pub fn new(limit: usize, window: Duration) -> Self {
        Self {
            limit,
            window,
            hits: Mutex::new(HashMap::new()),
        }
    }

    /// Count a request from `ip`.
    ///
    /// Returns the requests left in the window, or `None` when the client is
    /// over the limit. Rejected requests are not counted.
    pub fn check(&self, ip: IpAddr) -> Option<usize> {
        self.check_at(ip, Instant::now())
    }

    pub fn check_at(&self, ip: IpAddr, now: Instant) -> Option<usize> {
        let mut hits = self.hits.lock();
        let seen = hits.entry(ip).or_default();
        seen.retain(|t| now.saturating_duration_since(*t) < self.window);
        if seen.len() >= self.limit {
            return None;
        }
        seen.push(now);
        Some(self.limit - seen.len())
    }

    pub fn limit(&self) -> usize {
        self.limit
    }
}

/// Request as handed to a handler's `req` argument.
#[derive(Debug, Clone, Serialize)]
pub struct ApiRequest {
    pub method: String,
    pub url: String,
    pub headers: BTreeMap<String, String>,
    pub query: BTreeMap<String, String>,
    pub params: BTreeMap<String, String>,
    pub body: Value,
    pub ip: String,
}

/// What the runner reports back.
#[derive(Debug, Clone, Deserialize)]
pub struct ApiReply {
    pub status: u16,
    #[serde(default)]
    pub headers: BTreeMap<String, String>,
    #[serde(default)]
    pub body: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ApiFailure {
    Timeout,
    Handler(String),
}

/// Finds and runs API handlers.
pub struct ApiDispatcher {
    api_dir: PathBuf,
    node: String,
    timeout: Duration,
    limiter: RateLimiter,
}

impl ApiDispatcher {
    pub fn new(api_dir: impl Into<PathBuf>, node: impl Into<String>) -> Self {
        Self {
            api_dir: api_dir.into(),
            node: node.into(),
            timeout: HANDLER_TIMEOUT,
            limiter: RateLimiter::new(RATE_LIMIT, RATE_WINDOW),
        }
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn with_limiter(mut self, limiter: RateLimiter) -> Self {
        self.limiter = limiter;
        self
    }

    pub fn api_dir(&self) -> &Path {
        &self.api_dir
    }

    pub fn limiter(&self) -> &RateLimiter {
        &self.limiter
    }

    /// Handler file for a route such as `hello` or `users/list`.
    ///
    /// Routes with empty, `.` or `..` segments never resolve.
    pub fn resolve(&self, route: &str) -> Option<PathBuf> {
        let unsafe_segment = route
            .split('/')
            .any(|seg| seg.is_empty() || seg == "." || seg == ".." || seg.contains('\\'));
        if unsafe_segment {
            return None;
        }
        API_EXTENSIONS
            .iter()
            .map(|ext| self.api_dir.join(format!("{}.{}", route, ext)))
            .find(|path| path.is_file())
    }

    /// Run `file` with `request` and collect its reply.
    pub async fn run(
        &self,
        file: &Path,
        request: &ApiRequest,
    ) -> std::result::Result<ApiReply, ApiFailure> {
        let input =
            serde_json::to_vec(request).map_err(|e| ApiFailure::Handler(e.to_string()))?;

        let mut command = Command::new(&self.node);
        if file.extension().is_some_and(|ext| ext == "ts") {
            command.arg("--experimental-strip-types");
        }
        command
            .arg("--input-type=module")
            .arg("-e")
            .arg(RUNNER)
            .arg(file)
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true);
        if let Some(root) = self.api_dir.parent() {
            command.current_dir(root);
        }

        let mut child = command.spawn().map_err(|e| {
            ApiFailure::Handler(format!("Failed to start {}: {}", self.node, e))
        })?;
        if let Some(mut stdin) = child.stdin.take() {
            if let Err(e) = stdin.write_all(&input).await {
                tracing::debug!("Handler stdin closed early: {}", e);
            }
        }

        let output = match tokio::time::timeout(self.timeout, child.wait_with_output()).await {
            Ok(Ok(output)) => output,
            Ok(Err(e)) => return Err(ApiFailure::Handler(e.to_string())),
            Err(_) => return Err(ApiFailure::Timeout),
        };

        for line in String::from_utf8_lossy(&output.stderr).lines() {
            tracing::info!("[api] {}", line);
        }

        serde_json::from_slice(&output.stdout).map_err(|_| {
            ApiFailure::Handler(format!("Handler exited with {}", output.status))
        })
    }
}

/// Route part of a request path: `/api/users/list` -> `users/list`.
pub fn route_path(path: &str) -> String {
    let route = path
        .strip_prefix(API_PREFIX)
        .unwrap_or(path)
        .trim_matches('/');
    if route.is_empty() {
        "index".to_string()
    } else {
        route.to_string()
    }
}

fn parse_query(query: Option<&str>) -> BTreeMap<String, String> {
    query
        .unwrap_or_default()
        .split('&')
        .filter(|pair| !pair.is_empty())
        .map(|pair| match pair.split_once('=') {
            Some((key, value)) => (key.to_string(), value.to_string()),
            None => (pair.to_string(), String::new()),
        })
        .collect()
}

fn header_map(headers: &HeaderMap) -> BTreeMap<String, String> {
    headers
        .iter()
        .filter_map(|(name, value)| {
            value
                .to_str()
                .ok()
                .map(|v| (name.as_str().to_string(), v.to_string()))
        })
        .collect()
}

fn is_json(headers: &HeaderMap) -> bool {
    headers
        .get(header::CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .is_some_and(|v| v.starts_with("application/json"))
}

fn error_response(status: StatusCode, body: Value) -> Response {
    (status, Json(body)).into_response()
}

fn with_rate_headers(mut response: Response, limit: usize, remaining: usize) -> Response {
    let reset = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| (d + RATE_WINDOW).as_secs())
        .unwrap_or_default();
    let headers = response.headers_mut();
    headers.insert("x-ratelimit-limit", HeaderValue::from(limit));
    headers.insert("x-ratelimit-remaining", HeaderValue::from(remaining));
    headers.insert("x-ratelimit-reset", HeaderValue::from(reset));
    response
}

fn reply_response(reply: ApiReply) -> Response {
    let status = StatusCode::from_u16(reply.status).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
    let mut response = Response::new(Body::from(reply.body.unwrap_or_default()));
    *response.status_mut() = status;
    for (name, value) in reply.headers {
        match (
            HeaderName::try_from(name.as_str()),
            HeaderValue::try_from(value.as_str()),
        ) {
            (Ok(name), Ok(value)) => {
                response.headers_mut().insert(name, value);
            }
            _ => tracing::debug!("Dropping invalid header {}", name),
        }
    }
    response
}

/// `ANY /api` and `ANY /api/*`.
pub async fn handle_api(State(state): State<SharedState>, request: Request) -> Response {
    let api = state.api();
    let ip = request
        .extensions()
        .get::<ConnectInfo<SocketAddr>>()
        .map(|info| info.0.ip())
        .unwrap_or(IpAddr::V4(Ipv4Addr::LOCALHOST));

    let limit = api.limiter().limit();
    let Some(remaining) = api.limiter().check(ip) else {
        let response = error_response(
            StatusCode::TOO_MANY_REQUESTS,
            json!({ "error": "Too many requests" }),
        );
        return with_rate_headers(response, limit, 0);
    };

    let (parts, body) = request.into_parts();
    let route = route_path(parts.uri.path());
    let Some(file) = api.resolve(&route) else {
        let extensions: Vec<String> = API_EXTENSIONS.iter().map(|e| format!(".{}", e)).collect();
        let response = error_response(
            StatusCode::NOT_FOUND,
            json!({
                "error": "API route not found",
                "path": route,
                "availableExtensions": extensions,
            }),
        );
        return with_rate_headers(response, limit, remaining);
    };

    let bytes = match to_bytes(body, BODY_LIMIT).await {
        Ok(bytes) => bytes,
        Err(e) => {
            let response = error_response(
                StatusCode::PAYLOAD_TOO_LARGE,
                json!({ "error": "Request body too large", "message": e.to_string() }),
            );
            return with_rate_headers(response, limit, remaining);
        }
    };

    let takes_body = [Method::POST, Method::PUT, Method::PATCH, Method::DELETE].contains(&parts.method);
    let body = if takes_body && is_json(&parts.headers) && !bytes.is_empty() {
        match serde_json::from_slice(&bytes) {
            Ok(value) => value,
            Err(_) => {
                let response =
                    error_response(StatusCode::BAD_REQUEST, json!({ "error": "Invalid JSON" }));
                return with_rate_headers(response, limit, remaining);
            }
        }
    } else {
        json!({})
    };

    let api_request = ApiRequest {
        method: parts.method.to_string(),
        url: parts.uri.to_string(),
        headers: header_map(&parts.headers),
        query: parse_query(parts.uri.query()),
        params: BTreeMap::new(),
        body,
        ip: ip.to_string(),
    };

    let response = match api.run(&file, &api_request).await {
        Ok(reply) => reply_response(reply),
        Err(ApiFailure::Timeout) => {
            tracing::warn!("API route {} timed out", route);
            error_response(
                StatusCode::GATEWAY_TIMEOUT,
                json!({ "error": "Request timeout" }),
            )
        }
        Err(ApiFailure::Handler(message)) => {
            tracing::error!("API route {} failed: {}", route, message);
            error_response(
                StatusCode::INTERNAL_SERVER_ERROR,
                json!({ "error": "Internal Server Error", "message": message }),
            )
        }
    };
    with_rate_headers(response, limit, remaining)
}

/// `GET /api/_dev`.
pub async fn handle_api_info(State(state): State<SharedState>) -> impl IntoResponse {
    let timestamp = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis() as u64)
        .unwrap_or_default();
    Json(json!({
        "message": "Bini.js development API",
        "apiDir": state.api().api_dir().display().to_string(),
        "extensions": API_EXTENSIONS,
        "rateLimit": state.api().limiter().limit(),
        "timestamp": timestamp,
    }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dev::{server::router, DevServerState};
    use bini_router::RouterConfig;
    use std::fs;
    use std::sync::Arc;
    use tempfile::TempDir;
    use tokio::io::AsyncReadExt;
    use tokio::net::{TcpListener, TcpStream};

    fn project() -> TempDir {
        let temp = TempDir::new().unwrap();
        let api = temp.path().join("src/app/api");
        fs::create_dir_all(api.join("users")).unwrap();
        fs::write(api.join("hello.js"), "export default () => ({ ok: true });").unwrap();
        fs::write(api.join("users/list.ts"), "export default () => [];").unwrap();
        temp
    }

    fn node_available() -> bool {
        std::process::Command::new("node")
            .arg("--version")
            .output()
            .is_ok_and(|o| o.status.success())
    }

    #[test]
    fn test_route_path() {
        assert_eq!(route_path("/api"), "index");
        assert_eq!(route_path("/api/"), "index");
        assert_eq!(route_path("/api/hello"), "hello");
        assert_eq!(route_path("/api/users/list/"), "users/list");
    }

    #[test]
    fn test_resolve_finds_handler_files() {
        let temp = project();
        let api = ApiDispatcher::new(temp.path().join("src/app/api"), "node");

        assert!(api.resolve("hello").unwrap().ends_with("hello.js"));
        assert!(api.resolve("users/list").unwrap().ends_with("users/list.ts"));
        assert!(api.resolve("missing").is_none());
    }

    #[test]
    fn test_resolve_rejects_escaping_routes() {
        let temp = project();
        fs::write(temp.path().join("src/app/secret.js"), "").unwrap();
        let api = ApiDispatcher::new(temp.path().join("src/app/api"), "node");

        assert!(api.resolve("../secret").is_none());
        assert!(api.resolve("users//list").is_none());
        assert!(api.resolve("./hello").is_none());
    }

    #[test]
    fn test_rate_limiter_window() {
        let limiter = RateLimiter::new(2, Duration::from_secs(60));
        let ip = IpAddr::V4(Ipv4Addr::LOCALHOST);
        let other = IpAddr::V4(Ipv4Addr::new(10, 0, 0, 2));
        let start = Instant::now();

        assert_eq!(limiter.check_at(ip, start), Some(1));
        assert_eq!(limiter.check_at(ip, start), Some(0));
        assert_eq!(limiter.check_at(ip, start), None);
        assert_eq!(limiter.check_at(other, start), Some(1));

        let later = start + Duration::from_secs(61);
        assert_eq!(limiter.check_at(ip, later), Some(1));
    }

    #[test]
    fn test_parse_query() {
        let query = parse_query(Some("page=2&flag&q=rust"));
        assert_eq!(query.get("page").map(String::as_str), Some("2"));
        assert_eq!(query.get("flag").map(String::as_str), Some(""));
        assert!(parse_query(None).is_empty());
    }

    #[test]
    fn test_reply_response_keeps_status_and_headers() {
        let mut headers = BTreeMap::new();
        headers.insert("Content-Type".to_string(), "text/plain".to_string());
        headers.insert("bad header".to_string(), "x".to_string());
        let response = reply_response(ApiReply {
            status: 201,
            headers,
            body: Some("made".to_string()),
        });

        assert_eq!(response.status(), StatusCode::CREATED);
        assert_eq!(response.headers()[header::CONTENT_TYPE], "text/plain");
        assert_eq!(response.headers().len(), 1);
    }

    fn state(temp: &TempDir) -> SharedState {
        Arc::new(DevServerState::new(RouterConfig::new(temp.path())))
    }

    /// Send one raw HTTP request to a fresh server and return the response.
    async fn send(state: SharedState, method: &str, path: &str, json_body: Option<&str>) -> String {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            let app = router(state).into_make_service_with_connect_info::<SocketAddr>();
            axum::serve(listener, app).await.unwrap();
        });

        let mut stream = TcpStream::connect(addr).await.unwrap();
        let mut request = format!(
            "{} {} HTTP/1.1\r\nHost: localhost\r\nConnection: close\r\n",
            method, path
        );
        if let Some(body) = json_body {
            request.push_str(&format!(
                "Content-Type: application/json\r\nContent-Length: {}\r\n\r\n{}",
                body.len(),
                body
            ));
        } else {
            request.push_str("\r\n");
        }
        stream.write_all(request.as_bytes()).await.unwrap();

        let mut response = String::new();
        tokio::time::timeout(Duration::from_secs(10), stream.read_to_string(&mut response))
            .await
            .unwrap()
            .unwrap();
        response
    }

    fn json_body(response: &str) -> Value {
        let body = response.split("\r\n\r\n").nth(1).unwrap();
        serde_json::from_str(body).unwrap()
    }

    #[tokio::test]
    async fn test_unknown_route_is_404_json() {
        let temp = project();
        let response = send(state(&temp), "GET", "/api/missing", None).await;

        assert!(response.starts_with("HTTP/1.1 404"));
        assert!(response.to_lowercase().contains("x-ratelimit-limit: 100"));
        let json = json_body(&response);
        assert_eq!(json["error"], "API route not found");
        assert_eq!(json["path"], "missing");
    }

    #[tokio::test]
    async fn test_malformed_json_body_is_400() {
        let temp = project();
        let response = send(state(&temp), "POST", "/api/hello", Some("{not json")).await;

        assert!(response.starts_with("HTTP/1.1 400"));
        assert_eq!(json_body(&response)["error"], "Invalid JSON");
    }

    #[tokio::test]
    async fn test_over_limit_is_429() {
        let temp = project();
        let api = ApiDispatcher::new(temp.path().join("src/app/api"), "node")
            .with_limiter(RateLimiter::new(1, Duration::from_secs(60)));
        let state = Arc::new(DevServerState::new(RouterConfig::new(temp.path())).with_api(api));

        let first = send(state.clone(), "GET", "/api/missing", None).await;
        assert!(first.starts_with("HTTP/1.1 404"));

        let second = send(state, "GET", "/api/missing", None).await;
        assert!(second.starts_with("HTTP/1.1 429"));
        assert!(second.to_lowercase().contains("x-ratelimit-remaining: 0"));
        assert_eq!(json_body(&second)["error"], "Too many requests");
    }

    #[tokio::test]
    async fn test_info_endpoint() {
        let temp = project();
        let response = send(state(&temp), "GET", API_INFO_PATH, None).await;

        assert!(response.starts_with("HTTP/1.1 200"));
        let json = json_body(&response);
        assert_eq!(json["rateLimit"], 100);
        assert!(json["apiDir"].as_str().unwrap().ends_with("api"));
    }

    #[tokio::test]
    async fn test_missing_node_is_500() {
        let temp = project();
        let api = ApiDispatcher::new(temp.path().join("src/app/api"), "bini-no-such-node");
        let file = api.resolve("hello").unwrap();
        let request = ApiRequest {
            method: "GET".to_string(),
            url: "/api/hello".to_string(),
            headers: BTreeMap::new(),
            query: BTreeMap::new(),
            params: BTreeMap::new(),
            body: json!({}),
            ip: "127.0.0.1".to_string(),
        };

        match api.run(&file, &request).await {
            Err(ApiFailure::Handler(message)) => assert!(message.contains("bini-no-such-node")),
            other => panic!("expected a handler failure, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_handler_reply_is_forwarded() {
        if !node_available() {
            return;
        }
        let temp = project();
        fs::write(
            temp.path().join("src/app/api/echo.mjs"),
            "export default (req, res) => res.status(201).json({ method: req.method, q: req.query.q, name: req.body.name });",
        )
        .unwrap();

        let response = send(state(&temp), "POST", "/api/echo?q=7", Some(r#"{"name":"bini"}"#)).await;

        assert!(response.starts_with("HTTP/1.1 201"));
        let json = json_body(&response);
        assert_eq!(json["method"], "POST");
        assert_eq!(json["q"], "7");
        assert_eq!(json["name"], "bini");
    }

    #[tokio::test]
    async fn test_slow_handler_times_out() {
        if !node_available() {
            return;
        }
        let temp = project();
        fs::write(
            temp.path().join("src/app/api/slow.js"),
            "export default () => new Promise((resolve) => setTimeout(resolve, 10000));",
        )
        .unwrap();
        let api = ApiDispatcher::new(temp.path().join("src/app/api"), "node")
            .with_timeout(Duration::from_millis(300));
        let file = api.resolve("slow").unwrap();
        let request = ApiRequest {
            method: "GET".to_string(),
            url: "/api/slow".to_string(),
            headers: BTreeMap::new(),
            query: BTreeMap::new(),
            params: BTreeMap::new(),
            body: json!({}),
            ip: "127.0.0.1".to_string(),
        };

        assert_eq!(api.run(&file, &request).await.unwrap_err(), ApiFailure::Timeout);
    }
}
