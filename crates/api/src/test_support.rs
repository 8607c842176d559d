// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Shared test infrastructure: an in-memory transport, an HTTP stub of the
//! control endpoint, and assertion helpers.

use std::future::Future;
use std::net::SocketAddr;
use std::pin::Pin;
use std::sync::Arc;
use std::time::Duration;

use axum::extract::State;
use axum::http::{header, HeaderMap, Method, StatusCode, Uri};
use axum::response::{IntoResponse, Response};
use axum::Router;
use bytes::Bytes;
use tokio::net::TcpListener;
use tokio::task::JoinHandle;

use crate::transport::auth::token_matches;
use crate::transport::http::{HttpOptions, HttpTransport};
use crate::transport::{
    Transport, TransportError, TransportErrorKind, TransportRequest, TransportResponse,
};

/// A request as seen by a test double.
#[derive(Debug, Clone, PartialEq)]
pub struct RecordedRequest {
    pub method: String,
    /// Path as sent on the wire (percent-encoding preserved).
    pub path: String,
    pub authorization: Option<String>,
    /// JSON body, `None` when the request had no body.
    pub body: Option<serde_json::Value>,
}

impl RecordedRequest {
    /// Whether the `Authorization` header carries exactly `token`.
    pub fn has_token(&self, token: &str) -> bool {
        token_matches(self.authorization.as_deref(), token)
    }
}

type TransportResponder =
    Box<dyn Fn(&RecordedRequest) -> Result<TransportResponse, TransportError> + Send + Sync>;

/// In-memory [`Transport`] that records every request and answers from a closure.
pub struct RecordingTransport {
    requests: parking_lot::Mutex<Vec<RecordedRequest>>,
    responder: TransportResponder,
}

impl RecordingTransport {
    pub fn new(
        responder: impl Fn(&RecordedRequest) -> Result<TransportResponse, TransportError>
            + Send
            + Sync
            + 'static,
    ) -> Arc<Self> {
        Arc::new(Self {
            requests: parking_lot::Mutex::new(Vec::new()),
            responder: Box::new(responder),
        })
    }

    /// Answer every request with the same status and body.
    pub fn always(status: u16, body: &'static str) -> Arc<Self> {
        Self::new(move |_| Ok(TransportResponse::new(status, body)))
    }

    /// Fail every request with a transport error of `kind`.
    pub fn failing(kind: TransportErrorKind) -> Arc<Self> {
        Self::new(move |_| Err(TransportError::new(kind, "simulated failure")))
    }

    pub fn requests(&self) -> Vec<RecordedRequest> {
        self.requests.lock().clone()
    }

    pub fn request_count(&self) -> usize {
        self.requests.lock().len()
    }
}

impl Transport for RecordingTransport {
    fn send<'a>(
        &'a self,
        request: TransportRequest<'a>,
    ) -> Pin<Box<dyn Future<Output = Result<TransportResponse, TransportError>> + Send + 'a>> {
        let recorded = RecordedRequest {
            method: request.method.to_string(),
            path: format!("/{}", request.path.trim_start_matches('/')),
            authorization: Some(request.credential.authorization()),
            body: request.body.clone(),
        };
        let result = (self.responder)(&recorded);
        self.requests.lock().push(recorded);
        Box::pin(async move { result })
    }
}

/// Canned reply from a [`StubServer`] route.
#[derive(Debug, Clone)]
pub struct StubResponse {
    pub status: u16,
    pub body: String,
    pub delay: Duration,
}

impl StubResponse {
    pub fn json(status: u16, body: serde_json::Value) -> Self {
        Self { status, body: body.to_string(), delay: Duration::ZERO }
    }

    pub fn text(status: u16, body: impl Into<String>) -> Self {
        Self { status, body: body.into(), delay: Duration::ZERO }
    }

    pub fn delayed(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }
}

type StubResponder = Arc<dyn Fn(&RecordedRequest) -> StubResponse + Send + Sync>;

/// Reply with `ok` when the request carries `expected`, else 401.
pub fn require_token(
    expected: &str,
    ok: StubResponse,
) -> impl Fn(&RecordedRequest) -> StubResponse + Send + Sync + 'static {
    let expected = expected.to_owned();
    move |req| {
        if req.has_token(&expected) {
            ok.clone()
        } else {
            StubResponse::text(401, "bad token")
        }
    }
}

struct StubState {
    routes: Vec<(String, StubResponder)>,
    requests: parking_lot::Mutex<Vec<RecordedRequest>>,
}

/// Builder for [`StubServer`].
#[derive(Default)]
pub struct StubServerBuilder {
    routes: Vec<(String, StubResponder)>,
}

impl StubServerBuilder {
    /// Add a route. `pattern` is matched per segment; `*` matches any one
    /// segment. First match wins; unmatched paths get 404.
    pub fn route(
        mut self,
        pattern: &str,
        responder: impl Fn(&RecordedRequest) -> StubResponse + Send + Sync + 'static,
    ) -> Self {
        self.routes.push((pattern.to_owned(), Arc::new(responder)));
        self
    }

    /// Bind to an ephemeral localhost port and start serving.
    pub async fn start(self) -> anyhow::Result<StubServer> {
        let state = Arc::new(StubState {
            routes: self.routes,
            requests: parking_lot::Mutex::new(Vec::new()),
        });
        let listener = TcpListener::bind("127.0.0.1:0").await?;
        let addr = listener.local_addr()?;
        let router = Router::new().fallback(stub_handler).with_state(Arc::clone(&state));
        let handle = tokio::spawn(async move {
            let _ = axum::serve(listener, router).await;
        });
        Ok(StubServer { addr, state, handle })
    }
}

/// Minimal HTTP stand-in for the control endpoint. Stops on drop.
pub struct StubServer {
    addr: SocketAddr,
    state: Arc<StubState>,
    handle: JoinHandle<()>,
}

impl StubServer {
    pub fn builder() -> StubServerBuilder {
        StubServerBuilder::default()
    }

    /// Stub accepting `bootstrap` at `/register` and `access` everywhere else.
    ///
    /// Registration returns agent `12-34-56-78-91` / `agent-1` with `access`
    /// as its access token. Job `missing` returns 404 on token minting.
    pub async fn agent_api(bootstrap: &str, access: &str) -> anyhow::Result<Self> {
        let registration = serde_json::json!({
            "id": "12-34-56-78-91",
            "name": "agent-1",
            "access_token": access,
        });
        let connected = StubResponse::json(200, serde_json::json!({}));
        let mint_token = access.to_owned();
        Self::builder()
            .route("/register", require_token(bootstrap, StubResponse::json(200, registration)))
            .route("/connect", require_token(access, connected))
            .route("/jobs/*/oidc/tokens", move |req| {
                if !req.has_token(&mint_token) {
                    return StubResponse::text(401, "bad token");
                }
                if req.path.starts_with("/jobs/missing/") {
                    return StubResponse::text(404, "no such job");
                }
                let audience =
                    req.body.as_ref().and_then(|b| b.get("audience")).and_then(|a| a.as_str());
                let token = format!("oidc:{}:{}", job_segment(&req.path), audience.unwrap_or("-"));
                StubResponse::json(200, serde_json::json!({ "token": token }))
            })
            .start()
            .await
    }

    pub fn addr(&self) -> SocketAddr {
        self.addr
    }

    pub fn url(&self) -> String {
        format!("http://{}", self.addr)
    }

    pub fn requests(&self) -> Vec<RecordedRequest> {
        self.state.requests.lock().clone()
    }

    /// Recorded requests whose path equals `path`.
    pub fn requests_to(&self, path: &str) -> Vec<RecordedRequest> {
        self.requests().into_iter().filter(|r| r.path == path).collect()
    }
}

impl Drop for StubServer {
    fn drop(&mut self) {
        self.handle.abort();
    }
}

async fn stub_handler(
    State(state): State<Arc<StubState>>,
    method: Method,
    uri: Uri,
    headers: HeaderMap,
    body: Bytes,
) -> Response {
    let recorded = RecordedRequest {
        method: method.to_string(),
        path: uri.path().to_owned(),
        authorization: headers
            .get(header::AUTHORIZATION)
            .and_then(|v| v.to_str().ok())
            .map(str::to_owned),
        body: if body.is_empty() {
            None
        } else {
            Some(
                serde_json::from_slice(&body)
                    .unwrap_or_else(|_| String::from_utf8_lossy(&body).into_owned().into()),
            )
        },
    };

    let responder = state
        .routes
        .iter()
        .find(|(pattern, _)| path_matches(pattern, &recorded.path))
        .map(|(_, r)| Arc::clone(r));
    let reply = match responder {
        Some(r) => r(&recorded),
        None => StubResponse::text(
            404,
            format!("not found; method = {:?}, path = {:?}", recorded.method, recorded.path),
        ),
    };
    state.requests.lock().push(recorded);

    if reply.delay > Duration::ZERO {
        tokio::time::sleep(reply.delay).await;
    }
    let status = StatusCode::from_u16(reply.status).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
    (status, [(header::CONTENT_TYPE, "application/json")], reply.body).into_response()
}

fn path_matches(pattern: &str, path: &str) -> bool {
    let mut pat = pattern.trim_matches('/').split('/');
    let mut segs = path.trim_matches('/').split('/');
    loop {
        match (pat.next(), segs.next()) {
            (None, None) => return true,
            (Some("*"), Some(_)) => {}
            (Some(p), Some(s)) if p == s => {}
            _ => return false,
        }
    }
}

/// Second path segment (the job id in `/jobs/<id>/...`).
fn job_segment(path: &str) -> &str {
    path.trim_start_matches('/').split('/').nth(1).unwrap_or("")
}

/// Reqwest transport with a short timeout, for tests against a [`StubServer`].
pub fn http_transport() -> anyhow::Result<Arc<dyn Transport>> {
    let options = HttpOptions { timeout: Duration::from_secs(5), ..HttpOptions::default() };
    Ok(Arc::new(HttpTransport::new(options)?))
}

/// Assert that a `Result` is `Err` and its `Display` contains a substring.
#[macro_export]
macro_rules! assert_err_contains {
    ($expr:expr, $substr:expr) => {{
        let result = $expr;
        let err = result.expect_err(concat!("expected Err for: ", stringify!($expr)));
        let msg = err.to_string();
        assert!(msg.contains($substr), "expected error containing {:?}, got: {msg:?}", $substr);
    }};
}

#[cfg(test)]
#[path = "test_support_tests.rs"]
mod tests;
