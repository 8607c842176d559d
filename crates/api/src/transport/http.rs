// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! reqwest-backed [`Transport`].

use std::future::Future;
use std::pin::Pin;
use std::sync::Once;
use std::time::{Duration, Instant};

use reqwest::header::{ACCEPT, AUTHORIZATION};
use reqwest::Client;
use tracing::debug;

use super::auth::authorization_value;
use super::{Transport, TransportError, TransportErrorKind, TransportRequest, TransportResponse};
use crate::error::ApiError;

static CRYPTO_INIT: Once = Once::new();

/// Install the ring crypto provider for reqwest/rustls.
/// Only the first call has effect.
pub fn ensure_crypto() {
    CRYPTO_INIT.call_once(|| {
        let _ = rustls::crypto::ring::default_provider().install_default();
    });
}

/// Settings for [`HttpTransport`].
#[derive(Debug, Clone)]
pub struct HttpOptions {
    /// Per-request timeout. Covers connect, send, and body read.
    pub timeout: Duration,
    pub user_agent: String,
}

impl Default for HttpOptions {
    fn default() -> Self {
        Self {
            timeout: Duration::from_secs(60),
            user_agent: format!("agentapi/{}", env!("CARGO_PKG_VERSION")),
        }
    }
}

/// HTTP transport over a pooled `reqwest::Client`.
///
/// Does not retry. Logs method, path, status, and elapsed time at debug
/// level; never logs tokens or bodies.
#[derive(Debug, Clone)]
pub struct HttpTransport {
    client: Client,
}

impl HttpTransport {
    pub fn new(options: HttpOptions) -> Result<Self, ApiError> {
        ensure_crypto();
        let client = Client::builder()
            .timeout(options.timeout)
            .user_agent(options.user_agent)
            .build()
            .map_err(|e| ApiError::configuration(format!("failed to build http client: {e}")))?;
        Ok(Self { client })
    }

    async fn execute(
        &self,
        request: TransportRequest<'_>,
    ) -> Result<TransportResponse, TransportError> {
        let started = Instant::now();
        let mut req = self
            .client
            .request(request.method.clone(), request.url())
            .header(AUTHORIZATION, authorization_value(request.credential.token()))
            .header(ACCEPT, "application/json");
        if let Some(ref body) = request.body {
            req = req.json(body);
        }

        let resp = req.send().await.map_err(transport_error)?;
        let status = resp.status().as_u16();
        let headers = resp.headers().clone();
        let body = resp.bytes().await.map_err(transport_error)?;

        debug!(
            method = %request.method,
            path = %request.path,
            status,
            elapsed_ms = started.elapsed().as_millis() as u64,
            "api request"
        );
        Ok(TransportResponse { status, headers, body })
    }
}

impl Transport for HttpTransport {
    fn send<'a>(
        &'a self,
        request: TransportRequest<'a>,
    ) -> Pin<Box<dyn Future<Output = Result<TransportResponse, TransportError>> + Send + 'a>> {
        Box::pin(self.execute(request))
    }
}

fn transport_error(err: reqwest::Error) -> TransportError {
    let kind = if err.is_timeout() {
        TransportErrorKind::Timeout
    } else if err.is_connect() {
        TransportErrorKind::Connect
    } else if err.is_body() || err.is_decode() {
        TransportErrorKind::Body
    } else {
        TransportErrorKind::Request
    };
    // Errors never carry the request URL.
    TransportError::new(kind, err.without_url())
}
