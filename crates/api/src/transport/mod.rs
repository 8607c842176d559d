// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! HTTP request executor used by the registration and agent clients.
//!
//! The clients only depend on [`Transport`]. [`http::HttpTransport`] is the
//! reqwest implementation; tests substitute an in-memory recorder.

pub mod auth;
pub mod http;

use std::fmt;
use std::future::Future;
use std::pin::Pin;

use bytes::Bytes;
use reqwest::header::HeaderMap;
use reqwest::Method;
use serde::de::DeserializeOwned;

use crate::credential::Credential;
use crate::error::ApiError;

/// Executes one request against a credential's endpoint.
///
/// Implementations attach `Authorization: Token <token>` from the credential,
/// serialize `body` as JSON when present, and return the raw response. They
/// own timeouts and connection reuse. Any status code is a
/// successful send; only failures to obtain a response are errors.
///
/// Object-safe for use as `Arc<dyn Transport>`.
pub trait Transport: Send + Sync + 'static {
    fn send<'a>(
        &'a self,
        request: TransportRequest<'a>,
    ) -> Pin<Box<dyn Future<Output = Result<TransportResponse, TransportError>> + Send + 'a>>;
}

/// A request as handed to the transport.
#[derive(Debug, Clone)]
pub struct TransportRequest<'a> {
    pub method: Method,
    /// Path relative to the credential's endpoint, without a leading `/`.
    pub path: String,
    pub body: Option<serde_json::Value>,
    pub credential: &'a Credential,
}

impl<'a> TransportRequest<'a> {
    pub fn post(credential: &'a Credential, path: impl Into<String>) -> Self {
        Self { method: Method::POST, path: path.into(), body: None, credential }
    }

    pub fn with_body(mut self, body: serde_json::Value) -> Self {
        self.body = Some(body);
        self
    }

    /// Absolute URL for this request.
    pub fn url(&self) -> String {
        self.credential.url(&self.path)
    }
}

/// A response as returned by the transport, body undecoded.
#[derive(Debug, Clone)]
pub struct TransportResponse {
    pub status: u16,
    pub headers: HeaderMap,
    pub body: Bytes,
}

impl TransportResponse {
    pub fn new(status: u16, body: impl Into<Bytes>) -> Self {
        Self { status, headers: HeaderMap::new(), body: body.into() }
    }

    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }

    /// Fail with the classified [`ApiError`] unless the status is 2xx.
    pub fn error_for_status(self, addressed: bool) -> Result<Self, ApiError> {
        if self.is_success() {
            Ok(self)
        } else {
            Err(ApiError::from_status(self.status, &self.body, addressed))
        }
    }

    /// Decode the body as JSON. An empty body decodes as `null`.
    pub fn json<T: DeserializeOwned>(&self) -> Result<T, ApiError> {
        let bytes: &[u8] = if self.body.iter().all(u8::is_ascii_whitespace) {
            b"null"
        } else {
            &self.body
        };
        serde_json::from_slice(bytes).map_err(|e| ApiError::decode(self.status, &self.body, &e))
    }
}

/// Category of a transport failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransportErrorKind {
    Timeout,
    Connect,
    /// The request could not be built or sent.
    Request,
    /// The response body could not be read.
    Body,
}

impl TransportErrorKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Timeout => "timeout",
            Self::Connect => "connect",
            Self::Request => "request",
            Self::Body => "body",
        }
    }
}

/// Opaque failure from the transport (DNS, TLS, timeout, reset, ...).
#[derive(Debug)]
pub struct TransportError {
    kind: TransportErrorKind,
    source: Box<dyn std::error::Error + Send + Sync>,
}

impl TransportError {
    pub fn new(
        kind: TransportErrorKind,
        source: impl Into<Box<dyn std::error::Error + Send + Sync>>,
    ) -> Self {
        Self { kind, source: source.into() }
    }

    pub fn kind(&self) -> TransportErrorKind {
        self.kind
    }
}

impl fmt::Display for TransportError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.kind.as_str(), self.source)
    }
}

impl std::error::Error for TransportError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        Some(self.source.as_ref())
    }
}

/// Send `request` and return the response if its status is 2xx.
pub(crate) async fn call(
    transport: &dyn Transport,
    request: TransportRequest<'_>,
    addressed: bool,
) -> Result<TransportResponse, ApiError> {
    let response = transport.send(request).await?;
    response.error_for_status(addressed)
}

#[cfg(test)]
#[path = "mod_tests.rs"]
mod tests;
