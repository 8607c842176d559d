// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Immutable endpoint + token pairing.
//!
//! A credential never changes after construction. Rotating to a new token
//! (bootstrap → access token) produces a new [`Credential`] via
//! [`Credential::rotate`]; the original is left untouched.

use std::fmt;
use std::sync::Arc;

use crate::error::ApiError;
use crate::transport::auth::authorization_value;

/// Bearer token plus the base endpoint it is valid against.
///
/// Cheap to clone; clones share the same immutable storage.
#[derive(Clone, PartialEq, Eq)]
pub struct Credential {
    inner: Arc<Inner>,
}

#[derive(PartialEq, Eq)]
struct Inner {
    /// Always ends with `/`.
    endpoint: String,
    token: String,
}

impl Credential {
    /// Build a credential for `endpoint`.
    ///
    /// The endpoint must be an absolute `http` or `https` URL. An empty token
    /// is accepted here; callers that require one check it themselves.
    pub fn new(endpoint: &str, token: impl Into<String>) -> Result<Self, ApiError> {
        let endpoint = normalize_endpoint(endpoint)?;
        Ok(Self { inner: Arc::new(Inner { endpoint, token: token.into() }) })
    }

    /// The base endpoint, with a trailing `/`.
    pub fn endpoint(&self) -> &str {
        &self.inner.endpoint
    }

    pub fn token(&self) -> &str {
        &self.inner.token
    }

    pub fn has_token(&self) -> bool {
        !self.inner.token.is_empty()
    }

    /// `Authorization` header value for this credential.
    pub fn authorization(&self) -> String {
        authorization_value(&self.inner.token)
    }

    /// Resolve a relative API path against the endpoint.
    pub fn url(&self, path: &str) -> String {
        format!("{}{}", self.inner.endpoint, path.trim_start_matches('/'))
    }

    /// New credential for the same endpoint carrying `token`.
    pub fn rotate(&self, token: impl Into<String>) -> Self {
        Self {
            inner: Arc::new(Inner { endpoint: self.inner.endpoint.clone(), token: token.into() }),
        }
    }
}

impl fmt::Debug for Credential {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credential")
            .field("endpoint", &self.inner.endpoint)
            .field("token", &redact(&self.inner.token))
            .finish()
    }
}

/// Placeholder shown instead of a secret in `Debug` and CLI output.
pub fn redact(token: &str) -> &'static str {
    if token.is_empty() {
        "<empty>"
    } else {
        "<redacted>"
    }
}

fn normalize_endpoint(endpoint: &str) -> Result<String, ApiError> {
    let trimmed = endpoint.trim();
    if trimmed.is_empty() {
        return Err(ApiError::configuration("endpoint must not be empty"));
    }
    let url = reqwest::Url::parse(trimmed)
        .map_err(|e| ApiError::configuration(format!("invalid endpoint {trimmed:?}: {e}")))?;
    match url.scheme() {
        "http" | "https" => {}
        other => {
            return Err(ApiError::configuration(format!(
                "invalid endpoint {trimmed:?}: unsupported scheme {other:?}"
            )))
        }
    }
    if url.query().is_some() || url.fragment().is_some() {
        return Err(ApiError::configuration(format!(
            "invalid endpoint {trimmed:?}: query and fragment are not allowed"
        )));
    }

    let mut base = url.to_string();
    if !base.ends_with('/') {
        base.push('/');
    }
    Ok(base)
}

#[cfg(test)]
#[path = "credential_tests.rs"]
mod tests;
