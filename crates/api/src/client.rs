// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Access-token client: connect handshake and scoped token minting.

use std::sync::Arc;

use crate::credential::Credential;
use crate::error::ApiError;
use crate::transport::{call, Transport, TransportRequest};
use crate::wire::{Connected, ScopedToken, ScopedTokenRequest, CONNECT_PATH};

/// Client authenticated with an instance access token.
///
/// Usually obtained from [`crate::factory::derive_client`]. Every call is
/// independent; nothing on the client changes as a result of one.
#[derive(Clone)]
pub struct AgentClient {
    credential: Credential,
    transport: Arc<dyn Transport>,
}

impl AgentClient {
    /// Wrap an existing access-token credential (e.g. one persisted from an
    /// earlier registration).
    pub fn new(credential: Credential, transport: Arc<dyn Transport>) -> Self {
        Self { credential, transport }
    }

    pub fn credential(&self) -> &Credential {
        &self.credential
    }

    /// `POST connect`. Any 2xx is a successful handshake; a body that is not
    /// JSON is kept as a string.
    ///
    /// 401/403 mean the access token is invalid or revoked; the caller must
    /// register again.
    pub async fn connect(&self) -> Result<Connected, ApiError> {
        let req = TransportRequest::post(&self.credential, CONNECT_PATH);
        let response = call(self.transport.as_ref(), req, false).await?;
        // The handshake result is the status alone; the body is informational
        // and never turns a 2xx into a failure.
        let body = response.json().unwrap_or_else(|_| {
            serde_json::Value::String(String::from_utf8_lossy(&response.body).into_owned())
        });
        Ok(Connected { status: response.status, body })
    }

    /// `POST jobs/<job_id>/oidc/tokens`.
    ///
    /// An empty job id fails with [`ApiError::Configuration`] before anything
    /// is sent. 404 (unknown job) fails with [`ApiError::NotFound`].
    pub async fn mint_scoped_token(
        &self,
        request: &ScopedTokenRequest,
    ) -> Result<ScopedToken, ApiError> {
        let path = request.path()?;
        let body = serde_json::to_value(request.body())
            .map_err(|e| ApiError::configuration(format!("unserializable request: {e}")))?;
        let req = TransportRequest::post(&self.credential, path).with_body(body);
        let response = call(self.transport.as_ref(), req, true).await?;
        response.json()
    }
}

impl std::fmt::Debug for AgentClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AgentClient").field("credential", &self.credential).finish()
    }
}

#[cfg(test)]
#[path = "client_tests.rs"]
mod tests;
