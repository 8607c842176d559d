// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Bootstrap registration.
//!
//! A [`RegistrationClient`] holds the shared registration token. Its only
//! operation is [`RegistrationClient::register`], which trades instance
//! metadata for an access token. Turning that response into a usable client
//! is the job of [`crate::factory`].

use std::sync::Arc;

use crate::credential::Credential;
use crate::error::ApiError;
use crate::transport::{call, Transport, TransportRequest};
use crate::wire::{RegistrationRequest, RegistrationResponse, REGISTER_PATH};

/// Client authenticated with the bootstrap (registration) token.
///
/// Never mutated by registration; a failed call leaves it ready for another
/// attempt.
#[derive(Clone)]
pub struct RegistrationClient {
    credential: Credential,
    transport: Arc<dyn Transport>,
}

impl RegistrationClient {
    pub fn new(credential: Credential, transport: Arc<dyn Transport>) -> Self {
        Self { credential, transport }
    }

    pub fn credential(&self) -> &Credential {
        &self.credential
    }

    pub(crate) fn transport(&self) -> &Arc<dyn Transport> {
        &self.transport
    }

    /// `POST register` with the bootstrap token.
    ///
    /// 401/403 fail with [`ApiError::Authentication`]; any other non-2xx or
    /// an undecodable body fails with [`ApiError::Protocol`].
    pub async fn register(
        &self,
        request: &RegistrationRequest,
    ) -> Result<RegistrationResponse, ApiError> {
        let body = serde_json::to_value(request)
            .map_err(|e| ApiError::configuration(format!("unserializable request: {e}")))?;
        let req = TransportRequest::post(&self.credential, REGISTER_PATH).with_body(body);
        let response = call(self.transport.as_ref(), req, false).await?;
        response.json()
    }
}

impl std::fmt::Debug for RegistrationClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RegistrationClient").field("credential", &self.credential).finish()
    }
}

#[cfg(test)]
#[path = "register_tests.rs"]
mod tests;
