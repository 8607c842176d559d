// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Turn a registration response into an access-token client.

use std::sync::Arc;

use crate::client::AgentClient;
use crate::error::ApiError;
use crate::register::RegistrationClient;
use crate::wire::RegistrationResponse;

/// Build an [`AgentClient`] bound to `response.access_token`.
///
/// The new client shares the base client's endpoint and transport but holds
/// a fresh credential; the bootstrap token is not carried over and `base`
/// is left unchanged. An empty access token fails with
/// [`ApiError::Configuration`].
pub fn derive_client(
    base: &RegistrationClient,
    response: &RegistrationResponse,
) -> Result<AgentClient, ApiError> {
    if response.access_token.is_empty() {
        return Err(ApiError::configuration("registration response has an empty access token"));
    }
    let credential = base.credential().rotate(response.access_token.clone());
    Ok(AgentClient::new(credential, Arc::clone(base.transport())))
}

impl RegistrationClient {
    /// Method form of [`derive_client`].
    pub fn derive_client(&self, response: &RegistrationResponse) -> Result<AgentClient, ApiError> {
        derive_client(self, response)
    }
}

#[cfg(test)]
#[path = "factory_tests.rs"]
mod tests;
