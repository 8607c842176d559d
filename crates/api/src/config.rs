// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use std::sync::Arc;
use std::time::Duration;

use crate::credential::Credential;
use crate::error::ApiError;
use crate::transport::http::{HttpOptions, HttpTransport};
use crate::transport::Transport;

pub const DEFAULT_ENDPOINT: &str = "https://agent.buildkite.com/v3";

/// Connection settings for the control endpoint.
#[derive(Debug, Clone, clap::Args)]
pub struct ApiConfig {
    /// Base URL of the control endpoint.
    #[arg(long, default_value = DEFAULT_ENDPOINT, env = "AGENTAPI_ENDPOINT")]
    pub endpoint: String,

    /// Token to authenticate with: the registration token for `register`,
    /// the access token for everything else.
    #[arg(long, env = "AGENTAPI_TOKEN", hide_env_values = true)]
    pub token: Option<String>,

    /// Per-request timeout in milliseconds.
    #[arg(long, default_value_t = 60_000, env = "AGENTAPI_TIMEOUT_MS")]
    pub timeout_ms: u64,

    /// User-Agent header. Defaults to `agentapi/<version>`.
    #[arg(long, env = "AGENTAPI_USER_AGENT")]
    pub user_agent: Option<String>,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            endpoint: DEFAULT_ENDPOINT.to_owned(),
            token: None,
            timeout_ms: 60_000,
            user_agent: None,
        }
    }
}

impl ApiConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }

    pub fn validate(&self) -> Result<(), ApiError> {
        self.credential()?;
        if self.timeout_ms == 0 {
            return Err(ApiError::configuration("--timeout-ms must be greater than zero"));
        }
        Ok(())
    }

    /// Credential for the configured endpoint and token. The token is required.
    pub fn credential(&self) -> Result<Credential, ApiError> {
        let token = match self.token.as_deref() {
            Some(t) if !t.is_empty() => t,
            _ => return Err(ApiError::configuration("--token (or AGENTAPI_TOKEN) is required")),
        };
        Credential::new(&self.endpoint, token)
    }

    pub fn http_options(&self) -> HttpOptions {
        let mut options = HttpOptions { timeout: self.timeout(), ..HttpOptions::default() };
        if let Some(ref ua) = self.user_agent {
            options.user_agent = ua.clone();
        }
        options
    }

    /// Build the default reqwest transport.
    pub fn transport(&self) -> Result<Arc<dyn Transport>, ApiError> {
        Ok(Arc::new(HttpTransport::new(self.http_options())?))
    }
}

#[cfg(test)]
#[path = "config_tests.rs"]
mod tests;
