// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Request and response bodies exchanged with the control endpoint.

use std::fmt;

use serde::{Deserialize, Deserializer, Serialize};

use crate::credential::redact;
use crate::error::ApiError;

/// Path of the registration call.
pub const REGISTER_PATH: &str = "register";
/// Path of the connect handshake.
pub const CONNECT_PATH: &str = "connect";

/// Metadata describing the registering instance.
///
/// Every field is optional. `RegistrationRequest::default()` serializes to `{}`.
#[derive(Debug, Default, Clone, PartialEq, Serialize, Deserialize)]
pub struct RegistrationRequest {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub hostname: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub os: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub arch: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub version: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub build: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pid: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub machine_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub priority: Option<String>,
    /// `key=value` tags used for job targeting.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub tags: Vec<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub features: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub script_eval_enabled: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ignore_in_dispatches: Option<bool>,
}

impl RegistrationRequest {
    /// Fill `hostname`, `os`, `arch`, `pid`, and `version` from the running
    /// process where they are unset.
    pub fn with_host_defaults(mut self) -> Self {
        if self.hostname.is_none() {
            self.hostname = system_hostname();
        }
        self.os.get_or_insert_with(|| std::env::consts::OS.to_owned());
        self.arch.get_or_insert_with(|| std::env::consts::ARCH.to_owned());
        self.pid.get_or_insert_with(std::process::id);
        self.version.get_or_insert_with(|| env!("CARGO_PKG_VERSION").to_owned());
        self
    }
}

/// Server reply to a successful registration.
///
/// `access_token` becomes the token of the derived client's credential.
/// Keys not modelled here are kept in `extra`.
#[derive(Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RegistrationResponse {
    #[serde(default)]
    pub id: String,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub access_token: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub endpoint: Option<String>,
    /// Intervals in seconds. Anything other than a non-negative integer reads
    /// as `None`.
    #[serde(default, deserialize_with = "lenient_u64", skip_serializing_if = "Option::is_none")]
    pub ping_interval: Option<u64>,
    #[serde(default, deserialize_with = "lenient_u64", skip_serializing_if = "Option::is_none")]
    pub job_status_interval: Option<u64>,
    #[serde(default, deserialize_with = "lenient_u64", skip_serializing_if = "Option::is_none")]
    pub heartbeat_interval: Option<u64>,
    /// `null` reads as empty; non-string entries are dropped.
    #[serde(default, deserialize_with = "lenient_strings", skip_serializing_if = "Vec::is_empty")]
    pub tags: Vec<String>,
    #[serde(flatten)]
    pub extra: serde_json::Map<String, serde_json::Value>,
}

impl RegistrationResponse {
    /// JSON form with `access_token` replaced by a placeholder.
    pub fn redacted(&self) -> serde_json::Value {
        let mut value = serde_json::to_value(self).unwrap_or(serde_json::Value::Null);
        if let Some(obj) = value.as_object_mut() {
            obj.insert("access_token".to_owned(), redact(&self.access_token).into());
        }
        value
    }
}

impl fmt::Debug for RegistrationResponse {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RegistrationResponse")
            .field("id", &self.id)
            .field("name", &self.name)
            .field("access_token", &redact(&self.access_token))
            .field("endpoint", &self.endpoint)
            .field("ping_interval", &self.ping_interval)
            .field("job_status_interval", &self.job_status_interval)
            .field("heartbeat_interval", &self.heartbeat_interval)
            .field("tags", &self.tags)
            .field("extra", &self.extra)
            .finish()
    }
}

/// Parameters for minting a job-scoped token.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScopedTokenRequest {
    /// Job the token is bound to. Must be non-empty.
    pub job_id: String,
    /// Intended audience. `None` and `Some("")` both mean "server default".
    pub audience: Option<String>,
}

impl ScopedTokenRequest {
    pub fn new(job_id: impl Into<String>) -> Self {
        Self { job_id: job_id.into(), audience: None }
    }

    pub fn with_audience(mut self, audience: impl Into<String>) -> Self {
        self.audience = Some(audience.into());
        self
    }

    /// Request path, with the job id encoded as one segment.
    pub fn path(&self) -> Result<String, ApiError> {
        if self.job_id.is_empty() {
            return Err(ApiError::configuration("job id must not be empty"));
        }
        // URL parsing collapses dot segments, even percent-encoded ones.
        if self.job_id == "." || self.job_id == ".." {
            return Err(ApiError::configuration(format!("invalid job id {:?}", self.job_id)));
        }
        Ok(format!("jobs/{}/oidc/tokens", encode_path_segment(&self.job_id)))
    }

    /// Request body. The `audience` key is absent unless an audience is set.
    pub fn body(&self) -> ScopedTokenBody<'_> {
        ScopedTokenBody { audience: self.audience.as_deref().filter(|a| !a.is_empty()) }
    }
}

/// Serialized form of [`ScopedTokenRequest`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ScopedTokenBody<'a> {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub audience: Option<&'a str>,
}

/// Short-lived token bound to a job and audience. Expiry is server-side.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScopedToken {
    pub token: String,
}

impl fmt::Debug for ScopedToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ScopedToken").field("token", &redact(&self.token)).finish()
    }
}

/// Result of a successful `connect`.
#[derive(Debug, Clone, PartialEq)]
pub struct Connected {
    pub status: u16,
    /// Decoded response body; `null` when the server sent none.
    pub body: serde_json::Value,
}

/// Non-negative integer or `None`, whatever the JSON shape.
fn lenient_u64<'de, D: Deserializer<'de>>(de: D) -> Result<Option<u64>, D::Error> {
    let value = serde_json::Value::deserialize(de)?;
    Ok(value.as_u64())
}

fn lenient_strings<'de, D: Deserializer<'de>>(de: D) -> Result<Vec<String>, D::Error> {
    let value = serde_json::Value::deserialize(de)?;
    let items = match value {
        serde_json::Value::Array(items) => items,
        _ => return Ok(Vec::new()),
    };
    Ok(items.into_iter().filter_map(|v| v.as_str().map(str::to_owned)).collect())
}

/// The machine's hostname, if it is readable and valid UTF-8.
fn system_hostname() -> Option<String> {
    let name = hostname::get().ok()?.into_string().ok()?;
    (!name.is_empty()).then_some(name)
}

/// Percent-encode everything outside the RFC 3986 unreserved set.
pub fn encode_path_segment(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for b in s.bytes() {
        match b {
            b'A'..=b'Z' | b'a'..=b'z' | b'0'..=b'9' | b'-' | b'_' | b'.' | b'~' => {
                out.push(b as char)
            }
            _ => out.push_str(&format!("%{b:02X}")),
        }
    }
    out
}

#[cfg(test)]
#[path = "wire_tests.rs"]
mod tests;
