// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::transport::TransportError;

/// Raw response bodies kept on errors are capped at this many bytes.
pub const MAX_ERROR_BODY: usize = 4096;

/// Machine-readable error category, one per [`ApiError`] variant.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ErrorKind {
    Authentication,
    NotFound,
    Protocol,
    Configuration,
    Transport,
}

impl ErrorKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Authentication => "AUTHENTICATION",
            Self::NotFound => "NOT_FOUND",
            Self::Protocol => "PROTOCOL",
            Self::Configuration => "CONFIGURATION",
            Self::Transport => "TRANSPORT",
        }
    }
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Failure of a credential-exchange operation.
///
/// Callers branch on the variant. Nothing here is retried by this crate.
#[derive(Debug)]
pub enum ApiError {
    /// The presented token was rejected (401/403). Re-register or abandon the credential.
    Authentication { status: u16, body: String },
    /// The addressed resource (e.g. a job) does not exist (404).
    NotFound { status: u16, body: String },
    /// Unexpected status, or a body that did not decode into the expected shape.
    Protocol { status: Option<u16>, body: String, message: String },
    /// Local contract violation, detected before anything is sent.
    Configuration(String),
    /// Failure reported by the transport, passed through unchanged.
    Transport(TransportError),
}

impl ApiError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::Authentication { .. } => ErrorKind::Authentication,
            Self::NotFound { .. } => ErrorKind::NotFound,
            Self::Protocol { .. } => ErrorKind::Protocol,
            Self::Configuration(_) => ErrorKind::Configuration,
            Self::Transport(_) => ErrorKind::Transport,
        }
    }

    /// HTTP status associated with the failure, if a response was received.
    pub fn status(&self) -> Option<u16> {
        match self {
            Self::Authentication { status, .. } | Self::NotFound { status, .. } => Some(*status),
            Self::Protocol { status, .. } => *status,
            Self::Configuration(_) | Self::Transport(_) => None,
        }
    }

    /// Raw (truncated) response body, if a response was received.
    pub fn body(&self) -> Option<&str> {
        match self {
            Self::Authentication { body, .. }
            | Self::NotFound { body, .. }
            | Self::Protocol { body, .. } => Some(body),
            Self::Configuration(_) | Self::Transport(_) => None,
        }
    }

    pub fn configuration(message: impl Into<String>) -> Self {
        Self::Configuration(message.into())
    }

    /// Classify a non-2xx status.
    ///
    /// `addressed` is true for routes that name a server-side resource in
    /// the path; only those report 404 as [`ApiError::NotFound`].
    pub fn from_status(status: u16, body: &[u8], addressed: bool) -> Self {
        let body = truncate_body(body);
        match status {
            401 | 403 => Self::Authentication { status, body },
            404 if addressed => Self::NotFound { status, body },
            _ => Self::Protocol {
                status: Some(status),
                body,
                message: "unexpected status".to_owned(),
            },
        }
    }

    /// A success response whose body could not be decoded.
    pub fn decode(status: u16, body: &[u8], err: &serde_json::Error) -> Self {
        Self::Protocol {
            status: Some(status),
            body: truncate_body(body),
            message: format!("invalid response body: {err}"),
        }
    }
}

impl fmt::Display for ApiError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Authentication { status, body } => {
                write!(f, "authentication failed ({status}): {body}")
            }
            Self::NotFound { status, body } => write!(f, "not found ({status}): {body}"),
            // A 2xx body may hold credentials; it stays reachable via `body()`.
            Self::Protocol { status: Some(status), message, .. } if (200..300).contains(status) => {
                write!(f, "protocol error ({status}): {message}")
            }
            Self::Protocol { status: Some(status), body, message } => {
                write!(f, "protocol error ({status}): {message}: {body}")
            }
            Self::Protocol { status: None, message, .. } => write!(f, "protocol error: {message}"),
            Self::Configuration(message) => write!(f, "configuration error: {message}"),
            Self::Transport(err) => write!(f, "transport error: {err}"),
        }
    }
}

impl std::error::Error for ApiError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Transport(err) => Some(err),
            _ => None,
        }
    }
}

impl From<TransportError> for ApiError {
    fn from(err: TransportError) -> Self {
        Self::Transport(err)
    }
}

/// Lossy UTF-8 copy of a response body, cut at [`MAX_ERROR_BODY`] bytes.
pub fn truncate_body(body: &[u8]) -> String {
    let text = String::from_utf8_lossy(body);
    if text.len() <= MAX_ERROR_BODY {
        return text.into_owned();
    }
    let mut end = MAX_ERROR_BODY;
    while !text.is_char_boundary(end) {
        end -= 1;
    }
    format!("{}...", &text[..end])
}

#[cfg(test)]
#[path = "error_tests.rs"]
mod tests;
