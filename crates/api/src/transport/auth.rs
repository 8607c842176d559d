// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! `Authorization: Token <token>` header handling.

/// Scheme prefix used by the control endpoint. Not `Bearer`.
pub const TOKEN_SCHEME: &str = "Token ";

/// Format the `Authorization` header value for a token.
pub fn authorization_value(token: &str) -> String {
    format!("{TOKEN_SCHEME}{token}")
}

/// Extract the token from an `Authorization` header value.
///
/// Returns `None` when the value does not use the `Token` scheme.
pub fn parse_authorization(value: &str) -> Option<&str> {
    value.strip_prefix(TOKEN_SCHEME)
}

/// Constant-time string comparison to prevent timing side-channel attacks.
pub fn constant_time_eq(a: &str, b: &str) -> bool {
    let a = a.as_bytes();
    let b = b.as_bytes();
    if a.len() != b.len() {
        return false;
    }
    let mut acc = 0u8;
    for (x, y) in a.iter().zip(b.iter()) {
        acc |= x ^ y;
    }
    acc == 0
}

/// Check a raw `Authorization` header value against the expected token.
pub fn token_matches(header: Option<&str>, expected: &str) -> bool {
    match header.and_then(parse_authorization) {
        Some(token) => constant_time_eq(token, expected),
        None => false,
    }
}

#[cfg(test)]
#[path = "auth_tests.rs"]
mod tests;
