// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Client for the agent control endpoint's credential exchange.
//!
//! A [`RegistrationClient`] trades a registration token for an access token.
//! [`derive_client`] turns the response into an [`AgentClient`], which can
//! connect and mint job-scoped tokens.

pub mod cli;
pub mod client;
pub mod config;
pub mod credential;
pub mod error;
pub mod factory;
pub mod register;
pub mod test_support;
pub mod transport;
pub mod wire;

pub use client::AgentClient;
pub use credential::Credential;
pub use error::{ApiError, ErrorKind};
pub use factory::derive_client;
pub use register::RegistrationClient;
pub use transport::{Transport, TransportError, TransportErrorKind};
pub use wire::{
    Connected, RegistrationRequest, RegistrationResponse, ScopedToken, ScopedTokenRequest,
};
