// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Command-line front end: register, connect, and mint tokens from a shell.

use clap::{Parser, Subcommand};
use serde_json::{json, Value};
use tracing::info;

use crate::client::AgentClient;
use crate::config::ApiConfig;
use crate::error::{ApiError, ErrorKind};
use crate::register::RegistrationClient;
use crate::wire::{RegistrationRequest, ScopedTokenRequest};

/// Exit code for invalid configuration or arguments.
pub const EXIT_CONFIG: i32 = 2;
/// Exit code for any other failure.
pub const EXIT_FAILURE: i32 = 1;

/// Credential-exchange client for the agent control endpoint.
#[derive(Debug, Parser)]
#[command(name = "agentapi", version, about)]
pub struct Cli {
    #[command(flatten)]
    pub api: ApiConfig,

    /// Log level filter (e.g. `warn`, `agentapi=debug`).
    #[arg(long, default_value = "warn", env = "AGENTAPI_LOG_LEVEL")]
    pub log_level: String,

    /// Log format: `text` or `json`.
    #[arg(long, default_value = "text", env = "AGENTAPI_LOG_FORMAT")]
    pub log_format: String,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Register with the registration token and print the response.
    Register(RegisterArgs),
    /// Perform the connect handshake with an access token.
    Connect,
    /// Mint a job-scoped token with an access token.
    Token(TokenArgs),
}

#[derive(Debug, Clone, clap::Args)]
pub struct RegisterArgs {
    /// Instance name.
    #[arg(long)]
    pub name: Option<String>,

    /// Hostname to report. Defaults to the system hostname.
    #[arg(long)]
    pub hostname: Option<String>,

    /// `key=value` tag. Repeatable.
    #[arg(long = "tag", value_parser = parse_tag)]
    pub tags: Vec<String>,

    /// Dispatch priority.
    #[arg(long)]
    pub priority: Option<String>,

    /// Derive an access-token client and connect after registering.
    #[arg(long)]
    pub connect: bool,

    /// Print the access token instead of a placeholder.
    #[arg(long)]
    pub show_token: bool,
}

#[derive(Debug, Clone, clap::Args)]
pub struct TokenArgs {
    /// Job the token is bound to.
    #[arg(long)]
    pub job: String,

    /// Audience claim for the token.
    #[arg(long)]
    pub audience: Option<String>,
}

fn parse_tag(s: &str) -> Result<String, String> {
    match s.split_once('=') {
        Some((k, _)) if !k.is_empty() => Ok(s.to_owned()),
        _ => Err(format!("expected key=value, got {s:?}")),
    }
}

impl RegisterArgs {
    pub fn request(&self) -> RegistrationRequest {
        RegistrationRequest {
            name: self.name.clone(),
            hostname: self.hostname.clone(),
            tags: self.tags.clone(),
            priority: self.priority.clone(),
            ..Default::default()
        }
        .with_host_defaults()
    }
}

/// Run one subcommand and return its JSON output.
pub async fn run(cli: &Cli) -> anyhow::Result<Value> {
    cli.api.validate()?;
    let credential = cli.api.credential()?;
    let transport = cli.api.transport()?;

    match cli.command {
        Command::Register(ref args) => {
            let client = RegistrationClient::new(credential, transport);
            let resp = client.register(&args.request()).await?;
            info!(id = %resp.id, name = %resp.name, "registered");

            let registration = if args.show_token {
                serde_json::to_value(&resp)?
            } else {
                resp.redacted()
            };
            let mut out = json!({ "registration": registration });
            if args.connect {
                let agent = client.derive_client(&resp)?;
                let connected = agent.connect().await?;
                info!(status = connected.status, "connected");
                out["connected"] = json!(true);
            }
            Ok(out)
        }
        Command::Connect => {
            let agent = AgentClient::new(credential, transport);
            let connected = agent.connect().await?;
            info!(status = connected.status, "connected");
            Ok(json!({ "status": connected.status, "body": connected.body }))
        }
        Command::Token(ref args) => {
            let agent = AgentClient::new(credential, transport);
            let mut request = ScopedTokenRequest::new(args.job.clone());
            if let Some(ref audience) = args.audience {
                request = request.with_audience(audience.clone());
            }
            let token = agent.mint_scoped_token(&request).await?;
            info!(job = %args.job, "minted scoped token");
            Ok(json!({ "token": token.token }))
        }
    }
}

/// Map a failure from [`run`] to a process exit code.
pub fn exit_code(err: &anyhow::Error) -> i32 {
    match err.downcast_ref::<ApiError>().map(ApiError::kind) {
        Some(ErrorKind::Configuration) => EXIT_CONFIG,
        _ => EXIT_FAILURE,
    }
}

#[cfg(test)]
#[path = "cli_tests.rs"]
mod tests;
