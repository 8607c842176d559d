// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! End-to-end smoke tests that run the real `agentapi` binary against a
//! stub control endpoint.

use agentapi::test_support::StubServer;
use agentapi_specs::{agentapi, Invocation};

#[tokio::test]
async fn register_prints_redacted_registration() -> anyhow::Result<()> {
    let server = StubServer::agent_api("llamas", "alpacas").await?;
    let url = server.url();

    let run = agentapi(&["--endpoint", url.as_str(), "--token", "llamas", "register"]).await?;
    assert_eq!(run.code, Some(0), "stderr: {}", run.stderr);

    let out = run.json()?;
    assert_eq!(out["registration"]["id"], "12-34-56-78-91");
    assert_eq!(out["registration"]["access_token"], "<redacted>");
    assert!(!run.stdout.contains("alpacas"));
    assert!(!run.stderr.contains("alpacas"));
    Ok(())
}

#[tokio::test]
async fn register_and_connect() -> anyhow::Result<()> {
    let server = StubServer::agent_api("llamas", "alpacas").await?;
    let url = server.url();

    let run = Invocation::new(&["register", "--name", "smoke", "--connect"])
        .env("AGENTAPI_ENDPOINT", &url)
        .env("AGENTAPI_TOKEN", "llamas")
        .env("AGENTAPI_LOG_LEVEL", "debug")
        .run()
        .await?;
    assert_eq!(run.code, Some(0), "stderr: {}", run.stderr);
    assert_eq!(run.json()?["connected"], true);

    let connect = server.requests_to("/connect");
    assert_eq!(connect.len(), 1);
    assert!(connect[0].has_token("alpacas"));

    // Debug logs go to stderr and never carry tokens.
    assert!(run.stderr.contains("api request"), "stderr: {}", run.stderr);
    assert!(!run.stderr.contains("llamas"));
    assert!(!run.stderr.contains("alpacas"));
    Ok(())
}

#[tokio::test]
async fn token_prints_scoped_token() -> anyhow::Result<()> {
    let server = StubServer::agent_api("llamas", "alpacas").await?;
    let url = server.url();

    let args = ["--endpoint", url.as_str(), "--token", "alpacas", "token", "--job", "j9"];
    let run = agentapi(&args).await?;
    assert_eq!(run.code, Some(0), "stderr: {}", run.stderr);
    assert_eq!(run.json()?["token"], "oidc:j9:-");
    Ok(())
}

#[tokio::test]
async fn rejected_token_exits_one() -> anyhow::Result<()> {
    let server = StubServer::agent_api("llamas", "alpacas").await?;
    let url = server.url();

    let run = agentapi(&["--endpoint", url.as_str(), "--token", "llamas", "connect"]).await?;
    assert_eq!(run.code, Some(1));
    assert!(run.stderr.contains("authentication failed"), "stderr: {}", run.stderr);
    assert!(run.stdout.is_empty());
    Ok(())
}

#[tokio::test]
async fn missing_token_exits_two() -> anyhow::Result<()> {
    let run = agentapi(&["connect"]).await?;
    assert_eq!(run.code, Some(2));
    assert!(run.stderr.contains("--token"), "stderr: {}", run.stderr);
    Ok(())
}
