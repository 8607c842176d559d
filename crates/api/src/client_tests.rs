// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use serde_json::json;

use super::*;
use crate::error::ErrorKind;
use crate::test_support::RecordingTransport;
use crate::transport::{TransportErrorKind, TransportResponse};

fn client(transport: Arc<RecordingTransport>) -> anyhow::Result<AgentClient> {
    let credential = Credential::new("http://agent.test/v3", "alpacas")?;
    Ok(AgentClient::new(credential, transport))
}

// -- connect ------------------------------------------------------------------

#[tokio::test]
async fn connect_posts_with_access_token_and_no_body() -> anyhow::Result<()> {
    let transport = RecordingTransport::always(200, "{}");
    let client = client(Arc::clone(&transport))?;

    let connected = client.connect().await?;
    assert_eq!(connected.status, 200);
    assert_eq!(connected.body, json!({}));

    let requests = transport.requests();
    assert_eq!(requests.len(), 1);
    assert_eq!(requests[0].method, "POST");
    assert_eq!(requests[0].path, "/connect");
    assert_eq!(requests[0].authorization.as_deref(), Some("Token alpacas"));
    assert_eq!(requests[0].body, None);
    Ok(())
}

#[tokio::test]
async fn connect_accepts_empty_body() -> anyhow::Result<()> {
    let client = client(RecordingTransport::always(204, ""))?;
    let connected = client.connect().await?;
    assert_eq!(connected.status, 204);
    assert!(connected.body.is_null());
    Ok(())
}

#[tokio::test]
async fn connect_is_repeatable() -> anyhow::Result<()> {
    let transport = RecordingTransport::always(200, "{}");
    let client = client(Arc::clone(&transport))?;

    client.connect().await?;
    client.connect().await?;
    assert_eq!(transport.request_count(), 2);
    assert_eq!(client.credential().token(), "alpacas");
    Ok(())
}

#[yare::parameterized(
    unauthorized = { 401, ErrorKind::Authentication },
    forbidden    = { 403, ErrorKind::Authentication },
    not_found    = { 404, ErrorKind::Protocol },
    server_error = { 500, ErrorKind::Protocol },
)]
#[test_macro(tokio::test)]
async fn connect_classifies_failures(status: u16, expected: ErrorKind) {
    let transport = RecordingTransport::always(status, "nope");
    let client = client(Arc::clone(&transport)).expect("valid client");

    let err = client.connect().await.err();
    assert_eq!(err.map(|e| e.kind()), Some(expected));
    assert_eq!(transport.request_count(), 1);
}

// -- mint_scoped_token --------------------------------------------------------

#[tokio::test]
async fn mint_posts_to_job_path_without_audience() -> anyhow::Result<()> {
    let transport = RecordingTransport::always(200, r#"{"token":"eyJ.job"}"#);
    let client = client(Arc::clone(&transport))?;

    let token = client.mint_scoped_token(&ScopedTokenRequest::new("job-1")).await?;
    assert_eq!(token.token, "eyJ.job");

    let requests = transport.requests();
    assert_eq!(requests.len(), 1);
    assert_eq!(requests[0].method, "POST");
    assert_eq!(requests[0].path, "/jobs/job-1/oidc/tokens");
    assert_eq!(requests[0].authorization.as_deref(), Some("Token alpacas"));
    assert_eq!(requests[0].body, Some(json!({})));
    Ok(())
}

#[tokio::test]
async fn mint_sends_audience_when_set() -> anyhow::Result<()> {
    let transport = RecordingTransport::always(200, r#"{"token":"eyJ.aud"}"#);
    let client = client(Arc::clone(&transport))?;

    let request = ScopedTokenRequest::new("job-1").with_audience("sts.amazonaws.com");
    client.mint_scoped_token(&request).await?;

    let body = transport.requests()[0].body.clone();
    assert_eq!(body, Some(json!({ "audience": "sts.amazonaws.com" })));
    Ok(())
}

#[tokio::test]
async fn mint_with_empty_job_id_sends_nothing() -> anyhow::Result<()> {
    let transport = RecordingTransport::always(200, r#"{"token":"x"}"#);
    let client = client(Arc::clone(&transport))?;

    let err = client.mint_scoped_token(&ScopedTokenRequest::new("")).await.err();
    assert_eq!(err.map(|e| e.kind()), Some(ErrorKind::Configuration));
    assert_eq!(transport.request_count(), 0);
    Ok(())
}

#[yare::parameterized(
    unauthorized = { 401, ErrorKind::Authentication },
    forbidden    = { 403, ErrorKind::Authentication },
    unknown_job  = { 404, ErrorKind::NotFound },
    conflict     = { 409, ErrorKind::Protocol },
    server_error = { 500, ErrorKind::Protocol },
)]
#[test_macro(tokio::test)]
async fn mint_classifies_failures(status: u16, expected: ErrorKind) {
    let client = client(RecordingTransport::always(status, "nope")).expect("valid client");

    let err = client.mint_scoped_token(&ScopedTokenRequest::new("job-1")).await.err();
    assert_eq!(err.map(|e| e.kind()), Some(expected));
}

#[tokio::test]
async fn mint_missing_token_field_is_protocol_error() -> anyhow::Result<()> {
    let client = client(RecordingTransport::always(200, r#"{"jwt":"x"}"#))?;

    let err = client.mint_scoped_token(&ScopedTokenRequest::new("job-1")).await.err();
    assert_eq!(err.map(|e| e.kind()), Some(ErrorKind::Protocol));
    Ok(())
}

#[tokio::test]
async fn mint_propagates_transport_failure() -> anyhow::Result<()> {
    let client = client(RecordingTransport::failing(TransportErrorKind::Connect))?;

    let err = client.mint_scoped_token(&ScopedTokenRequest::new("job-1")).await.err();
    assert_eq!(err.map(|e| e.kind()), Some(ErrorKind::Transport));
    Ok(())
}

#[tokio::test]
async fn minting_does_not_touch_client_credential() -> anyhow::Result<()> {
    let transport = RecordingTransport::new(|req| {
        let job = req.path.split('/').nth(2).unwrap_or_default().to_owned();
        Ok(TransportResponse::new(200, json!({ "token": format!("tok-{job}") }).to_string()))
    });
    let client = client(Arc::clone(&transport))?;

    let a = client.mint_scoped_token(&ScopedTokenRequest::new("a")).await?;
    let b = client.mint_scoped_token(&ScopedTokenRequest::new("b")).await?;
    assert_eq!(a.token, "tok-a");
    assert_eq!(b.token, "tok-b");
    assert_eq!(client.credential().token(), "alpacas");
    assert!(transport.requests().iter().all(|r| r.has_token("alpacas")));
    Ok(())
}

#[tokio::test]
async fn connect_keeps_non_json_body_as_text() -> anyhow::Result<()> {
    let client = client(RecordingTransport::always(200, "ok"))?;
    let connected = client.connect().await?;
    assert_eq!(connected.body, json!("ok"));
    Ok(())
}
