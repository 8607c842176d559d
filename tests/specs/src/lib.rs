// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Test harness for end-to-end binary smoke tests.
//!
//! Runs the real `agentapi` binary as a subprocess against a stub endpoint.

use std::path::{Path, PathBuf};
use std::process::Stdio;
use std::time::Duration;

use tokio::process::Command;

/// Resolve the path to the compiled `agentapi` binary.
pub fn agentapi_binary() -> PathBuf {
    let manifest = Path::new(env!("CARGO_MANIFEST_DIR"));
    // tests/specs → tests → workspace root
    let workspace = manifest.parent().and_then(|p| p.parent()).unwrap_or(manifest);
    workspace.join("target").join("debug").join("agentapi")
}

/// Captured result of one `agentapi` invocation.
#[derive(Debug)]
pub struct Run {
    pub code: Option<i32>,
    pub stdout: String,
    pub stderr: String,
}

impl Run {
    /// Parse stdout as JSON.
    pub fn json(&self) -> anyhow::Result<serde_json::Value> {
        Ok(serde_json::from_str(&self.stdout)?)
    }
}

/// Builder for one `agentapi` invocation.
pub struct Invocation {
    args: Vec<String>,
    env: Vec<(String, String)>,
    timeout: Duration,
}

impl Invocation {
    pub fn new(args: &[&str]) -> Self {
        Self {
            args: args.iter().map(|a| (*a).to_owned()).collect(),
            env: Vec::new(),
            timeout: Duration::from_secs(10),
        }
    }

    pub fn env(mut self, key: &str, value: &str) -> Self {
        self.env.push((key.to_owned(), value.to_owned()));
        self
    }

    /// Run to completion, killing the process if it outlives the timeout.
    pub async fn run(self) -> anyhow::Result<Run> {
        let binary = agentapi_binary();
        anyhow::ensure!(binary.exists(), "agentapi binary not found at {}", binary.display());

        let mut cmd = Command::new(&binary);
        cmd.args(&self.args)
            .env_remove("AGENTAPI_ENDPOINT")
            .env_remove("AGENTAPI_TOKEN")
            .envs(self.env)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true);

        let output = tokio::time::timeout(self.timeout, cmd.output())
            .await
            .map_err(|_| anyhow::anyhow!("agentapi did not exit within {:?}", self.timeout))??;

        Ok(Run {
            code: output.status.code(),
            stdout: String::from_utf8_lossy(&output.stdout).into_owned(),
            stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
        })
    }
}

/// Run `agentapi` with `args`.
pub async fn agentapi(args: &[&str]) -> anyhow::Result<Run> {
    Invocation::new(args).run().await
}
