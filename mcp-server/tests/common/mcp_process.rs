//! Drives the compiled `reasoning-mcp-server` binary over stdio, mirroring
//! the teacher's `mcp-server/tests/common/mcp_process.rs` but framed against
//! this gateway's own (hand-rolled, non-`mcp_types`) JSON-RPC envelope.

use std::path::Path;
use std::process::Stdio;
use std::sync::atomic::AtomicI64;
use std::sync::atomic::Ordering;

use anyhow::Context;
use assert_cmd::prelude::*;
use reasoning_protocol::jsonrpc::JSONRPC_VERSION;
use reasoning_protocol::jsonrpc::JsonRpcRequest;
use reasoning_protocol::jsonrpc::RequestId;
use serde_json::Value;
use serde_json::json;
use std::process::Command as StdCommand;
use tokio::io::AsyncBufReadExt;
use tokio::io::AsyncWriteExt;
use tokio::io::BufReader;
use tokio::process::Child;
use tokio::process::ChildStdin;
use tokio::process::ChildStdout;
use tokio::process::Command;

/// One JSON-RPC response or error object read back from the gateway's
/// stdout. Kept untyped (`serde_json::Value`) since a test cares about a
/// handful of fields at a time, not the full shape.
#[derive(Debug, Clone)]
pub struct RawMessage {
    pub id: Option<RequestId>,
    pub value: Value,
}

impl RawMessage {
    pub fn is_error(&self) -> bool {
        self.value.get("error").is_some()
    }

    pub fn error_code(&self) -> Option<i64> {
        self.value.get("error")?.get("code")?.as_i64()
    }

    pub fn result(&self) -> &Value {
        &self.value["result"]
    }
}

pub struct McpProcess {
    next_request_id: AtomicI64,
    #[allow(dead_code)]
    process: Child,
    stdin: ChildStdin,
    stdout: BufReader<ChildStdout>,
}

impl McpProcess {
    /// Spawns the gateway binary with `GEMINI_API_KEY` and (when `mock_base_url`
    /// is set) `GEMINI_BASE_URL` pointed at a local `wiremock` server, plus
    /// `project_root` confined to `project_root` for the Secure Reader.
    pub async fn new(project_root: &Path, mock_base_url: Option<&str>) -> anyhow::Result<Self> {
        let std_cmd = StdCommand::cargo_bin("reasoning-mcp-server")
            .context("should find binary for reasoning-mcp-server")?;
        let program = std_cmd.get_program().to_owned();

        let mut cmd = Command::new(program);
        cmd.current_dir(project_root);
        cmd.stdin(Stdio::piped());
        cmd.stdout(Stdio::piped());
        cmd.stderr(Stdio::null());
        cmd.env("GEMINI_API_KEY", "test-key-not-real");
        if let Some(base_url) = mock_base_url {
            cmd.env("GEMINI_BASE_URL", base_url);
        } else {
            cmd.env_remove("GEMINI_BASE_URL");
        }

        let mut process = cmd
            .kill_on_drop(true)
            .spawn()
            .context("reasoning-mcp-server process should start")?;
        let stdin = process
            .stdin
            .take()
            .ok_or_else(|| anyhow::format_err!("mcp process should have stdin fd"))?;
        let stdout = process
            .stdout
            .take()
            .ok_or_else(|| anyhow::format_err!("mcp process should have stdout fd"))?;

        Ok(Self {
            next_request_id: AtomicI64::new(0),
            process,
            stdin,
            stdout: BufReader::new(stdout),
        })
    }

    pub async fn initialize(&mut self) -> anyhow::Result<RawMessage> {
        self.request("initialize", json!({})).await
    }

    pub async fn ping(&mut self) -> anyhow::Result<RawMessage> {
        self.request("ping", json!({})).await
    }

    pub async fn tools_list(&mut self) -> anyhow::Result<RawMessage> {
        self.request("tools/list", json!({})).await
    }

    pub async fn call_tool(&mut self, name: &str, arguments: Value) -> anyhow::Result<RawMessage> {
        self.request("tools/call", json!({ "name": name, "arguments": arguments }))
            .await
    }

    /// Sends a `tools/call` request without waiting for its response, so the
    /// caller can race a second call against the same resource.
    pub async fn send_call_tool(&mut self, name: &str, arguments: Value) -> anyhow::Result<RequestId> {
        self.send(
            "tools/call",
            json!({ "name": name, "arguments": arguments }),
        )
        .await
    }

    pub async fn request(&mut self, method: &str, params: Value) -> anyhow::Result<RawMessage> {
        let id = self.send(method, params).await?;
        self.read_response_for(id).await
    }

    async fn send(&mut self, method: &str, params: Value) -> anyhow::Result<RequestId> {
        let id = RequestId::Number(self.next_request_id.fetch_add(1, Ordering::Relaxed));
        let request = JsonRpcRequest {
            jsonrpc: JSONRPC_VERSION.to_string(),
            id: id.clone(),
            method: method.to_string(),
            params,
        };
        let payload = serde_json::to_string(&request)?;
        self.stdin.write_all(payload.as_bytes()).await?;
        self.stdin.write_all(b"\n").await?;
        self.stdin.flush().await?;
        Ok(id)
    }

    /// Reads raw JSON-RPC messages until one carries the given id.
    pub async fn read_response_for(&mut self, id: RequestId) -> anyhow::Result<RawMessage> {
        loop {
            let message = self.read_message().await?;
            if message.id.as_ref() == Some(&id) {
                return Ok(message);
            }
        }
    }

    async fn read_message(&mut self) -> anyhow::Result<RawMessage> {
        let mut line = String::new();
        let n = self.stdout.read_line(&mut line).await?;
        if n == 0 {
            anyhow::bail!("reasoning-mcp-server closed stdout before responding");
        }
        let value: Value = serde_json::from_str(&line)
            .with_context(|| format!("failed to parse JSON-RPC line: {line}"))?;
        let id = value
            .get("id")
            .and_then(|v| serde_json::from_value::<RequestId>(v.clone()).ok());
        Ok(RawMessage { id, value })
    }
}
