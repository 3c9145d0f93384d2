//! The stdio JSON-RPC transport binary (spec.md §6's explicitly out-of-scope
//! "transport layer"). One task reads stdin and parses each line as a JSON-RPC
//! message, one task dispatches each message against the gateway's core, and
//! one task writes responses back to stdout — the same three-task-plus-channel
//! shape `mcp-server/src/lib.rs` used in the teacher, sized down to the four
//! methods this surface actually needs (`initialize`, `ping`, `tools/list`,
//! `tools/call`) instead of the teacher's full MCP method table.
#![deny(clippy::print_stdout, clippy::print_stderr)]

mod budget;
mod error_response;
mod mcp;
mod state;
mod tools;
mod validation;

use std::io::Result as IoResult;

use reasoning_core::GatewayConfig;
use reasoning_protocol::jsonrpc::IncomingMessage;
use reasoning_protocol::jsonrpc::JsonRpcErrorResponse;
use reasoning_protocol::jsonrpc::JsonRpcResponse;
use reasoning_protocol::jsonrpc::OutgoingMessage;
use reasoning_protocol::jsonrpc::RequestId;
use tokio::io::AsyncBufReadExt;
use tokio::io::AsyncWriteExt;
use tokio::io::BufReader;
use tokio::io::{self};
use tokio::sync::mpsc;
use tracing::debug;
use tracing::error;
use tracing::info;
use tracing::warn;

use crate::mcp::CallToolParams;
use crate::mcp::CallToolResult;
use crate::mcp::InitializeResult;
use crate::state::GatewayState;
use crate::tools::DispatchError;

const CHANNEL_CAPACITY: usize = 128;

pub async fn run_main() -> anyhow::Result<()> {
    let config = GatewayConfig::from_env(None)?;

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(config.tracing_filter())),
        )
        .with_writer(std::io::stderr)
        .init();

    let state = std::sync::Arc::new(GatewayState::new(config));

    let (incoming_tx, mut incoming_rx) = mpsc::channel::<IncomingMessage>(CHANNEL_CAPACITY);
    let (outgoing_tx, mut outgoing_rx) = mpsc::channel::<OutgoingMessage>(CHANNEL_CAPACITY);

    let stdin_reader_handle = tokio::spawn({
        let incoming_tx = incoming_tx.clone();
        async move {
            let stdin = io::stdin();
            let reader = BufReader::new(stdin);
            let mut lines = reader.lines();

            while let Some(line) = lines.next_line().await.unwrap_or_default() {
                if line.trim().is_empty() {
                    continue;
                }
                match serde_json::from_str::<IncomingMessage>(&line) {
                    Ok(msg) => {
                        if incoming_tx.send(msg).await.is_err() {
                            break;
                        }
                    }
                    Err(e) => warn!("failed to parse JSON-RPC message: {e}"),
                }
            }

            debug!("stdin reader finished (EOF)");
        }
    });
    drop(incoming_tx);

    let processor_handle = tokio::spawn({
        let outgoing_tx = outgoing_tx.clone();
        let state = state.clone();
        async move {
            while let Some(msg) = incoming_rx.recv().await {
                match msg {
                    // Each request is dispatched onto its own task so a
                    // long-running tool call (an in-flight remote dialogue)
                    // never blocks `ping`/`tools/list` or a concurrent call
                    // against a different session (spec.md §5's bounded
                    // parallelism, §8's session-lock-contention scenario).
                    IncomingMessage::Request(req) => {
                        let state = state.clone();
                        let outgoing_tx = outgoing_tx.clone();
                        tokio::spawn(async move {
                            let response =
                                handle_request(&state, req.method.as_str(), req.params, req.id).await;
                            let _ = outgoing_tx.send(response).await;
                        });
                    }
                    IncomingMessage::Notification(note) => {
                        debug!(method = %note.method, "ignoring notification");
                    }
                }
            }
            info!("processor task exited (channel closed)");
        }
    });
    drop(outgoing_tx);

    let stdout_writer_handle = tokio::spawn(async move {
        let mut stdout = io::stdout();
        while let Some(msg) = outgoing_rx.recv().await {
            match serde_json::to_string(&msg) {
                Ok(json) => {
                    if let Err(e) = stdout.write_all(json.as_bytes()).await {
                        error!("failed to write to stdout: {e}");
                        break;
                    }
                    if let Err(e) = stdout.write_all(b"\n").await {
                        error!("failed to write newline to stdout: {e}");
                        break;
                    }
                    if let Err(e) = stdout.flush().await {
                        error!("failed to flush stdout: {e}");
                        break;
                    }
                }
                Err(e) => error!("failed to serialize JSON-RPC response: {e}"),
            }
        }
        info!("stdout writer exited (channel closed)");
    });

    let _ = tokio::join!(stdin_reader_handle, processor_handle, stdout_writer_handle);
    Ok(())
}

async fn handle_request(
    state: &GatewayState,
    method: &str,
    params: serde_json::Value,
    id: RequestId,
) -> OutgoingMessage {
    match method {
        "initialize" => OutgoingMessage::Response(JsonRpcResponse::new(
            id,
            serde_json::to_value(InitializeResult::default()).unwrap_or(serde_json::Value::Null),
        )),
        "ping" => OutgoingMessage::Response(JsonRpcResponse::new(id, serde_json::json!({}))),
        "tools/list" => OutgoingMessage::Response(JsonRpcResponse::new(
            id,
            serde_json::json!({ "tools": mcp::tool_catalog() }),
        )),
        "tools/call" => handle_tool_call(state, params, id).await,
        other => OutgoingMessage::Error(JsonRpcErrorResponse::new(
            id,
            error_response::method_not_found(other),
        )),
    }
}

async fn handle_tool_call(state: &GatewayState, params: serde_json::Value, id: RequestId) -> OutgoingMessage {
    let call: CallToolParams = match validation::parse_params(&params) {
        Ok(call) => call,
        Err(field_error) => {
            return OutgoingMessage::Error(JsonRpcErrorResponse::new(
                id,
                error_response::invalid_params(&[field_error]),
            ));
        }
    };

    match tools::dispatch(state, &call.name, call.arguments).await {
        Ok(value) => {
            let result = CallToolResult::ok(&value);
            OutgoingMessage::Response(JsonRpcResponse::new(
                id,
                serde_json::to_value(result).unwrap_or(serde_json::Value::Null),
            ))
        }
        Err(DispatchError::InvalidParams(errors)) => {
            OutgoingMessage::Error(JsonRpcErrorResponse::new(id, error_response::invalid_params(&errors)))
        }
        Err(DispatchError::UnknownTool(name)) => {
            OutgoingMessage::Error(JsonRpcErrorResponse::new(id, error_response::unknown_tool(&name)))
        }
        Err(DispatchError::Core(err)) => {
            OutgoingMessage::Error(JsonRpcErrorResponse::new(id, error_response::from_core_error(&err)))
        }
    }
}
