//! spec.md §7/§8: an unknown session id classifies as `SESSION_NOT_FOUND`
//! (-32001) while a malformed one never reaches the session manager at all
//! and is reported as `INVALID_PARAMS` (-32602). Neither needs a mock
//! server — both are rejected before any remote call.

mod common;

use common::McpProcess;
use serde_json::json;
use tempfile::TempDir;
use tokio::time::Duration;
use tokio::time::timeout;

const READ_TIMEOUT: Duration = Duration::from_secs(10);

async fn started_process() -> (TempDir, McpProcess) {
    let project_root = TempDir::new().expect("create temp project root");
    let mut mcp = McpProcess::new(project_root.path(), None)
        .await
        .expect("spawn reasoning-mcp-server");
    timeout(READ_TIMEOUT, mcp.initialize())
        .await
        .expect("initialize timed out")
        .expect("initialize failed");
    (project_root, mcp)
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn unknown_session_id_is_session_not_found() {
    let (_root, mut mcp) = started_process().await;

    let resp = timeout(
        READ_TIMEOUT,
        mcp.call_tool(
            "get_conversation_status",
            json!({ "session_id": "00000000-0000-0000-0000-000000000000" }),
        ),
    )
    .await
    .expect("call timed out")
    .expect("call failed");

    assert!(resp.is_error());
    assert_eq!(resp.error_code(), Some(-32001));
    assert_eq!(
        resp.value["error"]["data"]["code"],
        json!("SESSION_NOT_FOUND")
    );
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn malformed_session_id_is_invalid_params() {
    let (_root, mut mcp) = started_process().await;

    let resp = timeout(
        READ_TIMEOUT,
        mcp.call_tool(
            "get_conversation_status",
            json!({ "session_id": "not-a-uuid-at-all" }),
        ),
    )
    .await
    .expect("call timed out")
    .expect("call failed");

    assert!(resp.is_error());
    assert_eq!(resp.error_code(), Some(-32602));
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn missing_required_field_is_invalid_params() {
    let (_root, mut mcp) = started_process().await;

    let resp = timeout(READ_TIMEOUT, mcp.call_tool("get_conversation_status", json!({})))
        .await
        .expect("call timed out")
        .expect("call failed");

    assert!(resp.is_error());
    assert_eq!(resp.error_code(), Some(-32602));
}
