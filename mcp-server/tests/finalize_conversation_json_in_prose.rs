//! spec.md §4.4/§8: `finalize_conversation` must pull a JSON object out of a
//! response that wraps it in prose, and the extra text around it must not
//! leak into the structured result.

mod common;

use common::McpProcess;
use common::sequential_server;
use serde_json::json;
use tempfile::TempDir;
use tokio::time::Duration;
use tokio::time::timeout;

const READ_TIMEOUT: Duration = Duration::from_secs(10);

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn finalize_extracts_json_embedded_in_prose() {
    let server = sequential_server(vec![
        "Initial look: this smells like a lock ordering bug between writer and reader threads.",
        r#"Here's my synthesis: {"summary":"a lock ordering bug causes the deadlock","rootCauses":[{"type":"deadlock","description":"writer and reader acquire locks in opposite order","evidence":["worker.rs:42"],"confidence":0.9,"fixStrategy":"acquire locks in a consistent global order"}],"recommendations":{"immediate":["add a lock ordering assertion in debug builds"]}} Hope that helps!"#,
    ])
    .await;

    let project_root = TempDir::new().expect("create temp project root");
    let mut mcp = McpProcess::new(project_root.path(), Some(&server.uri()))
        .await
        .expect("spawn reasoning-mcp-server");
    timeout(READ_TIMEOUT, mcp.initialize())
        .await
        .expect("initialize timed out")
        .expect("initialize failed");

    let start = timeout(
        READ_TIMEOUT,
        mcp.call_tool(
            "start_conversation",
            json!({
                "claude_context": {
                    "attempted_approaches": ["read the logs"],
                    "partial_findings": [],
                    "stuck_description": "intermittent deadlock under load",
                    "code_scope": { "files": [] }
                },
                "analysis_type": "hypothesis_test",
            }),
        ),
    )
    .await
    .expect("start_conversation timed out")
    .expect("start_conversation failed");
    assert!(!start.is_error(), "start_conversation errored: {:?}", start.value);
    let session_id = start.result()["session_id"]
        .as_str()
        .expect("session_id should be a string")
        .to_string();

    let finalize = timeout(
        READ_TIMEOUT,
        mcp.call_tool(
            "finalize_conversation",
            json!({ "session_id": session_id, "summary_format": "detailed" }),
        ),
    )
    .await
    .expect("finalize_conversation timed out")
    .expect("finalize_conversation failed");
    assert!(!finalize.is_error(), "finalize_conversation errored: {:?}", finalize.value);

    let result = finalize.result();
    assert_eq!(result["status"], json!("success"));
    assert_eq!(result["summary"], json!("a lock ordering bug causes the deadlock"));
    let root_causes = result["root_causes"].as_array().expect("root_causes array");
    assert_eq!(root_causes.len(), 1);
    assert_eq!(root_causes[0]["type"], json!("deadlock"));
    assert_eq!(root_causes[0]["evidence"], json!(["worker.rs:42"]));
    let immediate = result["immediate_actions"].as_array().expect("immediate_actions array");
    assert_eq!(immediate.len(), 1);
    assert_eq!(immediate[0]["description"], json!("add a lock ordering assertion in debug builds"));
    assert_eq!(result["ruled_out_approaches"], json!(["read the logs"]));
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn finalize_without_json_is_api_parse_error() {
    let server = sequential_server(vec![
        "Initial look: nothing obviously wrong yet.",
        "I don't have a structured conclusion to offer right now.",
    ])
    .await;

    let project_root = TempDir::new().expect("create temp project root");
    let mut mcp = McpProcess::new(project_root.path(), Some(&server.uri()))
        .await
        .expect("spawn reasoning-mcp-server");
    timeout(READ_TIMEOUT, mcp.initialize())
        .await
        .expect("initialize timed out")
        .expect("initialize failed");

    let start = timeout(
        READ_TIMEOUT,
        mcp.call_tool(
            "start_conversation",
            json!({
                "claude_context": {
                    "attempted_approaches": [],
                    "partial_findings": [],
                    "stuck_description": "unclear failure",
                    "code_scope": { "files": [] }
                },
                "analysis_type": "cross_system",
            }),
        ),
    )
    .await
    .expect("start_conversation timed out")
    .expect("start_conversation failed");
    let session_id = start.result()["session_id"].as_str().expect("session_id").to_string();

    let finalize = timeout(
        READ_TIMEOUT,
        mcp.call_tool("finalize_conversation", json!({ "session_id": session_id })),
    )
    .await
    .expect("finalize_conversation timed out")
    .expect("finalize_conversation failed");

    assert!(finalize.is_error());
    assert_eq!(finalize.error_code(), Some(-32002));
    assert_eq!(finalize.value["error"]["data"]["code"], json!("API_PARSE_ERROR"));
}
