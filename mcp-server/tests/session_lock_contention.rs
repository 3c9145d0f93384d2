//! spec.md §4.5/§5/§8: two `continue_conversation` calls against the same
//! session, issued concurrently, must not both succeed — one must observe
//! `SESSION_LOCKED` (-32001) while the other completes normally. This only
//! exercises real contention because the processor loop dispatches each
//! `tools/call` request onto its own task rather than awaiting them in
//! sequence.

mod common;

use common::McpProcess;
use common::sequential_server_with_delay;
use serde_json::json;
use tokio::time::Duration;
use tokio::time::sleep;
use tokio::time::timeout;
use tempfile::TempDir;

const READ_TIMEOUT: Duration = Duration::from_secs(10);

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn a_concurrent_continue_call_observes_session_locked() {
    // Call 0 is start_conversation's own request; call 1 is the winning
    // continue_conversation's request, held open long enough for the racing
    // second call to observe the lock.
    let server = sequential_server_with_delay(
        vec![
            "Initial look: could be a race condition.",
            "Second opinion after more thought.",
        ],
        1,
        Duration::from_millis(600),
    )
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
                    "stuck_description": "flaky test under load",
                    "code_scope": { "files": [] }
                },
                "analysis_type": "hypothesis_test",
            }),
        ),
    )
    .await
    .expect("start_conversation timed out")
    .expect("start_conversation failed");
    let session_id = start.result()["session_id"].as_str().expect("session_id").to_string();

    let first_id = mcp
        .send_call_tool(
            "continue_conversation",
            json!({ "session_id": session_id, "message": "what about thread B?" }),
        )
        .await
        .expect("send first continue_conversation");

    // Give the first call enough of a head start to acquire the session
    // lock and begin its (delayed) adapter call before the second arrives.
    sleep(Duration::from_millis(100)).await;

    let second_id = mcp
        .send_call_tool(
            "continue_conversation",
            json!({ "session_id": session_id, "message": "what about thread C?" }),
        )
        .await
        .expect("send second continue_conversation");

    let second = timeout(READ_TIMEOUT, mcp.read_response_for(second_id))
        .await
        .expect("second continue_conversation timed out")
        .expect("second continue_conversation failed");
    let first = timeout(READ_TIMEOUT, mcp.read_response_for(first_id))
        .await
        .expect("first continue_conversation timed out")
        .expect("first continue_conversation failed");

    assert!(!first.is_error(), "the call holding the lock should succeed: {:?}", first.value);
    assert!(second.is_error(), "the racing call should observe the lock");
    assert_eq!(second.error_code(), Some(-32001));
    assert_eq!(second.value["error"]["data"]["code"], json!("SESSION_LOCKED"));
}
