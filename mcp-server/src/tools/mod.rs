//! Per-tool handler modules for the ten tools of spec.md §6. Each module
//! validates its own parameter shape, calls into `reasoning_core`, and
//! returns a JSON value ready to embed in a `CallToolResult`, mirroring the
//! teacher's one-handler-per-tool layout (`mcp-server/src/tool_handlers/`).

mod continue_conversation;
mod cross_system_impact;
mod escalate_analysis;
mod finalize_conversation;
mod get_conversation_status;
mod performance_bottleneck;
mod run_hypothesis_tournament;
mod start_conversation;
mod trace_execution_path;

use serde::Serialize;
use serde_json::Value;

use reasoning_core::error::CoreError;
use reasoning_protocol::SessionId;

use crate::state::GatewayState;
use crate::validation::FieldError;

pub enum DispatchError {
    InvalidParams(Vec<FieldError>),
    UnknownTool(String),
    Core(CoreError),
}

impl From<CoreError> for DispatchError {
    fn from(err: CoreError) -> Self {
        Self::Core(err)
    }
}

pub(crate) fn to_value(result: impl Serialize) -> Value {
    serde_json::to_value(result).unwrap_or(Value::Null)
}

pub(crate) fn invalid(err: crate::validation::FieldError) -> DispatchError {
    DispatchError::InvalidParams(vec![err])
}

/// `session_id` arrives over the wire as a plain string (spec.md §6); a
/// malformed one is a parameter error, not a missing-session error.
pub(crate) fn parse_session_id(raw: &str) -> Result<SessionId, DispatchError> {
    uuid::Uuid::parse_str(raw)
        .map(SessionId::from)
        .map_err(|e| {
            invalid(FieldError {
                field_path: "session_id".to_string(),
                message: format!("`{raw}` is not a valid session id: {e}"),
            })
        })
}

pub async fn dispatch(
    state: &GatewayState,
    name: &str,
    arguments: Value,
) -> Result<Value, DispatchError> {
    match name {
        "escalate_analysis" => escalate_analysis::handle(state, arguments).await,
        "trace_execution_path" => trace_execution_path::handle(state, arguments).await,
        "cross_system_impact" => cross_system_impact::handle(state, arguments).await,
        "performance_bottleneck" => performance_bottleneck::handle(state, arguments).await,
        "hypothesis_test" => hypothesis_test::handle(state, arguments).await,
        "start_conversation" => start_conversation::handle(state, arguments).await,
        "continue_conversation" => continue_conversation::handle(state, arguments).await,
        "finalize_conversation" => finalize_conversation::handle(state, arguments).await,
        "get_conversation_status" => get_conversation_status::handle(state, arguments).await,
        "run_hypothesis_tournament" => run_hypothesis_tournament::handle(state, arguments).await,
        other => Err(DispatchError::UnknownTool(other.to_string())),
    }
}
