use reasoning_protocol::RequestContext;
use reasoning_protocol::tools::StartConversationParams;
use reasoning_protocol::tools::StartConversationResult;
use serde_json::Value;

use crate::budget::DEFAULT_REQUEST_BUDGET_SECS;
use crate::state::GatewayState;
use crate::validation;

use super::DispatchError;
use super::invalid;
use super::to_value;

pub async fn handle(state: &GatewayState, arguments: Value) -> Result<Value, DispatchError> {
    let params: StartConversationParams = validation::parse_params(&arguments).map_err(invalid)?;
    let ctx = RequestContext::from_wire(params.claude_context, DEFAULT_REQUEST_BUDGET_SECS);

    let outcome = state
        .orchestrator
        .start_conversation(ctx, params.analysis_type, params.initial_question.as_deref())
        .await?;

    Ok(to_value(StartConversationResult {
        session_id: outcome.session_id.to_string(),
        initial_response: outcome.initial_response,
        suggested_follow_ups: outcome.follow_ups,
        status: outcome.status,
    }))
}
