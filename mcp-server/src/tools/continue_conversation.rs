use reasoning_protocol::tools::ContinueConversationParams;
use reasoning_protocol::tools::ContinueConversationResult;
use serde_json::Value;

use crate::state::GatewayState;
use crate::validation;

use super::DispatchError;
use super::invalid;
use super::parse_session_id;
use super::to_value;

pub async fn handle(state: &GatewayState, arguments: Value) -> Result<Value, DispatchError> {
    let params: ContinueConversationParams = validation::parse_params(&arguments).map_err(invalid)?;
    let session_id = parse_session_id(&params.session_id)?;
    let include_snippets = params.include_code_snippets.unwrap_or(false);

    let outcome = state
        .orchestrator
        .continue_conversation(session_id, &params.message, include_snippets)
        .await?;

    Ok(to_value(ContinueConversationResult {
        response: outcome.response,
        analysis_progress: outcome.progress,
        can_finalize: outcome.finalizable,
        status: outcome.status,
    }))
}
