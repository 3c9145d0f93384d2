use reasoning_protocol::SummaryFormat;
use reasoning_protocol::tools::FinalizeConversationParams;
use serde_json::Value;

use crate::state::GatewayState;
use crate::validation;

use super::DispatchError;
use super::invalid;
use super::parse_session_id;
use super::to_value;

pub async fn handle(state: &GatewayState, arguments: Value) -> Result<Value, DispatchError> {
    let params: FinalizeConversationParams = validation::parse_params(&arguments).map_err(invalid)?;
    let session_id = parse_session_id(&params.session_id)?;
    let format = params.summary_format.unwrap_or(SummaryFormat::Concise);

    let outcome = state
        .orchestrator
        .finalize_conversation(session_id, format)
        .await?;

    Ok(to_value(outcome.result))
}
