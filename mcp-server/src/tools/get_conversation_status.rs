use reasoning_protocol::tools::GetConversationStatusParams;
use reasoning_protocol::tools::GetConversationStatusResult;
use serde_json::Value;

use crate::state::GatewayState;
use crate::validation;

use super::DispatchError;
use super::invalid;
use super::parse_session_id;
use super::to_value;

pub async fn handle(state: &GatewayState, arguments: Value) -> Result<Value, DispatchError> {
    let params: GetConversationStatusParams = validation::parse_params(&arguments).map_err(invalid)?;
    let session_id = parse_session_id(&params.session_id)?;

    let snapshot = state.orchestrator.status(session_id).await?;

    Ok(to_value(GetConversationStatusResult {
        status: snapshot.status,
        turn_count: snapshot.turn_count,
        last_activity_epoch_secs: snapshot.last_activity_epoch_secs,
        progress: snapshot.progress.confidence,
        can_finalize: snapshot.can_finalize,
    }))
}
