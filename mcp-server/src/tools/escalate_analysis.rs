use std::time::Duration;

use reasoning_protocol::RequestContext;
use reasoning_protocol::SummaryFormat;
use reasoning_protocol::tools::EscalateAnalysisParams;
use serde_json::Value;

use crate::budget;
use crate::state::GatewayState;
use crate::validation;

use super::DispatchError;
use super::invalid;
use super::to_value;

pub async fn handle(state: &GatewayState, arguments: Value) -> Result<Value, DispatchError> {
    let params: EscalateAnalysisParams = validation::parse_params(&arguments).map_err(invalid)?;
    let budget_secs = params.time_budget_seconds;

    let mut ctx = RequestContext::from_wire(params.claude_context, budget_secs);
    ctx.stuck_points
        .push(format!("Requested analysis depth level: {}", params.depth_level));
    let fallback_ctx = ctx.clone();

    let orchestrator = state.orchestrator.clone();
    let kind = params.analysis_type;
    let result = budget::one_shot_analysis(Duration::from_secs(budget_secs), &fallback_ctx, async move {
        let start = orchestrator.start_conversation(ctx, kind, None).await?;
        let outcome = orchestrator
            .finalize_conversation(start.session_id, SummaryFormat::default())
            .await?;
        Ok(outcome.result)
    })
    .await?;

    Ok(to_value(result))
}
