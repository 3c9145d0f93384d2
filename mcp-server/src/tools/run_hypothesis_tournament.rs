use std::time::Duration;

use reasoning_core::error::CoreError;
use reasoning_protocol::RequestContext;
use reasoning_protocol::tools::RunHypothesisTournamentParams;
use serde_json::Value;

use crate::budget::DEFAULT_TOURNAMENT_BUDGET_SECS;
use crate::state::GatewayState;
use crate::validation;

use super::DispatchError;
use super::invalid;
use super::to_value;

/// Extra grace beyond the tournament's own internal budget, covering a
/// single round that runs away after the scheduler's own between-rounds
/// check has already fired (see `TournamentScheduler::run`'s doc comment).
const OUTER_GRACE_SECS: u64 = 60;

pub async fn handle(state: &GatewayState, arguments: Value) -> Result<Value, DispatchError> {
    let params: RunHypothesisTournamentParams = validation::parse_params(&arguments).map_err(invalid)?;
    let budget_secs = DEFAULT_TOURNAMENT_BUDGET_SECS;
    let ctx = RequestContext::from_wire(params.claude_context, budget_secs);
    let config = params.tournament_config.unwrap_or_default();

    let scheduler = state.tournament.clone();
    let issue = params.issue.clone();
    let outer = Duration::from_secs(budget_secs + OUTER_GRACE_SECS);
    let budget = Duration::from_secs(budget_secs);

    let result = tokio::time::timeout(
        outer,
        scheduler.run(ctx, &issue, config, budget),
    )
    .await
    .map_err(|_| {
        DispatchError::Core(CoreError::Unknown(format!(
            "the hypothesis tournament did not return within {}s (budget plus grace)",
            outer.as_secs()
        )))
    })??;

    Ok(to_value(result))
}
