//! Per-request time budgets (spec.md §5): every one-shot analysis tool runs
//! under `tokio::time::timeout`; when the budget trips, the tool degrades to
//! a partial [`AnalysisResult`] instead of a bare error, preserving whatever
//! the caller already told us rather than discarding it.

use std::future::Future;
use std::time::Duration;

use reasoning_core::error::CoreError;
use reasoning_protocol::AnalysisResult;
use reasoning_protocol::AnalysisStatus;
use reasoning_protocol::RequestContext;

pub use reasoning_core::config::DEFAULT_REQUEST_BUDGET_SECS;
pub use reasoning_core::config::DEFAULT_TOURNAMENT_BUDGET_SECS;

/// Run a one-shot analysis (start + finalize) under `budget`. A budget that
/// elapses before the dialogue converges yields a partial, not an error
/// (spec.md §7); a genuine failure inside `fut` still propagates.
pub async fn one_shot_analysis<F>(
    budget: Duration,
    fallback_ctx: &RequestContext,
    fut: F,
) -> Result<AnalysisResult, CoreError>
where
    F: Future<Output = Result<AnalysisResult, CoreError>>,
{
    match tokio::time::timeout(budget, fut).await {
        Ok(result) => result,
        Err(_) => Ok(partial_result_on_timeout(fallback_ctx, budget.as_secs())),
    }
}

/// The partial result a one-shot analysis tool falls back to when its budget
/// expires mid-dialogue (spec.md §7: "on expiry, return a partial result
/// preserving findings so far").
pub fn partial_result_on_timeout(ctx: &RequestContext, budget_secs: u64) -> AnalysisResult {
    AnalysisResult {
        status: AnalysisStatus::Partial,
        summary: format!(
            "The time budget of {budget_secs}s elapsed before the remote analysis \
             converged; this result reflects the investigation as far as it went."
        ),
        root_causes: Vec::new(),
        immediate_actions: Vec::new(),
        investigation_next_steps: vec![
            "Resume this line of investigation with start_conversation/continue_conversation, \
             which is not subject to a single fixed budget."
                .to_string(),
        ],
        ruled_out_approaches: ctx.attempted_approaches.clone(),
    }
}
