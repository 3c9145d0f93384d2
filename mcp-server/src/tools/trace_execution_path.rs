use std::time::Duration;

use reasoning_core::heuristics::trace::trace_execution_path;
use reasoning_protocol::AnalysisKind;
use reasoning_protocol::CodeLocation;
use reasoning_protocol::FocusArea;
use reasoning_protocol::RequestContext;
use reasoning_protocol::SummaryFormat;
use reasoning_protocol::tools::TraceExecutionPathParams;
use serde_json::Value;

use crate::budget;
use crate::budget::DEFAULT_REQUEST_BUDGET_SECS;
use crate::state::GatewayState;
use crate::validation;

use super::DispatchError;
use super::invalid;
use super::to_value;

pub async fn handle(state: &GatewayState, arguments: Value) -> Result<Value, DispatchError> {
    let params: TraceExecutionPathParams = validation::parse_params(&arguments).map_err(invalid)?;

    let steps = trace_execution_path(
        &state.reader,
        &params.entry_point.file,
        params.entry_point.line,
        params.max_depth,
        params.include_data_flow,
    )?;

    let mut stuck_points = vec![format!(
        "Trace the execution path starting at {}:{}",
        params.entry_point.file, params.entry_point.line
    )];
    for step in &steps {
        stuck_points.push(format!(
            "{}:{} — {}",
            step.location.file, step.location.line, step.description
        ));
    }

    let ctx = RequestContext {
        stuck_points,
        focus_area: FocusArea {
            files: vec![params.entry_point.file.clone()],
            entry_points: Some(vec![CodeLocation {
                file: params.entry_point.file.clone(),
                line: params.entry_point.line,
                column: None,
                function_name: params.entry_point.function_name.clone(),
            }]),
            service_names: None,
        },
        remaining_budget_secs: DEFAULT_REQUEST_BUDGET_SECS,
        ..Default::default()
    };
    let fallback_ctx = ctx.clone();

    let orchestrator = state.orchestrator.clone();
    let result = budget::one_shot_analysis(
        Duration::from_secs(DEFAULT_REQUEST_BUDGET_SECS),
        &fallback_ctx,
        async move {
            let start = orchestrator
                .start_conversation(ctx, AnalysisKind::ExecutionTrace, None)
                .await?;
            let outcome = orchestrator
                .finalize_conversation(start.session_id, SummaryFormat::default())
                .await?;
            Ok(outcome.result)
        },
    )
    .await?;

    Ok(to_value(result))
}
