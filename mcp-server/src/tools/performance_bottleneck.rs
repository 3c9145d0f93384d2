use std::time::Duration;

use reasoning_core::heuristics::perf::performance_bottleneck;
use reasoning_protocol::AnalysisKind;
use reasoning_protocol::CodeLocation;
use reasoning_protocol::FocusArea;
use reasoning_protocol::RequestContext;
use reasoning_protocol::SummaryFormat;
use reasoning_protocol::tools::PerformanceBottleneckParams;
use serde_json::Value;

use crate::budget;
use crate::budget::DEFAULT_REQUEST_BUDGET_SECS;
use crate::state::GatewayState;
use crate::validation;

use super::DispatchError;
use super::invalid;
use super::to_value;

pub async fn handle(state: &GatewayState, arguments: Value) -> Result<Value, DispatchError> {
    let params: PerformanceBottleneckParams = validation::parse_params(&arguments).map_err(invalid)?;
    let entry = &params.code_path.entry_point;

    let annotations = performance_bottleneck(&state.reader, &entry.file, entry.line, params.profile_depth)?;

    let mut stuck_points = vec![format!(
        "Look for performance bottlenecks along the code path starting at {}:{}",
        entry.file, entry.line
    )];
    if let Some(issues) = &params.code_path.suspected_issues {
        stuck_points.push(format!("Already suspected: {}", issues.join(", ")));
    }
    stuck_points.extend(annotations);

    let ctx = RequestContext {
        stuck_points,
        focus_area: FocusArea {
            files: vec![entry.file.clone()],
            entry_points: Some(vec![CodeLocation {
                file: entry.file.clone(),
                line: entry.line,
                column: None,
                function_name: entry.function_name.clone(),
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
                .start_conversation(ctx, AnalysisKind::Performance, None)
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
