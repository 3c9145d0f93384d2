use std::time::Duration;

use reasoning_core::heuristics::impact::cross_system_impact;
use reasoning_protocol::AnalysisKind;
use reasoning_protocol::FocusArea;
use reasoning_protocol::RequestContext;
use reasoning_protocol::SummaryFormat;
use reasoning_protocol::tools::CrossSystemImpactParams;
use serde_json::Value;

use crate::budget;
use crate::budget::DEFAULT_REQUEST_BUDGET_SECS;
use crate::state::GatewayState;
use crate::validation;

use super::DispatchError;
use super::invalid;
use super::to_value;

pub async fn handle(state: &GatewayState, arguments: Value) -> Result<Value, DispatchError> {
    let params: CrossSystemImpactParams = validation::parse_params(&arguments).map_err(invalid)?;
    let service_names = params.change_scope.service_names.clone().unwrap_or_default();

    let annotations = cross_system_impact(&state.reader, &params.change_scope.files, &service_names)?;

    let mut stuck_points = vec![format!(
        "Assess the cross-system impact of changing: {}",
        params.change_scope.files.join(", ")
    )];
    if let Some(impact_types) = &params.impact_types {
        stuck_points.push(format!(
            "Impact types of interest: {}",
            impact_types.iter().map(ToString::to_string).collect::<Vec<_>>().join(", ")
        ));
    }
    stuck_points.extend(annotations);

    let ctx = RequestContext {
        stuck_points,
        focus_area: FocusArea {
            files: params.change_scope.files.clone(),
            entry_points: None,
            service_names: params.change_scope.service_names.clone(),
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
                .start_conversation(ctx, AnalysisKind::CrossSystem, None)
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
