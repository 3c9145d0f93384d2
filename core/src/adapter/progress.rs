//! The deterministic progress model of spec.md §4.4: a scalar in `[0, 0.95]`
//! computed from session-observable state, never from the remote's own
//! self-assessment.

use reasoning_protocol::RequestContext;

pub const FINALIZABLE_THRESHOLD: f64 = 0.8;
const PROGRESS_CAP: f64 = 0.95;

pub fn compute_progress(ctx: &RequestContext) -> f64 {
    let mut progress = if ctx.partial_findings.len() >= 3 {
        0.4
    } else {
        0.2
    };

    if ctx
        .stuck_points
        .iter()
        .any(|s| s.to_lowercase().contains("cause") || s.to_lowercase().contains("issue"))
    {
        progress += 0.3;
    }

    if ctx.focus_area.files.len() > 5 {
        progress += 0.2;
    } else {
        progress += 0.1;
    }

    progress.min(PROGRESS_CAP)
}

pub fn is_finalizable(progress: f64) -> bool {
    progress >= FINALIZABLE_THRESHOLD
}
