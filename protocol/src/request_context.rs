use serde::Deserialize;
use serde::Serialize;

use crate::finding::CodeLocation;
use crate::finding::Finding;
use crate::finding::QuarantinedFinding;

/// The `code_scope` / `focus_area` shape used throughout the §6 tool
/// surface: a set of files, optionally narrowed by entry points or tagged
/// with the services they belong to.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct FocusArea {
    pub files: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub entry_points: Option<Vec<CodeLocation>>,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub service_names: Option<Vec<String>>,
}

/// The wire shape of `claude_context`, exactly as spec.md §6 defines it.
/// `partial_findings` is accepted as loosely-typed JSON because upstream
/// callers are untrusted; [`RequestContext::from_wire`] is where validation
/// and quarantining happens.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClaudeContext {
    #[serde(default)]
    pub attempted_approaches: Vec<String>,
    #[serde(default)]
    pub partial_findings: Vec<serde_json::Value>,
    pub stuck_description: String,
    pub code_scope: FocusArea,
}

/// The validated, internal request context a session carries (spec.md §3).
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RequestContext {
    pub attempted_approaches: Vec<String>,
    pub partial_findings: Vec<Finding>,
    /// Findings from `claude_context` that failed validation. Kept for
    /// diagnostics rather than silently dropped.
    pub quarantined_findings: Vec<QuarantinedFinding>,
    /// The internal model exposes `stuck_description` as the sole element
    /// of a stuck-points list (spec.md §6).
    pub stuck_points: Vec<String>,
    pub focus_area: FocusArea,
    pub remaining_budget_secs: u64,
}

impl RequestContext {
    pub fn from_wire(ctx: ClaudeContext, remaining_budget_secs: u64) -> Self {
        let mut partial_findings = Vec::with_capacity(ctx.partial_findings.len());
        let mut quarantined_findings = Vec::new();
        for raw in ctx.partial_findings {
            match serde_json::from_value::<Finding>(raw.clone()) {
                Ok(finding) => partial_findings.push(finding),
                Err(e) => quarantined_findings.push(QuarantinedFinding {
                    raw,
                    reason: e.to_string(),
                }),
            }
        }

        Self {
            attempted_approaches: ctx.attempted_approaches,
            partial_findings,
            quarantined_findings,
            stuck_points: vec![ctx.stuck_description],
            focus_area: ctx.code_scope,
            remaining_budget_secs,
        }
    }
}
