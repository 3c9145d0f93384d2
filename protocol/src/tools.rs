//! Parameter and result shapes for the ten tools of spec.md §6. Field names
//! are snake_case, as the spec is explicit they must be.

use serde::Deserialize;
use serde::Serialize;
use strum_macros::Display;

use crate::finding::CodeLocation;
use crate::finding::RecommendedAction;
use crate::request_context::ClaudeContext;
use crate::request_context::FocusArea;
use crate::session::AnalysisKind;
use crate::session::SessionStatus;
use crate::session::SummaryFormat;
use crate::tournament::TournamentConfig;
use crate::tournament::TournamentResult;

fn default_time_budget_seconds() -> u64 {
    60
}
fn default_max_depth() -> u32 {
    10
}
fn default_true() -> bool {
    true
}
fn default_profile_depth() -> u8 {
    3
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Display)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum AnalysisStatus {
    Success,
    Partial,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RootCause {
    pub r#type: String,
    pub description: String,
    #[serde(default)]
    pub evidence: Vec<String>,
    pub confidence: f64,
    pub fix_strategy: String,
}

/// The structured result shape produced by `finalize_conversation` and every
/// one-shot analysis tool (spec.md §4.4, §6).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnalysisResult {
    pub status: AnalysisStatus,
    pub summary: String,
    #[serde(default)]
    pub root_causes: Vec<RootCause>,
    #[serde(default)]
    pub immediate_actions: Vec<RecommendedAction>,
    #[serde(default)]
    pub investigation_next_steps: Vec<String>,
    #[serde(default)]
    pub ruled_out_approaches: Vec<String>,
}

// ---------------------------------------------------------------------
// escalate_analysis
// ---------------------------------------------------------------------

#[derive(Debug, Clone, Deserialize)]
pub struct EscalateAnalysisParams {
    pub claude_context: ClaudeContext,
    pub analysis_type: AnalysisKind,
    pub depth_level: u8,
    #[serde(default = "default_time_budget_seconds")]
    pub time_budget_seconds: u64,
}

// ---------------------------------------------------------------------
// trace_execution_path
// ---------------------------------------------------------------------

#[derive(Debug, Clone, Deserialize)]
pub struct EntryPoint {
    pub file: String,
    pub line: u32,
    #[serde(default)]
    pub function_name: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct TraceExecutionPathParams {
    pub entry_point: EntryPoint,
    #[serde(default = "default_max_depth")]
    pub max_depth: u32,
    #[serde(default = "default_true")]
    pub include_data_flow: bool,
}

// ---------------------------------------------------------------------
// cross_system_impact
// ---------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Display)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum ImpactType {
    Breaking,
    Performance,
    Behavioral,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ChangeScope {
    pub files: Vec<String>,
    #[serde(default)]
    pub service_names: Option<Vec<String>>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct CrossSystemImpactParams {
    pub change_scope: ChangeScope,
    #[serde(default)]
    pub impact_types: Option<Vec<ImpactType>>,
}

// ---------------------------------------------------------------------
// performance_bottleneck
// ---------------------------------------------------------------------

#[derive(Debug, Clone, Deserialize)]
pub struct CodePath {
    pub entry_point: EntryPoint,
    #[serde(default)]
    pub suspected_issues: Option<Vec<String>>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct PerformanceBottleneckParams {
    pub code_path: CodePath,
    #[serde(default = "default_profile_depth")]
    pub profile_depth: u8,
}

// ---------------------------------------------------------------------
// hypothesis_test
// ---------------------------------------------------------------------

#[derive(Debug, Clone, Deserialize)]
pub struct HypothesisTestParams {
    pub hypothesis: String,
    pub code_scope: FocusArea,
    pub test_approach: String,
}

// ---------------------------------------------------------------------
// start_conversation / continue_conversation / finalize_conversation /
// get_conversation_status
// ---------------------------------------------------------------------

#[derive(Debug, Clone, Deserialize)]
pub struct StartConversationParams {
    pub claude_context: ClaudeContext,
    pub analysis_type: AnalysisKind,
    #[serde(default)]
    pub initial_question: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct StartConversationResult {
    pub session_id: String,
    pub initial_response: String,
    pub suggested_follow_ups: Vec<String>,
    pub status: SessionStatus,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ContinueConversationParams {
    pub session_id: String,
    pub message: String,
    #[serde(default)]
    pub include_code_snippets: Option<bool>,
}

#[derive(Debug, Clone, Serialize)]
pub struct ContinueConversationResult {
    pub response: String,
    pub analysis_progress: f64,
    pub can_finalize: bool,
    pub status: SessionStatus,
}

#[derive(Debug, Clone, Deserialize)]
pub struct FinalizeConversationParams {
    pub session_id: String,
    #[serde(default)]
    pub summary_format: Option<SummaryFormat>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct GetConversationStatusParams {
    pub session_id: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct GetConversationStatusResult {
    pub status: SessionStatus,
    pub turn_count: usize,
    pub last_activity_epoch_secs: u64,
    pub progress: f64,
    pub can_finalize: bool,
}

// ---------------------------------------------------------------------
// run_hypothesis_tournament
// ---------------------------------------------------------------------

#[derive(Debug, Clone, Deserialize)]
pub struct RunHypothesisTournamentParams {
    pub claude_context: ClaudeContext,
    pub issue: String,
    #[serde(default)]
    pub tournament_config: Option<TournamentConfig>,
}

pub type RunHypothesisTournamentResult = TournamentResult;

/// A code excerpt referenced while answering `trace_execution_path`, useful
/// as an opaque annotation from the heuristic execution tracer (spec.md §1,
/// out of scope in detail, but its interface feeds prompts).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TraceStep {
    pub location: CodeLocation,
    pub description: String,
}
