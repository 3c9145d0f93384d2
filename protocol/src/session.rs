use serde::Deserialize;
use serde::Serialize;
use strum_macros::Display;

use crate::finding::Finding;
use crate::ids::TurnId;

/// Session lifecycle state (spec.md §3). `Active` and `Processing` are the
/// only pair that transition back and forth; every other transition is
/// monotone and `Completed`/`Abandoned` are absorbing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Display)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum SessionStatus {
    Active,
    Processing,
    Completing,
    Completed,
    Abandoned,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Display)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum TurnRole {
    Caller,
    Remote,
    System,
}

/// `analysis_type` across the §6 tool surface.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Display)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum AnalysisKind {
    ExecutionTrace,
    CrossSystem,
    Performance,
    HypothesisTest,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Display, Default)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum SummaryFormat {
    Detailed,
    #[default]
    Concise,
    Actionable,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TurnMetadata {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub analysis_kind: Option<AnalysisKind>,
    #[serde(default)]
    pub follow_ups: Vec<String>,
    #[serde(default)]
    pub findings: Vec<Finding>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Turn {
    pub id: TurnId,
    pub role: TurnRole,
    pub content: String,
    /// Seconds since the session's creation timestamp; monotonically
    /// increasing within a session (spec.md §3's "monotonically ordered
    /// timestamp").
    pub sequence_millis: u64,
    pub metadata: TurnMetadata,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ProgressRecord {
    pub completed_steps: Vec<String>,
    pub pending_questions: Vec<String>,
    pub key_findings: Vec<Finding>,
    pub confidence: f64,
}

/// Snapshot returned to `get_conversation_status` and embedded in
/// `continue_conversation` responses.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionStatusSnapshot {
    pub session_id: String,
    pub status: SessionStatus,
    pub turn_count: usize,
    pub last_activity_epoch_secs: u64,
    pub progress: ProgressRecord,
    pub can_finalize: bool,
}
