use serde::Deserialize;
use serde::Serialize;
use strum_macros::Display;

use crate::finding::CodeLocation;
use crate::finding::Finding;
use crate::finding::RecommendedAction;
use crate::ids::HypothesisId;
use crate::ids::SessionId;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Display)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum HypothesisCategory {
    Performance,
    Bug,
    Security,
    Architecture,
    Integration,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Hypothesis {
    pub id: HypothesisId,
    pub theory: String,
    pub test_approach: String,
    pub category: HypothesisCategory,
    pub prior_priority: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Display)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum EvidencePolarity {
    Supporting,
    Contradicting,
    Neutral,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Evidence {
    pub polarity: EvidencePolarity,
    pub description: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub location: Option<CodeLocation>,
    pub confidence: f64,
    pub discovered_at_epoch_secs: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExplorationResult {
    pub hypothesis: Hypothesis,
    pub session_id: SessionId,
    pub evidence: Vec<Evidence>,
    pub overall_confidence: f64,
    pub exploration_depth: usize,
    pub key_insights: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reproduction_steps: Option<Vec<String>>,
    #[serde(default)]
    pub related_findings: Vec<Finding>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RoundRecord {
    pub hypotheses: Vec<Hypothesis>,
    pub results: Vec<ExplorationResult>,
    pub eliminated: Vec<HypothesisId>,
    pub cross_round_insights: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TournamentResult {
    pub issue: String,
    pub total_hypotheses: usize,
    pub rounds: Vec<RoundRecord>,
    pub winner: Option<ExplorationResult>,
    pub runner_up: Option<ExplorationResult>,
    pub aggregated_findings: Vec<Finding>,
    pub primary_actions: Vec<RecommendedAction>,
    pub secondary_actions: Vec<RecommendedAction>,
    pub wall_duration_millis: u64,
    pub parallel_efficiency: f64,
    /// `partial` when the overall time budget elapsed before the
    /// tournament converged naturally (spec.md §5, §7).
    pub status: TournamentStatus,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Display)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum TournamentStatus {
    Success,
    Partial,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TournamentConfig {
    #[serde(default = "TournamentConfig::default_max_hypotheses")]
    pub max_hypotheses: usize,
    #[serde(default = "TournamentConfig::default_max_rounds")]
    pub max_rounds: usize,
    #[serde(default = "TournamentConfig::default_elimination_threshold")]
    pub elimination_threshold: f64,
    #[serde(default = "TournamentConfig::default_parallelism")]
    pub parallelism: usize,
    #[serde(default = "TournamentConfig::default_cross_pollination_enabled")]
    pub cross_pollination_enabled: bool,
}

impl TournamentConfig {
    pub fn default_max_hypotheses() -> usize {
        6
    }
    pub fn default_max_rounds() -> usize {
        3
    }
    pub fn default_elimination_threshold() -> f64 {
        0.3
    }
    pub fn default_parallelism() -> usize {
        4
    }
    pub fn default_cross_pollination_enabled() -> bool {
        true
    }
}

impl Default for TournamentConfig {
    fn default() -> Self {
        Self {
            max_hypotheses: Self::default_max_hypotheses(),
            max_rounds: Self::default_max_rounds(),
            elimination_threshold: Self::default_elimination_threshold(),
            parallelism: Self::default_parallelism(),
            cross_pollination_enabled: Self::default_cross_pollination_enabled(),
        }
    }
}
