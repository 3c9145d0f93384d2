use serde::Deserialize;
use serde::Serialize;
use strum_macros::Display;

/// One of the four kinds a structured finding may carry (spec.md §3).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Display)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum FindingKind {
    Bug,
    Performance,
    Architecture,
    Security,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize, Display)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum Severity {
    Low,
    Medium,
    High,
    Critical,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Display)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum ActionPriority {
    Low,
    Medium,
    High,
    Critical,
}

/// A location within the project root. `line` is zero-based per spec.md §3
/// ("line >= 0"); callers presenting to humans should add one.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CodeLocation {
    pub file: String,
    pub line: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub column: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none", rename = "function_name")]
    pub function_name: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Finding {
    pub kind: FindingKind,
    pub severity: Severity,
    pub location: CodeLocation,
    pub description: String,
    #[serde(default)]
    pub evidence: Vec<String>,
}

/// A finding whose shape could not be validated against [`Finding`]. Kept
/// verbatim rather than guessed at, per spec.md §9's design note on typed
/// findings ("reject-with-warning path that preserves invalid entries").
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QuarantinedFinding {
    pub raw: serde_json::Value,
    pub reason: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RecommendedAction {
    pub priority: ActionPriority,
    pub description: String,
}
