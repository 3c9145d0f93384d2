//! The thin, hand-written slice of the MCP envelope this gateway actually
//! needs: `initialize`, `ping`, `tools/list`, `tools/call`. Spec.md §6 scopes
//! the tool surface down to ten tools with no resources or prompts, so this
//! purposely does not reach for a generic `mcp-types` crate — there is no
//! `resources/*`, `prompts/*`, or `completion/*` surface to describe.

use serde::Deserialize;
use serde::Serialize;
use serde_json::Value;
use serde_json::json;

pub const PROTOCOL_VERSION: &str = "2024-11-05";
pub const SERVER_NAME: &str = "reasoning-gateway";

#[derive(Debug, Clone, Serialize)]
pub struct ServerInfo {
    pub name: &'static str,
    pub version: &'static str,
}

#[derive(Debug, Clone, Serialize)]
pub struct InitializeResult {
    #[serde(rename = "protocolVersion")]
    pub protocol_version: &'static str,
    pub capabilities: Value,
    #[serde(rename = "serverInfo")]
    pub server_info: ServerInfo,
}

impl Default for InitializeResult {
    fn default() -> Self {
        Self {
            protocol_version: PROTOCOL_VERSION,
            capabilities: json!({ "tools": {} }),
            server_info: ServerInfo {
                name: SERVER_NAME,
                version: env!("CARGO_PKG_VERSION"),
            },
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct ToolDescriptor {
    pub name: &'static str,
    pub description: &'static str,
    #[serde(rename = "inputSchema")]
    pub input_schema: Value,
}

#[derive(Debug, Clone, Deserialize)]
pub struct CallToolParams {
    pub name: String,
    #[serde(default)]
    pub arguments: Value,
}

#[derive(Debug, Clone, Serialize)]
pub struct ContentBlock {
    #[serde(rename = "type")]
    pub kind: &'static str,
    pub text: String,
}

impl ContentBlock {
    pub fn text(text: String) -> Self {
        Self { kind: "text", text }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct CallToolResult {
    pub content: Vec<ContentBlock>,
    #[serde(rename = "isError")]
    pub is_error: bool,
}

impl CallToolResult {
    pub fn ok(value: &impl Serialize) -> Self {
        let text = serde_json::to_string(value)
            .unwrap_or_else(|e| format!("{{\"error\":\"failed to serialize tool result: {e}\"}}"));
        Self {
            content: vec![ContentBlock::text(text)],
            is_error: false,
        }
    }
}

/// The ten tools of spec.md §6, described for `tools/list`. Schemas are
/// hand-written rather than `schemars`-derived: the teacher's target type for
/// that derive (`mcp_types::ToolInputSchema`) carries no source in this
/// retrieval pack, and the surface is small enough to write out directly.
pub fn tool_catalog() -> Vec<ToolDescriptor> {
    vec![
        ToolDescriptor {
            name: "escalate_analysis",
            description: "Hand a stuck investigation to the remote reasoning service for a full analysis pass.",
            input_schema: json!({
                "type": "object",
                "required": ["claude_context", "analysis_type", "depth_level"],
                "properties": {
                    "claude_context": { "type": "object" },
                    "analysis_type": { "type": "string", "enum": ["execution_trace", "cross_system", "performance", "hypothesis_test"] },
                    "depth_level": { "type": "integer" },
                    "time_budget_seconds": { "type": "integer" }
                }
            }),
        },
        ToolDescriptor {
            name: "trace_execution_path",
            description: "Trace the likely execution path from an entry point, combining static heuristics with remote analysis.",
            input_schema: json!({
                "type": "object",
                "required": ["entry_point"],
                "properties": {
                    "entry_point": { "type": "object", "required": ["file", "line"] },
                    "max_depth": { "type": "integer" },
                    "include_data_flow": { "type": "boolean" }
                }
            }),
        },
        ToolDescriptor {
            name: "cross_system_impact",
            description: "Assess how a change scope is likely to ripple across service boundaries.",
            input_schema: json!({
                "type": "object",
                "required": ["change_scope"],
                "properties": {
                    "change_scope": { "type": "object", "required": ["files"] },
                    "impact_types": { "type": "array" }
                }
            }),
        },
        ToolDescriptor {
            name: "performance_bottleneck",
            description: "Look for likely performance bottlenecks along a code path.",
            input_schema: json!({
                "type": "object",
                "required": ["code_path"],
                "properties": {
                    "code_path": { "type": "object", "required": ["entry_point"] },
                    "profile_depth": { "type": "integer" }
                }
            }),
        },
        ToolDescriptor {
            name: "hypothesis_test",
            description: "Test one specific hypothesis against the code.",
            input_schema: json!({
                "type": "object",
                "required": ["hypothesis", "code_scope", "test_approach"],
                "properties": {
                    "hypothesis": { "type": "string" },
                    "code_scope": { "type": "object", "required": ["files"] },
                    "test_approach": { "type": "string" }
                }
            }),
        },
        ToolDescriptor {
            name: "start_conversation",
            description: "Open a new multi-turn analysis dialogue with the remote reasoning service.",
            input_schema: json!({
                "type": "object",
                "required": ["claude_context", "analysis_type"],
                "properties": {
                    "claude_context": { "type": "object" },
                    "analysis_type": { "type": "string" },
                    "initial_question": { "type": "string" }
                }
            }),
        },
        ToolDescriptor {
            name: "continue_conversation",
            description: "Continue an existing analysis dialogue.",
            input_schema: json!({
                "type": "object",
                "required": ["session_id", "message"],
                "properties": {
                    "session_id": { "type": "string" },
                    "message": { "type": "string" },
                    "include_code_snippets": { "type": "boolean" }
                }
            }),
        },
        ToolDescriptor {
            name: "finalize_conversation",
            description: "Close out an analysis dialogue and get a structured result.",
            input_schema: json!({
                "type": "object",
                "required": ["session_id"],
                "properties": {
                    "session_id": { "type": "string" },
                    "summary_format": { "type": "string" }
                }
            }),
        },
        ToolDescriptor {
            name: "get_conversation_status",
            description: "Check the status and progress of an analysis dialogue.",
            input_schema: json!({
                "type": "object",
                "required": ["session_id"],
                "properties": { "session_id": { "type": "string" } }
            }),
        },
        ToolDescriptor {
            name: "run_hypothesis_tournament",
            description: "Run a parallel hypothesis tournament over a described issue.",
            input_schema: json!({
                "type": "object",
                "required": ["claude_context", "issue"],
                "properties": {
                    "claude_context": { "type": "object" },
                    "issue": { "type": "string" },
                    "tournament_config": { "type": "object" }
                }
            }),
        },
    ]
}
