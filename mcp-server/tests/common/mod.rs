mod mcp_process;
mod mock_gemini;

pub use mcp_process::McpProcess;
pub use mcp_process::RawMessage;
pub use mock_gemini::ScriptedByPrompt;
pub use mock_gemini::scripted_server;
pub use mock_gemini::sequential_server;
pub use mock_gemini::sequential_server_with_delay;
