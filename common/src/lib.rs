//! Small shared helpers reused across the gateway's crates. Trimmed down
//! from the teacher's `codex-common` (which also carries CLI approval-mode
//! and sandbox-summary helpers this gateway has no use for) to the one thing
//! `mcp-server` still reaches for: human-readable elapsed-time formatting
//! for diagnostic logging.

pub mod elapsed;
