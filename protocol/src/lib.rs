//! Wire-level and domain types shared between the Conversational Analysis
//! Core (`reasoning-core`) and the stdio transport binary (`reasoning-mcp-server`).
//!
//! Types that cross the process boundary (tool parameters/results, JSON-RPC
//! envelopes) live here rather than in `reasoning-core` so the transport
//! crate never needs to depend on the core's internal modules just to
//! describe a wire shape.

pub mod finding;
pub mod ids;
pub mod jsonrpc;
pub mod request_context;
pub mod session;
pub mod tools;
pub mod tournament;

pub use finding::*;
pub use ids::*;
pub use request_context::*;
pub use session::*;
pub use tournament::*;
