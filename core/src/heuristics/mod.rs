//! §1's "heuristic analyzers" — a lightweight execution tracer, boundary
//! impact scanner, and performance modeler. These are static, regex-level
//! approximations, not real call-graph or profiling tools: per spec.md §1
//! their outputs are opaque advisory annotations meant to prime the remote
//! analysis with plausible leads, not to be trusted as ground truth
//! themselves.

pub mod impact;
pub mod perf;
pub mod trace;
