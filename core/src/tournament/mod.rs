//! §4.7 Hypothesis Tournament: generate candidate theories, explore them
//! in parallel, eliminate by confidence, and converge on a winner.

pub mod evidence;
pub mod hypotheses;
pub mod scheduler;

pub use scheduler::TournamentScheduler;
