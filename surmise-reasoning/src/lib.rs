//! Surmise Reasoning Core
//!
//! Evidence-weighted hypothesis tracking for an open-ended problem solver:
//! - Confidence aggregation with independence-group discounting
//! - Known-fact confidence propagation (idempotent)
//! - Bandit selection (greedy, UCB1, Thompson) for budgeted evaluation
//! - Re-evaluation strategies for changed facts and aging hypotheses
//! - Continuation judgment

// Module declarations
pub mod continuation;
pub mod errors;
pub mod hypothesis;
pub mod policy;
pub mod problem;
pub mod reevaluate;
pub mod selection;

// Re-export main types
pub use continuation::{ContinuationAdvice, ContinuationJudge, ExpectedValueJudge};

pub use errors::{ReasoningError, Result};

pub use hypothesis::{
    aggregate, apply_known_confidence, update_confidence, Confidence, Evidence, Hypothesis,
    HypothesisId, HypothesisStatus,
};

pub use policy::Policy;

pub use problem::{
    AutoResolve, Constraint, Gap, GapCounts, GapStatus, KnownFact, KnownFacts, Problem, Solution,
};

pub use reevaluate::{DecayBased, DeltaEval, NoOp, ReEvalReport, ReEvaluate};

pub use selection::{Greedy, Selection, SelectionRound, Thompson, Ucb1};

/// Version of the reasoning core crate
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Initialize the reasoning core
pub fn init() {
    tracing::info!("Surmise Reasoning v{}", VERSION);
}
