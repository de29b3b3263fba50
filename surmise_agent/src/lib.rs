//! Surmise agent layer - turn engine over the reasoning core.
//!
//! This crate drives `surmise_reasoning` through repeated turns:
//!
//! - Collaborators: async seams for generation, evaluation, synthesis,
//!   constraint checks, gap detection, decomposition and merging
//! - Evaluation: sequential or budget-limited (bandit-selected) evidence
//!   gathering
//! - Turn engine: the per-turn state machine, with gap suspension and
//!   resumption, decomposition, pruning and continuation advice
//! - Audit: per-turn event trail, serializable to JSON

pub mod audit;
pub mod collaborators;
pub mod decompose;
pub mod evaluate;
pub mod gaps;
pub mod turn;

/// Error types for turn execution.
#[derive(thiserror::Error, Debug)]
pub enum TurnError {
    /// No hypotheses existed and the generator produced none
    #[error("failed to generate hypotheses")]
    NoHypotheses,

    /// Error from the reasoning core
    #[error("Reasoning error: {0}")]
    Reasoning(#[from] surmise_reasoning::ReasoningError),
}

/// Result type for turn operations.
pub type Result<T> = std::result::Result<T, TurnError>;

pub use audit::{AuditError, AuditEvent, AuditLog};
pub use collaborators::{
    ConstraintVerifier, Decomposer, Evaluator, GapDetector, Generator, Merger, Synthesizer,
};
pub use decompose::{ComplexityDecomposer, ConcatMerger, NoDecomposition};
pub use evaluate::{EvaluationReport, EvidenceEval, SelectiveEval, SequentialEval};
pub use gaps::DeclaredGapDetector;
pub use turn::{TurnEngine, TurnEngineBuilder, TurnOutcome, TurnReport};

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_turn_error_display() {
        assert_eq!(TurnError::NoHypotheses.to_string(), "failed to generate hypotheses");

        let err: TurnError = surmise_reasoning::ReasoningError::Config("bad".to_string()).into();
        assert!(matches!(err, TurnError::Reasoning(_)));
    }
}
