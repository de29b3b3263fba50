//! External collaborator seams.
//!
//! The turn engine never produces claims, evidence or answers on its own.
//! It drives these traits, which adapters implement on top of whatever
//! oracle the caller has (a model, a rules engine, a human). A collaborator
//! that has nothing to offer returns an empty list or a low-confidence
//! result; soft failures are "no information gained", never errors.

use async_trait::async_trait;
use indexmap::IndexMap;
use surmise_reasoning::{Constraint, Gap, Hypothesis, Policy, Problem, Solution};

/// Gathers evidence for a single hypothesis.
#[async_trait]
pub trait Evaluator: Send + Sync {
    /// Appends evidence to `hypothesis`, recomputes its confidence through
    /// `surmise_reasoning::update_confidence`, and returns any gaps the
    /// evaluation uncovered.
    async fn evaluate(&self, hypothesis: &mut Hypothesis, problem: &Problem, policy: &Policy) -> Vec<Gap>;
}

/// Proposes candidate hypotheses for a problem.
#[async_trait]
pub trait Generator: Send + Sync {
    /// `existing` holds the live hypotheses from earlier turns so the
    /// generator can avoid repeating them.
    async fn generate(&self, problem: &Problem, policy: &Policy, existing: &[Hypothesis]) -> Vec<Hypothesis>;
}

/// Turns ranked hypotheses into an answer.
#[async_trait]
pub trait Synthesizer: Send + Sync {
    /// `ranked` is ordered best first.
    async fn synthesize(&self, ranked: &[Hypothesis], problem: &Problem) -> Solution;
}

/// Checks a solution against the problem's constraints.
#[async_trait]
pub trait ConstraintVerifier: Send + Sync {
    /// Returns constraint description to pass/fail.
    async fn verify(&self, solution: &Solution, constraints: &[Constraint], problem: &Problem) -> IndexMap<String, bool>;
}

/// Finds information the problem is missing.
#[async_trait]
pub trait GapDetector: Send + Sync {
    async fn detect(&self, problem: &Problem) -> Vec<Gap>;
}

/// Splits a problem into independently solvable sub-problems.
#[async_trait]
pub trait Decomposer: Send + Sync {
    /// Cheap check run before every decomposition attempt.
    fn should(&self, problem: &Problem, policy: &Policy) -> bool;

    async fn decompose(&self, problem: &Problem) -> Vec<Problem>;
}

/// Folds sub-problem solutions into one.
#[async_trait]
pub trait Merger: Send + Sync {
    /// `None` when nothing usable can be merged.
    async fn merge(&self, solutions: &[Solution], problem: &Problem) -> Option<Solution>;
}
