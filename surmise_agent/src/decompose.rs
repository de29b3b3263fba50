//! Default decomposition and merging strategies.

use async_trait::async_trait;
use surmise_reasoning::{Confidence, Policy, Problem, Solution};

use crate::collaborators::{Decomposer, Merger};

/// Never splits a problem
#[derive(Clone, Copy, Debug, Default)]
pub struct NoDecomposition;

#[async_trait]
impl Decomposer for NoDecomposition {
    fn should(&self, _problem: &Problem, _policy: &Policy) -> bool {
        false
    }

    async fn decompose(&self, _problem: &Problem) -> Vec<Problem> {
        Vec::new()
    }
}

/// Splits a complex problem into one sub-problem per constraint.
///
/// A problem qualifies when its complexity reaches the policy's
/// decomposition threshold and it has at least two constraints to split on.
/// Each sub-problem keeps the parent statement, focused on one constraint,
/// and carries only that constraint.
#[derive(Clone, Copy, Debug, Default)]
pub struct ComplexityDecomposer;

#[async_trait]
impl Decomposer for ComplexityDecomposer {
    fn should(&self, problem: &Problem, policy: &Policy) -> bool {
        problem.constraints.len() >= 2 && problem.complexity() >= policy.decompose_threshold
    }

    async fn decompose(&self, problem: &Problem) -> Vec<Problem> {
        problem
            .constraints
            .iter()
            .map(|c| {
                Problem::new(format!("{} (focus: {})", problem.statement, c.description))
                    .with_constraint(c.description.clone())
            })
            .collect()
    }
}

/// Joins sub-solutions line by line.
///
/// The merged confidence is only as strong as the weakest part and as
/// volatile as the most volatile one.
#[derive(Clone, Copy, Debug, Default)]
pub struct ConcatMerger;

#[async_trait]
impl Merger for ConcatMerger {
    async fn merge(&self, solutions: &[Solution], _problem: &Problem) -> Option<Solution> {
        if solutions.is_empty() {
            return None;
        }

        let content = solutions
            .iter()
            .map(|s| s.content.as_str())
            .collect::<Vec<_>>()
            .join("\n");
        let value = solutions
            .iter()
            .map(|s| s.confidence.value())
            .fold(f64::INFINITY, f64::min);
        let volatility = solutions
            .iter()
            .map(|s| s.confidence.volatility())
            .fold(0.0, f64::max);
        let basis = solutions
            .iter()
            .flat_map(|s| s.basis.iter().copied())
            .collect();

        Some(Solution::new(
            content,
            Confidence::new(value, volatility, format!("merged {} sub-solutions", solutions.len())),
            basis,
        ))
    }
}
