//! Evidence evaluation orchestration.
//!
//! Decides which freshly generated hypotheses get sent to the `Evaluator`
//! and in what order. `SequentialEval` evaluates everything;
//! `SelectiveEval` lets a bandit `Selection` spend a limited budget.
//!
//! After every single evaluation the hypothesis's evidence is discounted
//! against low-confidence known facts and its confidence re-aggregated, so
//! discounts always see the full evidence list.

use std::sync::Arc;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use surmise_reasoning::{
    apply_known_confidence, update_confidence, Gap, Hypothesis, Policy, Problem, Selection,
};
use tracing::{debug, trace};

use crate::collaborators::Evaluator;

/// What an evaluation pass did
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct EvaluationReport {
    /// Number of evaluator calls made
    pub evaluated: usize,
    /// Gaps reported by the evaluator, in discovery order, not yet deduped
    pub discovered_gaps: Vec<Gap>,
}

/// Strategy for evaluating a batch of candidate hypotheses
#[async_trait]
pub trait EvidenceEval: Send + Sync {
    fn name(&self) -> &'static str;

    async fn evaluate(
        &self,
        candidates: &mut [Hypothesis],
        problem: &Problem,
        policy: &Policy,
    ) -> EvaluationReport;
}

/// Discount against known facts, then re-aggregate
fn propagate(hypothesis: &mut Hypothesis, problem: &Problem, policy: &Policy) {
    apply_known_confidence(hypothesis, &problem.known, policy);
    update_confidence(hypothesis, policy);
}

/// Evaluates every candidate in order
#[derive(Clone)]
pub struct SequentialEval {
    evaluator: Arc<dyn Evaluator>,
}

impl SequentialEval {
    pub fn new(evaluator: Arc<dyn Evaluator>) -> Self {
        Self { evaluator }
    }
}

#[async_trait]
impl EvidenceEval for SequentialEval {
    fn name(&self) -> &'static str {
        "sequential"
    }

    async fn evaluate(
        &self,
        candidates: &mut [Hypothesis],
        problem: &Problem,
        policy: &Policy,
    ) -> EvaluationReport {
        let mut report = EvaluationReport::default();
        for hypothesis in candidates.iter_mut() {
            let gaps = self.evaluator.evaluate(hypothesis, problem, policy).await;
            propagate(hypothesis, problem, policy);
            hypothesis.eval_count += 1;
            report.evaluated += 1;
            report.discovered_gaps.extend(gaps);
        }
        debug!(evaluated = report.evaluated, "sequential evaluation done");
        report
    }
}

/// Evaluates at most `policy.eval_budget` candidates, chosen by a
/// selection algorithm
#[derive(Clone)]
pub struct SelectiveEval {
    evaluator: Arc<dyn Evaluator>,
    selection: Arc<dyn Selection>,
}

impl SelectiveEval {
    pub fn new(evaluator: Arc<dyn Evaluator>, selection: Arc<dyn Selection>) -> Self {
        Self {
            evaluator,
            selection,
        }
    }

    pub fn selection(&self) -> &dyn Selection {
        self.selection.as_ref()
    }
}

#[async_trait]
impl EvidenceEval for SelectiveEval {
    fn name(&self) -> &'static str {
        "selective"
    }

    async fn evaluate(
        &self,
        candidates: &mut [Hypothesis],
        problem: &Problem,
        policy: &Policy,
    ) -> EvaluationReport {
        let mut report = EvaluationReport::default();
        let budget = policy.budget_for(candidates.len());
        if budget == 0 {
            return report;
        }

        let mut round = self.selection.init(candidates);
        while report.evaluated < budget {
            let Some(index) = self.selection.next(candidates, &mut round, policy) else {
                break;
            };
            let hypothesis = &mut candidates[index];
            let gaps = self.evaluator.evaluate(hypothesis, problem, policy).await;
            propagate(hypothesis, problem, policy);
            self.selection.update(index, hypothesis, &mut round);
            trace!(
                index,
                hypothesis = %hypothesis.id,
                confidence = hypothesis.confidence.value(),
                "evaluated candidate"
            );
            report.evaluated += 1;
            report.discovered_gaps.extend(gaps);
        }

        debug!(
            selection = self.selection.name(),
            evaluated = report.evaluated,
            budget,
            candidates = candidates.len(),
            "selective evaluation done"
        );
        report
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use surmise_reasoning::{Confidence, Evidence, Greedy, KnownFact, Thompson, Ucb1};

    /// Adds one supporting item quoting the claim and counts calls
    #[derive(Default)]
    struct CountingEvaluator {
        calls: AtomicUsize,
    }

    #[async_trait]
    impl Evaluator for CountingEvaluator {
        async fn evaluate(&self, hypothesis: &mut Hypothesis, _problem: &Problem, policy: &Policy) -> Vec<Gap> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            let content = format!("observed {}", hypothesis.claim);
            hypothesis.add_evidence(Evidence::supporting(content, 0.8, "counter", "obs"));
            update_confidence(hypothesis, policy);
            vec![Gap::new(format!("gap-{}", hypothesis.claim), "?")]
        }
    }

    fn candidates(n: usize) -> Vec<Hypothesis> {
        (0..n)
            .map(|i| {
                Hypothesis::new(format!("h{}", i))
                    .with_confidence(Confidence::new(0.1 * (i + 1) as f64, 0.5, "prior"))
            })
            .collect()
    }

    #[tokio::test]
    async fn test_selective_respects_budget() {
        let evaluator = Arc::new(CountingEvaluator::default());
        let eval = SelectiveEval::new(evaluator.clone(), Arc::new(Greedy));
        let policy = Policy {
            eval_budget: Some(2),
            ..Policy::default()
        };

        let mut hs = candidates(4);
        let report = eval.evaluate(&mut hs, &Problem::new("p"), &policy).await;

        assert_eq!(report.evaluated, 2);
        assert_eq!(evaluator.calls.load(Ordering::SeqCst), 2);
        assert_eq!(hs.iter().filter(|h| h.eval_count == 0).count(), 2);
        assert_eq!(hs.iter().filter(|h| h.eval_count == 1).count(), 2);
        assert_eq!(report.discovered_gaps.len(), 2);
        // greedy spends the budget on the two strongest priors
        assert_eq!(hs[3].eval_count, 1);
        assert_eq!(hs[2].eval_count, 1);
    }

    #[tokio::test]
    async fn test_selective_without_budget_evaluates_all() {
        let policy = Policy::default();
        let selections: Vec<Arc<dyn Selection>> =
            vec![Arc::new(Greedy), Arc::new(Ucb1), Arc::new(Thompson::seeded(11))];

        for selection in selections {
            let evaluator = Arc::new(CountingEvaluator::default());
            let eval = SelectiveEval::new(evaluator.clone(), selection);
            let mut hs = candidates(4);
            let report = eval.evaluate(&mut hs, &Problem::new("p"), &policy).await;

            assert_eq!(report.evaluated, 4, "{}", eval.selection().name());
            assert!(hs.iter().all(|h| h.eval_count == 1));
        }
    }

    #[tokio::test]
    async fn test_selective_empty_never_calls_evaluator() {
        let evaluator = Arc::new(CountingEvaluator::default());
        let eval = SelectiveEval::new(evaluator.clone(), Arc::new(Ucb1));

        let mut hs: Vec<Hypothesis> = Vec::new();
        let report = eval.evaluate(&mut hs, &Problem::new("p"), &Policy::default()).await;

        assert_eq!(report.evaluated, 0);
        assert_eq!(evaluator.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_zero_budget_evaluates_nothing() {
        let evaluator = Arc::new(CountingEvaluator::default());
        let eval = SelectiveEval::new(evaluator.clone(), Arc::new(Greedy));
        let policy = Policy {
            eval_budget: Some(0),
            ..Policy::default()
        };

        let mut hs = candidates(3);
        let report = eval.evaluate(&mut hs, &Problem::new("p"), &policy).await;
        assert_eq!(report.evaluated, 0);
        assert_eq!(evaluator.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_sequential_discounts_after_evaluation() {
        let evaluator = Arc::new(CountingEvaluator::default());
        let eval = SequentialEval::new(evaluator.clone());
        // "h0" appears in the evidence the counter writes
        let problem = Problem::new("p").with_known("first", KnownFact::user("h0", 0.4));

        let mut hs = candidates(2);
        let report = eval.evaluate(&mut hs, &problem, &Policy::default()).await;

        assert_eq!(report.evaluated, 2);
        assert!(hs.iter().all(|h| h.eval_count == 1));
        assert!((hs[0].evidence()[0].confidence.value() - 0.32).abs() < 1e-9);
        assert_eq!(hs[1].evidence()[0].confidence.value(), 0.8);
    }
}
