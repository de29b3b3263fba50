//! Re-evaluation strategies
//!
//! Decide which existing hypotheses must be recomputed when known facts
//! change or turns elapse. The turn engine invokes the configured strategy
//! once per turn, and only when some known fact changed and at least one
//! hypothesis exists.

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::hypothesis::{apply_known_confidence, update_confidence};
use crate::policy::Policy;
use crate::problem::Problem;

/// Separator between a confidence basis and its decay annotation
const DECAY_MARKER: &str = " | decayed";

/// Outcome of one re-evaluation pass
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct ReEvalReport {
    /// Hypotheses whose confidence was recomputed
    pub updated: usize,
    /// Hypotheses superseded by this pass
    pub superseded: usize,
    /// Sum of absolute confidence changes
    pub delta: f64,
}

/// Strategy for revisiting existing hypotheses
pub trait ReEvaluate: Send + Sync {
    fn name(&self) -> &'static str;

    fn reevaluate(&self, problem: &mut Problem, changed_keys: &[String], policy: &Policy) -> ReEvalReport;
}

/// Never revisits anything
#[derive(Clone, Copy, Debug, Default)]
pub struct NoOp;

impl ReEvaluate for NoOp {
    fn name(&self) -> &'static str {
        "noop"
    }

    fn reevaluate(&self, _problem: &mut Problem, _changed_keys: &[String], _policy: &Policy) -> ReEvalReport {
        ReEvalReport::default()
    }
}

/// Recompute hypotheses whose evidence mentions a changed fact
#[derive(Clone, Copy, Debug, Default)]
pub struct DeltaEval;

impl ReEvaluate for DeltaEval {
    fn name(&self) -> &'static str {
        "delta"
    }

    fn reevaluate(&self, problem: &mut Problem, changed_keys: &[String], policy: &Policy) -> ReEvalReport {
        let mut needles: Vec<String> = Vec::with_capacity(changed_keys.len() * 2);
        for key in changed_keys {
            needles.push(key.clone());
            if let Some(fact) = problem.known_fact(key) {
                needles.push(fact.value().to_string());
            }
        }

        let mut report = ReEvalReport::default();
        let (hypotheses, known) = problem.hypotheses_with_known();
        for h in hypotheses.iter_mut() {
            if !needles.iter().any(|n| h.references(n)) || !h.revise() {
                continue;
            }

            let before = h.confidence.value();
            apply_known_confidence(h, known, policy);
            update_confidence(h, policy);
            let after = h.confidence.value();

            report.updated += 1;
            report.delta += (after - before).abs();
            if after < policy.supersede_threshold {
                h.supersede();
                report.superseded += 1;
            }
            debug!(hypothesis = %h.id, before, after, "hypothesis revised");
        }
        report
    }
}

/// Decay confidence of hypotheses created in earlier turns
///
/// Each run scales by `decay_rate^age` from the current value, so runs on
/// successive turns compound: a hypothesis from turn 1 revisited on turns 2
/// and 3 ends at `rate^3` of its value, not `rate^2`.
#[derive(Clone, Copy, Debug, Default)]
pub struct DecayBased;

impl ReEvaluate for DecayBased {
    fn name(&self) -> &'static str {
        "decay"
    }

    fn reevaluate(&self, problem: &mut Problem, _changed_keys: &[String], policy: &Policy) -> ReEvalReport {
        let current_turn = problem.turn_count;
        let mut report = ReEvalReport::default();

        for h in problem.hypotheses_mut().iter_mut().filter(|h| h.is_live()) {
            let age = current_turn.saturating_sub(h.turn_id);
            if age == 0 {
                continue;
            }

            let factor = policy.hypothesis_decay_rate.powi(age as i32);
            let before = h.confidence.value();
            h.confidence.set_value(before * factor);

            let base = h
                .confidence
                .basis()
                .split(DECAY_MARKER)
                .next()
                .unwrap_or_default()
                .to_string();
            h.confidence.set_basis(format!(
                "{}{} x{:.3} over {} turns",
                base, DECAY_MARKER, factor, age
            ));

            let after = h.confidence.value();
            report.updated += 1;
            report.delta += (before - after).abs();
            if after < policy.supersede_threshold {
                h.supersede();
                report.superseded += 1;
            }
        }
        if report.updated > 0 {
            debug!(turn = current_turn, updated = report.updated, "decay applied");
        }
        report
    }
}
