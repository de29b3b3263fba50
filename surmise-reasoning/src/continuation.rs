//! Continuation judgment
//!
//! After each turn the engine asks whether another turn is likely to
//! improve the answer. The standard judge estimates the improvement from
//! unresolved gaps, shaky known facts and solution volatility.

use serde::{Deserialize, Serialize};

use crate::policy::Policy;
use crate::problem::{Problem, Solution};

/// Expected gain per unanswerable gap
const UNANSWERABLE_WEIGHT: f64 = 0.05;
/// Expected gain per skipped gap
const SKIPPED_WEIGHT: f64 = 0.08;
/// Expected gain per low-confidence known fact
const LOW_CONFIDENCE_WEIGHT: f64 = 0.03;
/// Bonus when the solution itself is volatile
const VOLATILITY_BONUS: f64 = 0.05;

/// Advice on whether to run another turn
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ContinuationAdvice {
    pub recommend: bool,
    pub expected_improvement: f64,
    pub reason: String,
    pub suggested_action: String,
}

/// Decides whether another turn is worthwhile
pub trait ContinuationJudge: Send + Sync {
    fn judge(&self, solution: &Solution, problem: &Problem, policy: &Policy) -> ContinuationAdvice;
}

/// Expected-value judge
#[derive(Clone, Copy, Debug, Default)]
pub struct ExpectedValueJudge;

impl ContinuationJudge for ExpectedValueJudge {
    fn judge(&self, solution: &Solution, problem: &Problem, policy: &Policy) -> ContinuationAdvice {
        let counts = problem.gap_counts();
        let low_confidence = problem.low_confidence_known(policy.low_confidence_bound);
        let volatile = solution.confidence.volatility() > policy.volatility_threshold;

        let mut expected_improvement = counts.unanswerable as f64 * UNANSWERABLE_WEIGHT
            + counts.skipped as f64 * SKIPPED_WEIGHT
            + low_confidence as f64 * LOW_CONFIDENCE_WEIGHT;
        if volatile {
            expected_improvement += VOLATILITY_BONUS;
        }
        let recommend = expected_improvement >= policy.continuation_threshold;

        let mut reasons = Vec::new();
        if counts.skipped > 0 {
            reasons.push(format!("{} skipped gap(s)", counts.skipped));
        }
        if counts.unanswerable > 0 {
            reasons.push(format!("{} unanswerable gap(s)", counts.unanswerable));
        }
        if low_confidence > 0 {
            reasons.push(format!("{} low-confidence fact(s)", low_confidence));
        }
        if volatile {
            reasons.push(format!(
                "volatile solution ({:.2})",
                solution.confidence.volatility()
            ));
        }
        let reason = if reasons.is_empty() {
            "nothing left to improve".to_string()
        } else {
            reasons.join(", ")
        };

        let suggested_action = if !recommend {
            "accept the current solution"
        } else if counts.skipped > 0 {
            "answer the skipped gaps"
        } else if low_confidence > 0 {
            "confirm the low-confidence facts"
        } else if volatile {
            "gather more evidence"
        } else {
            "revisit the unanswerable gaps"
        }
        .to_string();

        ContinuationAdvice {
            recommend,
            expected_improvement,
            reason,
            suggested_action,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::hypothesis::Confidence;
    use crate::problem::{Gap, KnownFact};

    fn solution(volatility: f64) -> Solution {
        Solution::new("answer", Confidence::new(0.8, volatility, "test"), Vec::new())
    }

    fn problem(skipped: usize, unanswerable: usize, low: usize) -> Problem {
        let mut p = Problem::new("p");
        for i in 0..skipped {
            let key = format!("s{}", i);
            p.add_gap(Gap::new(key.clone(), "?"));
            p.skip_gap(&key).unwrap();
        }
        for i in 0..unanswerable {
            let key = format!("u{}", i);
            p.add_gap(Gap::new(key.clone(), "?"));
            p.mark_unanswerable(&key).unwrap();
        }
        for i in 0..low {
            p.set_known(format!("k{}", i), KnownFact::user("maybe", 0.2));
        }
        p
    }

    #[test]
    fn test_expected_improvement_exact() {
        let policy = Policy::default();
        for (x, y) in [(0usize, 0usize), (1, 0), (0, 1), (1, 1), (2, 3)] {
            let advice = ExpectedValueJudge.judge(&solution(0.1), &problem(x, 0, y), &policy);
            let expected = x as f64 * 0.08 + y as f64 * 0.03;
            assert_eq!(advice.expected_improvement, expected);
            assert_eq!(advice.recommend, expected >= policy.continuation_threshold);
        }
    }

    #[test]
    fn test_unanswerable_and_volatility() {
        let policy = Policy::default();
        let advice = ExpectedValueJudge.judge(&solution(0.9), &problem(0, 1, 0), &policy);
        assert!((advice.expected_improvement - 0.10).abs() < 1e-12);
        assert!(advice.recommend);
        assert!(advice.reason.contains("volatile"));
    }

    #[test]
    fn test_quiet_problem_not_recommended() {
        let advice =
            ExpectedValueJudge.judge(&solution(0.1), &problem(0, 0, 0), &Policy::default());
        assert!(!advice.recommend);
        assert_eq!(advice.expected_improvement, 0.0);
        assert_eq!(advice.suggested_action, "accept the current solution");
    }

    #[test]
    fn test_skipped_gaps_suggest_answering() {
        let advice =
            ExpectedValueJudge.judge(&solution(0.1), &problem(2, 0, 0), &Policy::default());
        assert!(advice.recommend);
        assert_eq!(advice.suggested_action, "answer the skipped gaps");
    }
}
