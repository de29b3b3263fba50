//! Evidence aggregation and known-fact discounting
//!
//! `update_confidence` is the only place a hypothesis's confidence is
//! derived from its evidence. Every strategy that changes evidence or
//! discounts must call back through it.

use std::collections::HashSet;

use tracing::trace;

use crate::hypothesis::confidence::Confidence;
use crate::hypothesis::types::Hypothesis;
use crate::policy::Policy;
use crate::problem::KnownFacts;

/// Evidence count at which volatility halves
const VOLATILITY_HALF_LIFE: f64 = 5.0;

/// Recompute a hypothesis's confidence from its evidence.
///
/// The first item of each independence group counts at full weight; every
/// later item of the same group counts at `policy.same_group_weight`.
pub fn update_confidence(hypothesis: &mut Hypothesis, policy: &Policy) {
    hypothesis.confidence = aggregate(hypothesis, policy.same_group_weight);
    trace!(
        hypothesis = %hypothesis.id,
        value = hypothesis.confidence.value(),
        "confidence updated"
    );
}

/// Confidence the evidence would produce at the given same-group weight,
/// without touching the hypothesis
pub fn aggregate(hypothesis: &Hypothesis, same_group_weight: f64) -> Confidence {
    let evidence = hypothesis.evidence();
    if evidence.is_empty() {
        return Confidence::no_evidence();
    }

    let mut seen_groups: HashSet<&str> = HashSet::new();
    let (mut sup, mut ag) = (0.0_f64, 0.0_f64);
    let (mut n_sup, mut n_contra) = (0usize, 0usize);

    for item in evidence {
        let weight = if seen_groups.insert(item.independence_group.as_str()) {
            1.0
        } else {
            same_group_weight
        };
        let weighted = item.confidence.value() * weight;
        if item.supports {
            sup += weighted;
            n_sup += 1;
        } else {
            ag += weighted;
            n_contra += 1;
        }
    }

    let total = sup + ag;
    let value = if total > 0.0 { sup / total } else { 0.0 };
    let n = evidence.len() as f64;
    let volatility = (1.0 - n / (n + VOLATILITY_HALF_LIFE)).max(0.0);

    Confidence::new(value, volatility, format!("{} sup {} contra", n_sup, n_contra))
}

/// Discount evidence that cites low-confidence known facts.
///
/// Each evidence item's pre-discount confidence is captured once. The
/// discount is rebuilt from that original on every call, so repeated calls
/// with unchanged facts give the same result.
pub fn apply_known_confidence(hypothesis: &mut Hypothesis, known: &KnownFacts, policy: &Policy) {
    let weak: Vec<(&String, f64, &str)> = known
        .iter()
        .filter(|(_, fact)| fact.confidence() < policy.low_confidence_bound)
        .map(|(key, fact)| (key, fact.confidence(), fact.value()))
        .collect();

    for item in hypothesis.evidence_mut() {
        let original = item.capture_original();

        let mut discount = 1.0;
        let mut applied: Vec<&str> = Vec::new();
        for (key, confidence, value) in &weak {
            if item.references(value) || item.references(key) {
                discount *= confidence;
                applied.push(key.as_str());
            }
        }

        item.confidence.set_value(original * discount);
        if applied.is_empty() {
            item.confidence.set_basis(item.source_id.clone());
        } else {
            item.confidence
                .set_basis(format!("{} discounted by {}", item.source_id, applied.join(", ")));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::hypothesis::Evidence;
    use crate::problem::KnownFact;

    fn grouped_hypothesis() -> Hypothesis {
        let mut h = Hypothesis::new("grouped");
        h.add_evidence(Evidence::supporting("a1", 0.8, "c1", "A"));
        h.add_evidence(Evidence::supporting("a2", 0.7, "c1", "A"));
        h.add_evidence(Evidence::supporting("a3", 0.6, "c1", "A"));
        h.add_evidence(Evidence::contradicting("b1", 0.8, "c2", "B"));
        h.add_evidence(Evidence::contradicting("c1", 0.7, "c3", "C"));
        h
    }

    #[test]
    fn test_no_evidence() {
        let mut h = Hypothesis::new("empty");
        update_confidence(&mut h, &Policy::default());
        assert_eq!(h.confidence.value(), 0.0);
        assert_eq!(h.confidence.volatility(), 1.0);
        assert_eq!(h.confidence.basis(), "no evidence");
    }

    #[test]
    fn test_same_group_discount() {
        let unweighted = aggregate(&grouped_hypothesis(), 1.0).value();

        let mut h = grouped_hypothesis();
        let policy = Policy {
            same_group_weight: 0.3,
            ..Policy::default()
        };
        update_confidence(&mut h, &policy);
        let weighted = h.confidence.value();

        assert!(unweighted > weighted);
        assert!((weighted - 1.19 / (1.19 + 1.5)).abs() < 0.001);
        assert!((weighted - 0.4424).abs() < 0.001);
    }

    #[test]
    fn test_volatility_shrinks_but_never_zero() {
        let mut h = Hypothesis::new("v");
        let policy = Policy::default();
        let mut last = 1.0;
        for i in 0..50 {
            h.add_evidence(Evidence::supporting(format!("e{}", i), 0.5, "c", format!("g{}", i)));
            update_confidence(&mut h, &policy);
            let vol = h.confidence.volatility();
            assert!(vol < last);
            assert!(vol > 0.0);
            last = vol;
        }
    }

    #[test]
    fn test_basis_counts() {
        let mut h = grouped_hypothesis();
        update_confidence(&mut h, &Policy::default());
        assert_eq!(h.confidence.basis(), "3 sup 2 contra");
    }

    #[test]
    fn test_zero_weight_evidence_gives_zero() {
        let mut h = Hypothesis::new("z");
        h.add_evidence(Evidence::supporting("nothing", 0.0, "c", "g"));
        update_confidence(&mut h, &Policy::default());
        assert_eq!(h.confidence.value(), 0.0);
    }

    #[test]
    fn test_apply_known_confidence_is_idempotent() {
        let mut known = KnownFacts::new();
        known.insert("budget".to_string(), KnownFact::user("5000", 0.4));
        let policy = Policy::default();

        let mut h = Hypothesis::new("fits the budget");
        h.add_evidence(Evidence::supporting("costs stay under 5000", 0.8, "c1", "g"));

        apply_known_confidence(&mut h, &known, &policy);
        assert!((h.evidence()[0].confidence.value() - 0.32).abs() < 1e-9);

        apply_known_confidence(&mut h, &known, &policy);
        assert!((h.evidence()[0].confidence.value() - 0.32).abs() < 1e-9);
        assert_eq!(h.evidence()[0].original_confidence(), Some(0.8));
        assert_eq!(h.evidence()[0].confidence.basis(), "c1 discounted by budget");
    }

    #[test]
    fn test_discount_lifted_when_fact_becomes_confident() {
        let mut known = KnownFacts::new();
        known.insert("budget".to_string(), KnownFact::user("5000", 0.4));
        let policy = Policy::default();

        let mut h = Hypothesis::new("fits");
        h.add_evidence(Evidence::supporting("the budget holds", 0.8, "c1", "g"));
        apply_known_confidence(&mut h, &known, &policy);
        assert!((h.evidence()[0].confidence.value() - 0.32).abs() < 1e-9);

        known.insert("budget".to_string(), KnownFact::user("5000", 0.95));
        apply_known_confidence(&mut h, &known, &policy);
        assert!((h.evidence()[0].confidence.value() - 0.8).abs() < 1e-9);
        assert_eq!(h.evidence()[0].confidence.basis(), "c1");
    }

    #[test]
    fn test_unrelated_evidence_untouched() {
        let mut known = KnownFacts::new();
        known.insert("budget".to_string(), KnownFact::user("5000", 0.4));

        let mut h = Hypothesis::new("x");
        h.add_evidence(Evidence::supporting("team is small", 0.8, "c1", "g"));
        apply_known_confidence(&mut h, &known, &Policy::default());
        assert_eq!(h.evidence()[0].confidence.value(), 0.8);
    }

    #[test]
    fn test_multiple_weak_facts_multiply() {
        let mut known = KnownFacts::new();
        known.insert("budget".to_string(), KnownFact::user("5000", 0.4));
        known.insert("deadline".to_string(), KnownFact::user("friday", 0.5 - 1e-9));

        let mut h = Hypothesis::new("x");
        h.add_evidence(Evidence::supporting("5000 by friday", 1.0, "c1", "g"));
        apply_known_confidence(&mut h, &known, &Policy::default());
        assert!((h.evidence()[0].confidence.value() - 0.2).abs() < 1e-6);
    }
}
