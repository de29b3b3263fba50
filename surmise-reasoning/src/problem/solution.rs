//! Constraints and synthesized solutions

use chrono::{DateTime, Utc};
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use crate::hypothesis::{Confidence, HypothesisId};

/// A condition a solution must satisfy; checked by an external verifier
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Constraint {
    pub description: String,
}

impl Constraint {
    pub fn new(description: impl Into<String>) -> Self {
        Self {
            description: description.into(),
        }
    }
}

/// Answer synthesized from ranked hypotheses
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Solution {
    pub content: String,
    pub confidence: Confidence,
    /// Hypotheses the solution was derived from
    pub basis: Vec<HypothesisId>,
    /// Constraint description -> satisfied
    pub constraint_results: IndexMap<String, bool>,
    pub turn_id: u32,
    pub created_at: DateTime<Utc>,
}

impl Solution {
    pub fn new(content: impl Into<String>, confidence: Confidence, basis: Vec<HypothesisId>) -> Self {
        Self {
            content: content.into(),
            confidence,
            basis,
            constraint_results: IndexMap::new(),
            turn_id: 0,
            created_at: Utc::now(),
        }
    }

    /// True when every verified constraint passed (vacuously true if none)
    pub fn satisfies_constraints(&self) -> bool {
        self.constraint_results.values().all(|ok| *ok)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_satisfies_constraints() {
        let mut s = Solution::new("answer", Confidence::certain_of(0.8, "test"), Vec::new());
        assert!(s.satisfies_constraints());
        s.constraint_results.insert("under budget".to_string(), true);
        assert!(s.satisfies_constraints());
        s.constraint_results.insert("ships by friday".to_string(), false);
        assert!(!s.satisfies_constraints());
    }
}
