//! Numeric policy shared by every strategy
//!
//! All thresholds live in one serde-friendly struct so a policy can be
//! loaded from YAML, tweaked per problem, and handed to the engine at
//! construction time. Missing keys fall back to their defaults.

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::errors::{ReasoningError, Result};

/// Thresholds and limits for evaluation, selection and turn control
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Policy {
    /// Minimum confidence for a solution to count as settled (default: 0.7)
    pub confidence_threshold: f64,
    /// Volatility above which a solution is considered unstable (default: 0.4)
    pub volatility_threshold: f64,
    /// Maximum hypotheses accepted from one generation call (default: 5)
    pub max_hypotheses: usize,
    /// Problem complexity at which decomposition kicks in (default: 6)
    pub decompose_threshold: usize,
    /// Maximum sub-problem nesting depth (default: 2)
    pub max_sub_depth: u32,
    /// Gap-detection rounds before the engine stops asking (default: 2)
    pub max_gap_rounds: u32,
    /// Weight of every non-first evidence item in one independence group (default: 1.0)
    pub same_group_weight: f64,
    /// Expected improvement at which another turn is recommended (default: 0.1)
    pub continuation_threshold: f64,
    /// Known facts below this confidence discount evidence that cites them (default: 0.5)
    pub low_confidence_bound: f64,
    /// Per-turn multiplicative decay for aging hypotheses (default: 0.9)
    pub hypothesis_decay_rate: f64,
    /// Confidence below which a re-evaluated hypothesis is superseded (default: 0.2)
    pub supersede_threshold: f64,
    /// Cap on live hypotheses kept across turns (default: 20)
    pub max_accumulated_hypotheses: usize,
    /// Cap on gaps an evaluation phase may surface per turn (default: 3)
    pub max_mid_turn_gaps: usize,
    /// Confidence given to auto-resolved gap answers (default: 0.6)
    pub inferred_confidence: f64,
    /// Evaluations allowed per turn; `None` evaluates every candidate
    pub eval_budget: Option<usize>,
    /// UCB1 exploration constant (default: 1.41)
    pub exploration_constant: f64,
}

impl Default for Policy {
    fn default() -> Self {
        Self {
            confidence_threshold: 0.7,
            volatility_threshold: 0.4,
            max_hypotheses: 5,
            decompose_threshold: 6,
            max_sub_depth: 2,
            max_gap_rounds: 2,
            same_group_weight: 1.0,
            continuation_threshold: 0.1,
            low_confidence_bound: 0.5,
            hypothesis_decay_rate: 0.9,
            supersede_threshold: 0.2,
            max_accumulated_hypotheses: 20,
            max_mid_turn_gaps: 3,
            inferred_confidence: 0.6,
            eval_budget: None,
            exploration_constant: 1.41,
        }
    }
}

impl Policy {
    /// Parse a policy from YAML; absent keys keep their defaults
    pub fn from_yaml_str(yaml: &str) -> Result<Self> {
        let policy: Policy = serde_yaml::from_str(yaml)?;
        policy.validate()?;
        Ok(policy)
    }

    /// Load a policy from a YAML file
    pub fn from_yaml_file(path: impl AsRef<Path>) -> Result<Self> {
        let contents = std::fs::read_to_string(path.as_ref())?;
        Self::from_yaml_str(&contents)
    }

    pub fn to_yaml(&self) -> Result<String> {
        Ok(serde_yaml::to_string(self)?)
    }

    /// Reject values that would break the algorithms that read them
    pub fn validate(&self) -> Result<()> {
        let unit = [
            ("confidence_threshold", self.confidence_threshold),
            ("volatility_threshold", self.volatility_threshold),
            ("same_group_weight", self.same_group_weight),
            ("low_confidence_bound", self.low_confidence_bound),
            ("hypothesis_decay_rate", self.hypothesis_decay_rate),
            ("supersede_threshold", self.supersede_threshold),
            ("inferred_confidence", self.inferred_confidence),
        ];
        for (name, value) in unit {
            if !(0.0..=1.0).contains(&value) {
                return Err(ReasoningError::Config(format!(
                    "{} must be within [0, 1], got {}",
                    name, value
                )));
            }
        }
        if !(self.continuation_threshold >= 0.0) {
            return Err(ReasoningError::Config(format!(
                "continuation_threshold must be non-negative, got {}",
                self.continuation_threshold
            )));
        }
        if !(self.exploration_constant >= 0.0) {
            return Err(ReasoningError::Config(format!(
                "exploration_constant must be non-negative, got {}",
                self.exploration_constant
            )));
        }
        if self.max_hypotheses == 0 {
            return Err(ReasoningError::Config(
                "max_hypotheses must be at least 1".to_string(),
            ));
        }
        Ok(())
    }

    /// Budget for a round over `candidates` hypotheses
    pub fn budget_for(&self, candidates: usize) -> usize {
        self.eval_budget.unwrap_or(candidates).min(candidates)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_defaults() {
        let p = Policy::default();
        assert_eq!(p.same_group_weight, 1.0);
        assert_eq!(p.exploration_constant, 1.41);
        assert_eq!(p.supersede_threshold, 0.2);
        assert_eq!(p.eval_budget, None);
        assert!(p.validate().is_ok());
    }

    #[test]
    fn test_partial_yaml_keeps_defaults() {
        let p = Policy::from_yaml_str("same_group_weight: 0.3\neval_budget: 2\n").unwrap();
        assert_eq!(p.same_group_weight, 0.3);
        assert_eq!(p.eval_budget, Some(2));
        assert_eq!(p.hypothesis_decay_rate, 0.9);
        assert_eq!(p.max_accumulated_hypotheses, 20);
    }

    #[test]
    fn test_yaml_rejects_out_of_range() {
        let err = Policy::from_yaml_str("hypothesis_decay_rate: 1.5\n").unwrap_err();
        assert!(matches!(err, ReasoningError::Config(_)));
    }

    #[test]
    fn test_yaml_rejects_malformed() {
        let err = Policy::from_yaml_str("max_hypotheses: [not, a, number]\n").unwrap_err();
        assert!(matches!(err, ReasoningError::Yaml(_)));
    }

    #[test]
    fn test_yaml_file_roundtrip() {
        let mut policy = Policy::default();
        policy.max_gap_rounds = 4;
        policy.eval_budget = Some(3);

        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(policy.to_yaml().unwrap().as_bytes()).unwrap();

        let loaded = Policy::from_yaml_file(file.path()).unwrap();
        assert_eq!(loaded, policy);
    }

    #[test]
    fn test_budget_for() {
        let mut p = Policy::default();
        assert_eq!(p.budget_for(4), 4);
        p.eval_budget = Some(2);
        assert_eq!(p.budget_for(4), 2);
        assert_eq!(p.budget_for(1), 1);
    }
}
