//! Bounded confidence estimate
//!
//! A confidence is a value in [0.0, 1.0] paired with a volatility in
//! [0.0, 1.0] (how uncertain the estimate itself is) and a free-text basis
//! recording where the number came from. Both numeric fields are clamped on
//! every write, so a `Confidence` can never leave its bounds.

use serde::{Deserialize, Serialize};

/// Bounded confidence value with volatility and provenance
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Confidence {
    value: f64,
    volatility: f64,
    basis: String,
}

fn clamp_unit(x: f64) -> f64 {
    if x.is_nan() {
        0.0
    } else {
        x.clamp(0.0, 1.0)
    }
}

impl Confidence {
    /// Create a confidence, clamping value and volatility into [0.0, 1.0]
    pub fn new(value: f64, volatility: f64, basis: impl Into<String>) -> Self {
        Self {
            value: clamp_unit(value),
            volatility: clamp_unit(volatility),
            basis: basis.into(),
        }
    }

    /// Confidence of a hypothesis nothing has been said about yet
    pub fn no_evidence() -> Self {
        Self::new(0.0, 1.0, "no evidence")
    }

    /// Fixed-value confidence with zero volatility
    pub fn certain_of(value: f64, basis: impl Into<String>) -> Self {
        Self::new(value, 0.0, basis)
    }

    pub fn value(&self) -> f64 {
        self.value
    }

    pub fn volatility(&self) -> f64 {
        self.volatility
    }

    pub fn basis(&self) -> &str {
        &self.basis
    }

    pub fn set_value(&mut self, value: f64) {
        self.value = clamp_unit(value);
    }

    pub fn set_volatility(&mut self, volatility: f64) {
        self.volatility = clamp_unit(volatility);
    }

    /// Replace the basis. Never appends.
    pub fn set_basis(&mut self, basis: impl Into<String>) {
        self.basis = basis.into();
    }

    /// Check whether value and volatility both pass the given thresholds
    pub fn is_settled(&self, min_value: f64, max_volatility: f64) -> bool {
        self.value >= min_value && self.volatility <= max_volatility
    }
}

impl Default for Confidence {
    fn default() -> Self {
        Self::no_evidence()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_confidence_clamps_bounds() {
        let c = Confidence::new(1.7, -0.3, "x");
        assert_eq!(c.value(), 1.0);
        assert_eq!(c.volatility(), 0.0);
    }

    #[test]
    fn test_confidence_nan_clamps_to_zero() {
        let c = Confidence::new(f64::NAN, f64::NAN, "x");
        assert_eq!(c.value(), 0.0);
        assert_eq!(c.volatility(), 0.0);
    }

    #[test]
    fn test_setters_clamp() {
        let mut c = Confidence::default();
        c.set_value(2.0);
        c.set_volatility(-1.0);
        assert_eq!(c.value(), 1.0);
        assert_eq!(c.volatility(), 0.0);
    }

    #[test]
    fn test_default_is_no_evidence() {
        let c = Confidence::default();
        assert_eq!(c.value(), 0.0);
        assert_eq!(c.volatility(), 1.0);
        assert_eq!(c.basis(), "no evidence");
    }

    #[test]
    fn test_set_basis_overwrites() {
        let mut c = Confidence::new(0.5, 0.5, "first");
        c.set_basis("second");
        assert_eq!(c.basis(), "second");
    }

    #[test]
    fn test_is_settled() {
        let c = Confidence::new(0.8, 0.2, "x");
        assert!(c.is_settled(0.7, 0.4));
        assert!(!c.is_settled(0.9, 0.4));
        assert!(!c.is_settled(0.7, 0.1));
    }
}
