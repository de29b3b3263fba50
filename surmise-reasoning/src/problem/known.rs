//! Known facts
//!
//! A known fact is an established input to the problem. It still carries a
//! confidence, since user answers and inferred values are soft knowledge.
//! Facts are immutable: an update replaces the whole record under its key.

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

/// Mapping from fact key to fact, in insertion order
pub type KnownFacts = IndexMap<String, KnownFact>;

/// Provenance tag for facts supplied directly by the user
pub const SOURCE_USER: &str = "user";
/// Provenance tag for facts given with the problem statement
pub const SOURCE_GIVEN: &str = "given";
/// Provenance tag for facts filled in by the engine itself
pub const SOURCE_INFERRED: &str = "inferred";

/// An established input with its own confidence
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct KnownFact {
    value: String,
    confidence: f64,
    source: String,
}

impl KnownFact {
    pub fn new(value: impl Into<String>, confidence: f64, source: impl Into<String>) -> Self {
        let confidence = if confidence.is_nan() {
            0.0
        } else {
            confidence.clamp(0.0, 1.0)
        };
        Self {
            value: value.into(),
            confidence,
            source: source.into(),
        }
    }

    pub fn user(value: impl Into<String>, confidence: f64) -> Self {
        Self::new(value, confidence, SOURCE_USER)
    }

    pub fn given(value: impl Into<String>) -> Self {
        Self::new(value, 1.0, SOURCE_GIVEN)
    }

    pub fn inferred(value: impl Into<String>, confidence: f64) -> Self {
        Self::new(value, confidence, SOURCE_INFERRED)
    }

    pub fn value(&self) -> &str {
        &self.value
    }

    pub fn confidence(&self) -> f64 {
        self.confidence
    }

    pub fn source(&self) -> &str {
        &self.source
    }

    pub fn is_inferred(&self) -> bool {
        self.source == SOURCE_INFERRED
    }
}
