//! Evidence attached to hypotheses
//!
//! Each piece of evidence is a single supporting or contradicting
//! observation returned by the reasoning oracle. Evidence carries the id of
//! the oracle call that produced it and an independence group: items that
//! share a group came from one correlated source and are weighted down
//! during aggregation.

use serde::{Deserialize, Serialize};

use crate::hypothesis::confidence::Confidence;

/// A supporting or contradicting observation owned by one hypothesis
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Evidence {
    pub content: String,
    pub supports: bool,
    pub confidence: Confidence,
    pub source_id: String,
    pub independence_group: String,
    /// Confidence before any known-fact discount, captured once
    #[serde(default)]
    original_confidence: Option<f64>,
}

impl Evidence {
    pub fn new(
        content: impl Into<String>,
        supports: bool,
        confidence: f64,
        source_id: impl Into<String>,
        independence_group: impl Into<String>,
    ) -> Self {
        let source_id = source_id.into();
        Self {
            content: content.into(),
            supports,
            confidence: Confidence::certain_of(confidence, source_id.clone()),
            source_id,
            independence_group: independence_group.into(),
            original_confidence: None,
        }
    }

    /// Supporting evidence
    pub fn supporting(
        content: impl Into<String>,
        confidence: f64,
        source_id: impl Into<String>,
        independence_group: impl Into<String>,
    ) -> Self {
        Self::new(content, true, confidence, source_id, independence_group)
    }

    /// Contradicting evidence
    pub fn contradicting(
        content: impl Into<String>,
        confidence: f64,
        source_id: impl Into<String>,
        independence_group: impl Into<String>,
    ) -> Self {
        Self::new(content, false, confidence, source_id, independence_group)
    }

    pub fn is_supporting(&self) -> bool {
        self.supports
    }

    pub fn is_contradicting(&self) -> bool {
        !self.supports
    }

    /// Pre-discount confidence, if it has been captured
    pub fn original_confidence(&self) -> Option<f64> {
        self.original_confidence
    }

    /// Capture the current confidence as the original on first call and
    /// return the captured value on every call
    pub fn capture_original(&mut self) -> f64 {
        *self
            .original_confidence
            .get_or_insert(self.confidence.value())
    }

    /// Substring test used to correlate evidence with known facts
    pub fn references(&self, needle: &str) -> bool {
        !needle.is_empty() && self.content.contains(needle)
    }
}
