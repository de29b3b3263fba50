//! Hypotheses with evidence-weighted confidence tracking
//!
//! This module provides the claim/evidence data model and the aggregation
//! that turns ordered evidence into a bounded confidence estimate.

pub mod aggregate;
pub mod confidence;
pub mod evidence;
pub mod types;

// Public exports
pub use aggregate::{aggregate, apply_known_confidence, update_confidence};
pub use confidence::Confidence;
pub use evidence::Evidence;
pub use types::{Hypothesis, HypothesisId, HypothesisStatus};
