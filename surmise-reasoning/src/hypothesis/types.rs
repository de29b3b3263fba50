//! Hypotheses and their lifecycle
//!
//! A hypothesis is a claim plus the evidence gathered for it, in arrival
//! order. Status only moves forward: active, then revised when a fact it
//! leans on changes, then superseded for good.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::errors::{ReasoningError, Result};
use crate::hypothesis::confidence::Confidence;
use crate::hypothesis::evidence::Evidence;

/// Unique identifier for a hypothesis
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct HypothesisId(pub Uuid);

impl HypothesisId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for HypothesisId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for HypothesisId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Lifecycle status of a hypothesis
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum HypothesisStatus {
    /// Created this or an earlier turn, not yet revisited
    Active,
    /// Recomputed after a known fact it depends on changed
    Revised,
    /// Demoted; excluded from ranking and synthesis for good
    Superseded,
}

impl HypothesisStatus {
    /// Valid status transitions
    ///
    /// Returns true if transition from self to next is valid
    pub fn can_transition_to(&self, next: &HypothesisStatus) -> bool {
        match (self, next) {
            (HypothesisStatus::Superseded, HypothesisStatus::Superseded) => true,
            (HypothesisStatus::Superseded, _) => false,
            (HypothesisStatus::Revised, HypothesisStatus::Active) => false,
            _ => true,
        }
    }

    /// Active and revised hypotheses take part in ranking and synthesis
    pub fn is_live(&self) -> bool {
        !matches!(self, HypothesisStatus::Superseded)
    }
}

/// A candidate claim with accumulated evidence
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Hypothesis {
    pub id: HypothesisId,
    pub claim: String,
    evidence: Vec<Evidence>,
    pub confidence: Confidence,
    /// Turn in which the hypothesis was created
    pub turn_id: u32,
    status: HypothesisStatus,
    pub eval_count: u32,
    pub created_at: DateTime<Utc>,
}

impl Hypothesis {
    /// Create an active hypothesis with no evidence
    pub fn new(claim: impl Into<String>) -> Self {
        Self {
            id: HypothesisId::new(),
            claim: claim.into(),
            evidence: Vec::new(),
            confidence: Confidence::no_evidence(),
            turn_id: 0,
            status: HypothesisStatus::Active,
            eval_count: 0,
            created_at: Utc::now(),
        }
    }

    /// Builder-style confidence override, mostly for callers seeding priors
    pub fn with_confidence(mut self, confidence: Confidence) -> Self {
        self.confidence = confidence;
        self
    }

    pub fn with_turn(mut self, turn_id: u32) -> Self {
        self.turn_id = turn_id;
        self
    }

    pub fn id(&self) -> HypothesisId {
        self.id
    }

    pub fn claim(&self) -> &str {
        &self.claim
    }

    pub fn status(&self) -> HypothesisStatus {
        self.status
    }

    pub fn is_live(&self) -> bool {
        self.status.is_live()
    }

    pub fn evidence(&self) -> &[Evidence] {
        &self.evidence
    }

    /// In-place access for discounting; evidence cannot be removed or reordered
    pub fn evidence_mut(&mut self) -> &mut [Evidence] {
        &mut self.evidence
    }

    /// Append evidence. Order is preserved and significant.
    pub fn add_evidence(&mut self, evidence: Evidence) {
        self.evidence.push(evidence);
    }

    /// Transition to a new status
    pub fn set_status(&mut self, new_status: HypothesisStatus) -> Result<()> {
        if !self.status.can_transition_to(&new_status) {
            return Err(ReasoningError::InvalidState(format!(
                "Invalid status transition: {:?} -> {:?}",
                self.status, new_status
            )));
        }
        self.status = new_status;
        Ok(())
    }

    /// Mark a freshly generated hypothesis as created in `turn_id`.
    /// Only meant for hypotheses not yet added to a problem.
    pub fn stamp_new(&mut self, turn_id: u32) {
        self.turn_id = turn_id;
        self.status = HypothesisStatus::Active;
    }

    /// Marks a live hypothesis as revised. Returns false, leaving the status
    /// alone, when it is already superseded.
    pub fn revise(&mut self) -> bool {
        if !self.is_live() {
            return false;
        }
        self.status = HypothesisStatus::Revised;
        true
    }

    /// Terminal demotion. Idempotent.
    pub fn supersede(&mut self) {
        self.status = HypothesisStatus::Superseded;
    }

    /// Any evidence content contains the needle
    pub fn references(&self, needle: &str) -> bool {
        self.evidence.iter().any(|e| e.references(needle))
    }
}
