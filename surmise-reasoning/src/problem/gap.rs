//! Information gaps
//!
//! A gap is a missing piece of information blocking confident reasoning.
//! Gaps are keyed; answering a gap stores a known fact under the same key.

use serde::{Deserialize, Serialize};

use crate::errors::{ReasoningError, Result};

/// Lifecycle status of a gap
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum GapStatus {
    Open,
    Answered,
    Skipped,
    Unanswerable,
}

impl GapStatus {
    /// Open gaps may move anywhere; answered gaps may only be refilled.
    pub fn can_transition_to(&self, next: &GapStatus) -> bool {
        match (self, next) {
            (GapStatus::Open, GapStatus::Open) => false,
            (GapStatus::Open, _) => true,
            (GapStatus::Answered, GapStatus::Answered) => true,
            _ => false,
        }
    }
}

/// Answer the engine may fill in without asking
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct AutoResolve {
    pub value: String,
    pub confidence: f64,
}

/// A missing piece of information
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Gap {
    pub key: String,
    pub question: String,
    pub required: bool,
    status: GapStatus,
    #[serde(default)]
    pub auto_resolve: Option<AutoResolve>,
}

impl Gap {
    /// Open, required gap
    pub fn new(key: impl Into<String>, question: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            question: question.into(),
            required: true,
            status: GapStatus::Open,
            auto_resolve: None,
        }
    }

    /// Open gap that does not block a turn
    pub fn optional(key: impl Into<String>, question: impl Into<String>) -> Self {
        Self {
            required: false,
            ..Self::new(key, question)
        }
    }

    pub fn with_auto_resolve(mut self, value: impl Into<String>, confidence: f64) -> Self {
        self.auto_resolve = Some(AutoResolve {
            value: value.into(),
            confidence,
        });
        self
    }

    pub fn status(&self) -> GapStatus {
        self.status
    }

    pub fn is_open(&self) -> bool {
        self.status == GapStatus::Open
    }

    /// Move to a new status, enforcing the lifecycle
    pub fn transition(&mut self, next: GapStatus) -> Result<()> {
        if !self.status.can_transition_to(&next) {
            return Err(ReasoningError::InvalidState(format!(
                "gap '{}': invalid transition {:?} -> {:?}",
                self.key, self.status, next
            )));
        }
        self.status = next;
        Ok(())
    }
}
