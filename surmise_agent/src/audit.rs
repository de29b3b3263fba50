//! Turn audit trail with serde-serializable events.
//!
//! Every phase of a turn records an event into the turn's `AuditLog`. The
//! log lives in memory and is handed back with the turn report; callers
//! that want durability can write it out with `AuditLog::persist`, which
//! stores the events as `{dir}/{log_id}.json`.

use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

/// Error types for audit persistence.
#[derive(Error, Debug)]
pub enum AuditError {
    /// Failed to serialize audit events
    #[error("Serialization failed: {0}")]
    SerializationFailed(#[from] serde_json::Error),

    /// Failed to write audit file
    #[error("Write failed: {0}")]
    WriteFailed(#[from] std::io::Error),
}

/// One recorded turn phase.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub enum AuditEvent {
    /// Turn started (or resumed after a gap suspension)
    TurnStarted {
        timestamp: DateTime<Utc>,
        turn: u32,
        depth: u32,
        resumed: bool,
    },
    /// Known facts differ from the previous snapshot
    KnownChanged {
        timestamp: DateTime<Utc>,
        keys: Vec<String>,
    },
    /// Re-evaluation strategy ran
    Reevaluated {
        timestamp: DateTime<Utc>,
        strategy: String,
        updated: usize,
        superseded: usize,
        delta: f64,
    },
    /// Turn suspended waiting for answers
    GapsRequested {
        timestamp: DateTime<Utc>,
        keys: Vec<String>,
        gap_round: u32,
    },
    /// Problem split into sub-problems
    Decomposed {
        timestamp: DateTime<Utc>,
        sub_problems: usize,
        solved: usize,
    },
    /// New hypotheses produced
    Generated {
        timestamp: DateTime<Utc>,
        count: usize,
        truncated: usize,
    },
    /// Evidence evaluation pass completed
    Evaluated {
        timestamp: DateTime<Utc>,
        strategy: String,
        evaluated: usize,
        candidates: usize,
        new_gaps: usize,
    },
    /// Gap answered from its auto-resolve value
    GapAutoResolved {
        timestamp: DateTime<Utc>,
        key: String,
        value: String,
    },
    /// Excess hypotheses superseded
    Pruned {
        timestamp: DateTime<Utc>,
        superseded: usize,
        live: usize,
    },
    /// Solution synthesized from ranked hypotheses
    Synthesized {
        timestamp: DateTime<Utc>,
        ranked: usize,
        confidence: f64,
    },
    /// Constraints checked against the solution
    Verified {
        timestamp: DateTime<Utc>,
        passed: usize,
        failed: usize,
    },
    /// Turn produced a solution
    TurnCompleted {
        timestamp: DateTime<Utc>,
        turn: u32,
        recommend_continue: bool,
    },
}

impl AuditEvent {
    /// Variant name, for compact log lines
    pub fn kind(&self) -> &'static str {
        match self {
            AuditEvent::TurnStarted { .. } => "turn_started",
            AuditEvent::KnownChanged { .. } => "known_changed",
            AuditEvent::Reevaluated { .. } => "reevaluated",
            AuditEvent::GapsRequested { .. } => "gaps_requested",
            AuditEvent::Decomposed { .. } => "decomposed",
            AuditEvent::Generated { .. } => "generated",
            AuditEvent::Evaluated { .. } => "evaluated",
            AuditEvent::GapAutoResolved { .. } => "gap_auto_resolved",
            AuditEvent::Pruned { .. } => "pruned",
            AuditEvent::Synthesized { .. } => "synthesized",
            AuditEvent::Verified { .. } => "verified",
            AuditEvent::TurnCompleted { .. } => "turn_completed",
        }
    }
}

/// Ordered events for one turn.
#[derive(Clone, Debug)]
pub struct AuditLog {
    id: Uuid,
    events: Vec<AuditEvent>,
}

impl AuditLog {
    pub fn new() -> Self {
        Self {
            id: Uuid::new_v4(),
            events: Vec::new(),
        }
    }

    /// Appends an event.
    pub fn record(&mut self, event: AuditEvent) {
        tracing::trace!(log = %self.id, kind = event.kind(), "audit event");
        self.events.push(event);
    }

    /// Returns a copy of all recorded events.
    pub fn replay(&self) -> Vec<AuditEvent> {
        self.events.clone()
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    /// Consumes the log and returns its events.
    pub fn into_events(self) -> Vec<AuditEvent> {
        self.events
    }

    /// Events as pretty-printed JSON.
    pub fn to_json(&self) -> Result<String, AuditError> {
        Ok(serde_json::to_string_pretty(&self.events)?)
    }

    /// Writes the events to `{dir}/{id}.json`, creating `dir` if needed.
    ///
    /// Returns the path written.
    pub async fn persist(&self, dir: impl AsRef<Path>) -> Result<PathBuf, AuditError> {
        let dir = dir.as_ref();
        tokio::fs::create_dir_all(dir).await?;
        let path = dir.join(format!("{}.json", self.id));
        tokio::fs::write(&path, self.to_json()?).await?;
        Ok(path)
    }

    pub fn len(&self) -> usize {
        self.events.len()
    }

    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }
}

impl Default for AuditLog {
    fn default() -> Self {
        Self::new()
    }
}
