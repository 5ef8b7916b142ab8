//! Event types for workflow progress
//!
//! Subscribers (CLI progress logging, UIs) observe a run through these
//! events; the controller never reads them back.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::council::ReviewerId;
use crate::review::Recommendation;
use crate::workflow::{WorkflowPhase, WorkflowStatus};

/// Identifier of one workflow run
pub type RunId = String;

/// All workflow progress events
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum WorkflowEvent {
    /// A run was accepted for execution
    RunStarted {
        run_id: RunId,
        query_preview: String,
        max_iterations: u32,
        reviewers: usize,
        timestamp: DateTime<Utc>,
    },

    /// The state machine moved to a new phase
    PhaseChanged {
        run_id: RunId,
        iteration: u32,
        from: WorkflowPhase,
        to: WorkflowPhase,
        timestamp: DateTime<Utc>,
    },

    /// One review of a completed fanout, published in reviewer order
    ReviewRecorded {
        run_id: RunId,
        iteration: u32,
        reviewer: ReviewerId,
        reviewer_label: String,
        score: f64,
        recommendation: Recommendation,
        timestamp: DateTime<Utc>,
    },

    /// A round was decided
    RoundCompleted {
        run_id: RunId,
        iteration: u32,
        scores: Vec<f64>,
        passing: usize,
        accepted: bool,
        duration_ms: u64,
        timestamp: DateTime<Utc>,
    },

    /// The run reached a terminal status
    RunFinished {
        run_id: RunId,
        status: WorkflowStatus,
        iterations: u32,
        final_scores: Vec<f64>,
        timestamp: DateTime<Utc>,
    },

    /// The run aborted on a producer failure
    RunFailed {
        run_id: RunId,
        iteration: u32,
        error: String,
        timestamp: DateTime<Utc>,
    },
}

impl WorkflowEvent {
    pub fn run_id(&self) -> &str {
        match self {
            WorkflowEvent::RunStarted { run_id, .. }
            | WorkflowEvent::PhaseChanged { run_id, .. }
            | WorkflowEvent::ReviewRecorded { run_id, .. }
            | WorkflowEvent::RoundCompleted { run_id, .. }
            | WorkflowEvent::RunFinished { run_id, .. }
            | WorkflowEvent::RunFailed { run_id, .. } => run_id,
        }
    }

    pub fn timestamp(&self) -> DateTime<Utc> {
        match self {
            WorkflowEvent::RunStarted { timestamp, .. }
            | WorkflowEvent::PhaseChanged { timestamp, .. }
            | WorkflowEvent::ReviewRecorded { timestamp, .. }
            | WorkflowEvent::RoundCompleted { timestamp, .. }
            | WorkflowEvent::RunFinished { timestamp, .. }
            | WorkflowEvent::RunFailed { timestamp, .. } => *timestamp,
        }
    }

    /// Event type name as used in the serialized `type` tag
    pub fn event_type(&self) -> &'static str {
        match self {
            WorkflowEvent::RunStarted { .. } => "run_started",
            WorkflowEvent::PhaseChanged { .. } => "phase_changed",
            WorkflowEvent::ReviewRecorded { .. } => "review_recorded",
            WorkflowEvent::RoundCompleted { .. } => "round_completed",
            WorkflowEvent::RunFinished { .. } => "run_finished",
            WorkflowEvent::RunFailed { .. } => "run_failed",
        }
    }

    /// Whether no further events follow for this run
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            WorkflowEvent::RunFinished { .. } | WorkflowEvent::RunFailed { .. }
        )
    }
}

/// Truncate a query for event payloads, respecting char boundaries.
pub fn preview(text: &str, max_chars: usize) -> String {
    match text.char_indices().nth(max_chars) {
        Some((idx, _)) => format!("{}...", &text[..idx]),
        None => text.to_string(),
    }
}
