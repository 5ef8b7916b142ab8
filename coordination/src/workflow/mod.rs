//! Produce → review → decide → revise workflow.
//!
//! The [`WorkflowController`] drives a bounded state machine over a
//! [`RunSession`]. Only a producer failure ends a run with an error; every
//! other failure is absorbed into data so a run always reaches
//! [`WorkflowStatus::Accepted`] or [`WorkflowStatus::Exhausted`] within
//! `max_iterations` rounds.
//!
//! ```text
//! PRODUCING ─▶ REVIEWING ─▶ DECIDING ─┬─▶ ACCEPTED
//!     ▲                               ├─▶ EXHAUSTED   (final iteration)
//!     └───────── REVISING ◀───────────┘
//! ```

pub mod controller;
pub mod policy;
pub mod state;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::config::ConfigError;
use crate::council::AgentError;
use crate::review::Round;

pub use controller::WorkflowController;
pub use policy::{AcceptancePolicy, Decision};
pub use state::{PhaseTransition, RunSession, TransitionError, WorkflowPhase};

/// Errors that end a run without a result
#[derive(Debug, Error)]
pub enum WorkflowError {
    #[error("producer failed on iteration {iteration}: {source}")]
    Producer { iteration: u32, source: AgentError },

    #[error("query must not be empty")]
    EmptyQuery,

    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error("workflow state error: {0}")]
    InvalidTransition(#[from] TransitionError),
}

/// Terminal status of a completed run
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum WorkflowStatus {
    Accepted,
    Exhausted,
}

impl std::fmt::Display for WorkflowStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Accepted => write!(f, "ACCEPTED"),
            Self::Exhausted => write!(f, "EXHAUSTED"),
        }
    }
}

/// Outcome of a run that reached a terminal status.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WorkflowResult {
    pub run_id: String,
    pub query: String,
    pub status: WorkflowStatus,
    /// Artifact of the last recorded round.
    pub artifact: String,
    /// Full round history, oldest first.
    pub rounds: Vec<Round>,
    /// Scores of the last recorded round, in reviewer order.
    pub final_scores: Vec<f64>,
    /// Rounds executed; always equals `rounds.len()`.
    pub iterations: u32,
    pub transitions: Vec<PhaseTransition>,
}

impl WorkflowResult {
    pub fn is_accepted(&self) -> bool {
        self.status == WorkflowStatus::Accepted
    }

    pub fn final_round(&self) -> Option<&Round> {
        self.rounds.last()
    }

    /// Final scores meeting `policy`'s threshold.
    pub fn passing_count(&self, policy: &AcceptancePolicy) -> usize {
        policy.passing_count(&self.final_scores)
    }

    /// Compact summary line.
    pub fn summary_line(&self) -> String {
        let scores = self
            .final_scores
            .iter()
            .map(|s| format!("{:.1}", s))
            .collect::<Vec<_>>()
            .join(", ");
        format!(
            "[{}] {} round(s) | scores=[{}] | run={}",
            self.status, self.iterations, scores, self.run_id
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    fn result(status: WorkflowStatus, scores: Vec<f64>) -> WorkflowResult {
        let round = Round::new(1, "report".to_string(), Vec::new(), Utc::now());
        WorkflowResult {
            run_id: "run-1".to_string(),
            query: "q".to_string(),
            status,
            artifact: "report".to_string(),
            rounds: vec![round],
            final_scores: scores,
            iterations: 1,
            transitions: Vec::new(),
        }
    }

    #[test]
    fn test_summary_line() {
        let r = result(WorkflowStatus::Accepted, vec![4.0, 2.0, 3.5]);
        assert!(r.is_accepted());
        assert_eq!(
            r.summary_line(),
            "[ACCEPTED] 1 round(s) | scores=[4.0, 2.0, 3.5] | run=run-1"
        );
        assert_eq!(r.passing_count(&AcceptancePolicy::default()), 2);
        assert_eq!(r.final_round().map(|round| round.iteration), Some(1));
    }

    #[test]
    fn test_status_serialization() {
        let json = serde_json::to_string(&WorkflowStatus::Exhausted).unwrap();
        assert_eq!(json, "\"EXHAUSTED\"");
    }

    #[test]
    fn test_producer_error_display() {
        let err = WorkflowError::Producer {
            iteration: 2,
            source: AgentError::Unavailable("model offline".to_string()),
        };
        assert_eq!(
            err.to_string(),
            "producer failed on iteration 2: Agent unavailable: model offline"
        );
        assert!(std::error::Error::source(&err).is_some());
    }
}
