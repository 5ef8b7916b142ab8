//! Workflow state machine: phases, transitions, and run session tracking.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::review::Round;

/// Phase of a workflow run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WorkflowPhase {
    /// Producer is generating or revising the artifact.
    Producing,
    /// Council is reviewing the current artifact.
    Reviewing,
    /// Acceptance policy is applied to the round's scores.
    Deciding,
    /// Feedback is being aggregated for the next round.
    Revising,
    /// Quorum reached.
    Accepted,
    /// Rejected on the final allowed iteration.
    Exhausted,
    /// Producer failure aborted the run.
    Failed,
}

impl WorkflowPhase {
    pub fn is_terminal(self) -> bool {
        matches!(self, Self::Accepted | Self::Exhausted | Self::Failed)
    }

    /// Valid transitions from this phase.
    pub fn valid_transitions(self) -> &'static [WorkflowPhase] {
        match self {
            Self::Producing => &[Self::Reviewing, Self::Failed],
            Self::Reviewing => &[Self::Deciding],
            Self::Deciding => &[Self::Accepted, Self::Revising, Self::Exhausted],
            Self::Revising => &[Self::Producing],
            Self::Accepted | Self::Exhausted | Self::Failed => &[],
        }
    }
}

impl std::fmt::Display for WorkflowPhase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Producing => write!(f, "producing"),
            Self::Reviewing => write!(f, "reviewing"),
            Self::Deciding => write!(f, "deciding"),
            Self::Revising => write!(f, "revising"),
            Self::Accepted => write!(f, "accepted"),
            Self::Exhausted => write!(f, "exhausted"),
            Self::Failed => write!(f, "failed"),
        }
    }
}

/// A phase transition record.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PhaseTransition {
    pub from: WorkflowPhase,
    pub to: WorkflowPhase,
    /// Iteration during which the transition happened.
    pub iteration: u32,
    pub timestamp: DateTime<Utc>,
    pub reason: String,
}

/// Error for invalid state transitions.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransitionError {
    pub from: WorkflowPhase,
    pub to: WorkflowPhase,
    pub reason: String,
}

impl std::fmt::Display for TransitionError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "invalid transition {} → {}: {}",
            self.from, self.to, self.reason
        )
    }
}

impl std::error::Error for TransitionError {}

/// State of one `execute` call: phase, round history, transition log.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunSession {
    pub id: String,
    pub query: String,
    pub phase: WorkflowPhase,
    /// Current iteration (1-based); starts at 1 in `Producing`.
    pub iteration: u32,
    pub max_iterations: u32,
    /// Append-only round history.
    pub rounds: Vec<Round>,
    pub transitions: Vec<PhaseTransition>,
    pub created_at: DateTime<Utc>,
}

impl RunSession {
    pub fn new(query: &str, max_iterations: u32) -> Self {
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            query: query.to_string(),
            phase: WorkflowPhase::Producing,
            iteration: 1,
            max_iterations,
            rounds: Vec::new(),
            transitions: Vec::new(),
            created_at: Utc::now(),
        }
    }

    /// Transition to a new phase with a reason.
    pub fn transition(&mut self, to: WorkflowPhase, reason: &str) -> Result<(), TransitionError> {
        if !self.phase.valid_transitions().contains(&to) {
            return Err(TransitionError {
                from: self.phase,
                to,
                reason: format!(
                    "not a valid transition (allowed: {:?})",
                    self.phase.valid_transitions()
                ),
            });
        }

        // Entering Producing from Revising starts the next iteration
        if self.phase == WorkflowPhase::Revising && to == WorkflowPhase::Producing {
            if self.iteration >= self.max_iterations {
                return Err(TransitionError {
                    from: self.phase,
                    to,
                    reason: format!("iteration cap {} reached", self.max_iterations),
                });
            }
            self.iteration += 1;
        }

        self.transitions.push(PhaseTransition {
            from: self.phase,
            to,
            iteration: self.iteration,
            timestamp: Utc::now(),
            reason: reason.to_string(),
        });
        self.phase = to;
        Ok(())
    }

    /// Append a decided round.
    pub fn record_round(&mut self, round: Round) {
        self.rounds.push(round);
    }

    pub fn last_round(&self) -> Option<&Round> {
        self.rounds.last()
    }

    /// Whether the current iteration is the last one allowed.
    pub fn on_final_iteration(&self) -> bool {
        self.iteration >= self.max_iterations
    }

    pub fn is_terminal(&self) -> bool {
        self.phase.is_terminal()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_session_starts_producing() {
        let session = RunSession::new("query", 2);
        assert_eq!(session.phase, WorkflowPhase::Producing);
        assert_eq!(session.iteration, 1);
        assert!(session.rounds.is_empty());
        assert!(!session.id.is_empty());
    }

    #[test]
    fn test_full_cycle_increments_iteration() {
        let mut session = RunSession::new("query", 2);
        session.transition(WorkflowPhase::Reviewing, "artifact ready").unwrap();
        session.transition(WorkflowPhase::Deciding, "reviews in").unwrap();
        session.transition(WorkflowPhase::Revising, "rejected").unwrap();
        session.transition(WorkflowPhase::Producing, "revision").unwrap();
        assert_eq!(session.iteration, 2);
        assert!(session.on_final_iteration());
        assert_eq!(session.transitions.len(), 4);
        assert_eq!(session.transitions[3].iteration, 2);
    }

    #[test]
    fn test_revising_past_cap_is_rejected() {
        let mut session = RunSession::new("query", 1);
        session.transition(WorkflowPhase::Reviewing, "").unwrap();
        session.transition(WorkflowPhase::Deciding, "").unwrap();
        session.transition(WorkflowPhase::Revising, "").unwrap();
        let err = session.transition(WorkflowPhase::Producing, "").unwrap_err();
        assert!(err.reason.contains("iteration cap"));
        assert_eq!(session.iteration, 1);
    }

    #[test]
    fn test_invalid_transition() {
        let mut session = RunSession::new("query", 2);
        let err = session.transition(WorkflowPhase::Accepted, "skip").unwrap_err();
        assert_eq!(err.from, WorkflowPhase::Producing);
        assert_eq!(err.to, WorkflowPhase::Accepted);
        assert!(err.to_string().contains("producing → accepted"));
    }

    #[test]
    fn test_producing_can_fail() {
        let mut session = RunSession::new("query", 2);
        session.transition(WorkflowPhase::Failed, "producer error").unwrap();
        assert!(session.is_terminal());
        assert!(session.phase.valid_transitions().is_empty());
    }

    #[test]
    fn test_terminal_phases() {
        assert!(WorkflowPhase::Accepted.is_terminal());
        assert!(WorkflowPhase::Exhausted.is_terminal());
        assert!(WorkflowPhase::Failed.is_terminal());
        assert!(!WorkflowPhase::Deciding.is_terminal());
    }
}
