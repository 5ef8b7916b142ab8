//! Acceptance policy: quorum decision over a round's scores.

use serde::{Deserialize, Serialize};

/// Default minimum score a reviewer must give to count as passing
pub const DEFAULT_THRESHOLD: f64 = 3.0;

/// Default number of passing reviewers required for acceptance
pub const DEFAULT_QUORUM: usize = 2;

/// Quorum rule: accept iff at least `quorum` scores are `>= threshold`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct AcceptancePolicy {
    pub threshold: f64,
    pub quorum: usize,
}

impl Default for AcceptancePolicy {
    fn default() -> Self {
        Self {
            threshold: DEFAULT_THRESHOLD,
            quorum: DEFAULT_QUORUM,
        }
    }
}

/// Outcome of applying the policy to one score list.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Decision {
    pub accepted: bool,
    /// Scores meeting the threshold.
    pub passing: usize,
    /// Scores considered.
    pub total: usize,
    pub required: usize,
}

impl AcceptancePolicy {
    pub fn new(threshold: f64, quorum: usize) -> Self {
        Self { threshold, quorum }
    }

    /// Number of scores meeting the threshold.
    pub fn passing_count(&self, scores: &[f64]) -> usize {
        scores.iter().filter(|&&s| s >= self.threshold).count()
    }

    pub fn accept(&self, scores: &[f64]) -> bool {
        self.passing_count(scores) >= self.quorum
    }

    pub fn decide(&self, scores: &[f64]) -> Decision {
        let passing = self.passing_count(scores);
        Decision {
            accepted: passing >= self.quorum,
            passing,
            total: scores.len(),
            required: self.quorum,
        }
    }
}

impl std::fmt::Display for Decision {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let verdict = if self.accepted { "accept" } else { "reject" };
        write!(
            f,
            "{} ({}/{} passing, {} required)",
            verdict, self.passing, self.total, self.required
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_policy() {
        let policy = AcceptancePolicy::default();
        assert_eq!(policy.threshold, 3.0);
        assert_eq!(policy.quorum, 2);
    }

    #[test]
    fn test_quorum_met() {
        let policy = AcceptancePolicy::default();
        assert!(policy.accept(&[4.0, 2.0, 3.5]));
        assert!(policy.accept(&[3.0, 3.0, 0.0]));
    }

    #[test]
    fn test_quorum_missed() {
        let policy = AcceptancePolicy::default();
        assert!(!policy.accept(&[2.0, 3.0, 1.0]));
        assert!(!policy.accept(&[2.9, 2.9, 2.9]));
        assert!(!policy.accept(&[]));
    }

    #[test]
    fn test_custom_threshold_and_quorum() {
        let policy = AcceptancePolicy::new(4.0, 3);
        assert!(!policy.accept(&[4.0, 4.5, 3.9]));
        assert!(policy.accept(&[4.0, 4.5, 5.0]));
    }

    #[test]
    fn test_decide_reports_counts() {
        let decision = AcceptancePolicy::default().decide(&[2.0, 3.0, 1.0]);
        assert!(!decision.accepted);
        assert_eq!(decision.passing, 1);
        assert_eq!(decision.total, 3);
        assert_eq!(decision.required, 2);
        assert_eq!(decision.to_string(), "reject (1/3 passing, 2 required)");
    }
}
