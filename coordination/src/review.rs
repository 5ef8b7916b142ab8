//! Reviews and rounds: immutable records of what the council said.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::council::{ReviewerId, ReviewerSlot};

/// Reviewer verdict extracted from review text.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Recommendation {
    Accept,
    Revise,
    /// Neither verdict token was present.
    Unknown,
    /// The reviewer invocation itself failed; only produced by the fanout.
    Error,
}

impl std::fmt::Display for Recommendation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Accept => write!(f, "ACCEPT"),
            Self::Revise => write!(f, "REVISE"),
            Self::Unknown => write!(f, "UNKNOWN"),
            Self::Error => write!(f, "ERROR"),
        }
    }
}

/// A named section lifted out of a review.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReviewSection {
    pub header: String,
    pub body: String,
}

/// One reviewer's assessment of one artifact.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Review {
    pub reviewer: ReviewerId,
    pub reviewer_label: String,
    /// Raw reviewer output, or a diagnostic for sentinel reviews.
    pub raw_text: String,
    /// Score in `[0, max_score]`.
    pub score: f64,
    pub recommendation: Recommendation,
    pub sections: Vec<ReviewSection>,
}

impl Review {
    /// Zero-score stand-in for a reviewer that failed or timed out.
    pub fn sentinel(slot: &ReviewerSlot, diagnostic: &str) -> Self {
        Self {
            reviewer: slot.id,
            reviewer_label: slot.label.clone(),
            raw_text: diagnostic.to_string(),
            score: 0.0,
            recommendation: Recommendation::Error,
            sections: Vec::new(),
        }
    }

    pub fn is_sentinel(&self) -> bool {
        self.recommendation == Recommendation::Error
    }

    /// Body of the named section, if it was extracted and non-empty.
    pub fn section(&self, header: &str) -> Option<&str> {
        self.sections
            .iter()
            .find(|s| s.header.eq_ignore_ascii_case(header))
            .map(|s| s.body.as_str())
            .filter(|body| !body.is_empty())
    }
}

/// One produce → review → decide cycle.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Round {
    /// 1-based iteration index.
    pub iteration: u32,
    /// The artifact snapshot the council reviewed.
    pub artifact: String,
    /// Reviews in reviewer identity order.
    pub reviews: Vec<Review>,
    pub scores: Vec<f64>,
    pub started_at: DateTime<Utc>,
    pub duration_ms: u64,
}

impl Round {
    pub fn new(
        iteration: u32,
        artifact: String,
        reviews: Vec<Review>,
        started_at: DateTime<Utc>,
    ) -> Self {
        let scores = reviews.iter().map(|r| r.score).collect();
        let duration_ms = (Utc::now() - started_at).num_milliseconds().max(0) as u64;
        Self {
            iteration,
            artifact,
            reviews,
            scores,
            started_at,
            duration_ms,
        }
    }

    /// Number of reviews that failed and were replaced by sentinels.
    pub fn failed_reviews(&self) -> usize {
        self.reviews.iter().filter(|r| r.is_sentinel()).count()
    }
}
