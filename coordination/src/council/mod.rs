//! Review council: producer and reviewer capabilities.
//!
//! The council is a fixed, ordered panel of independent reviewers that score
//! one producer's artifact. Both roles are opaque `run(prompt) → text`
//! oracles; this module only defines their seams and the identity each
//! reviewer seat carries for the lifetime of a run.

pub mod fanout;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use thiserror::Error;

pub use fanout::ReviewFanout;

/// Errors raised by a producer or reviewer capability
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum AgentError {
    #[error("API request failed: {0}")]
    RequestFailed(String),

    #[error("API key not configured: {0}")]
    MissingApiKey(String),

    #[error("Invalid response: {0}")]
    InvalidResponse(String),

    #[error("Agent unavailable: {0}")]
    Unavailable(String),
}

/// The artifact author. Called once per round with either the raw query
/// (first round) or a revision prompt.
#[async_trait]
pub trait Producer: Send + Sync {
    /// Produce a complete artifact for `prompt`.
    async fn produce(&self, prompt: &str) -> Result<String, AgentError>;
}

/// One council member. Sees only the artifact, never other reviews.
#[async_trait]
pub trait Reviewer: Send + Sync {
    /// Review `artifact` and return free-form review text.
    async fn review(&self, artifact: &str) -> Result<String, AgentError>;
}

/// Stable ordinal of a reviewer inside its panel (0..N-1).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ReviewerId(pub usize);

impl std::fmt::Display for ReviewerId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "reviewer-{}", self.0)
    }
}

/// Feedback category a reviewer files its improvement notes under.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FeedbackCategory {
    /// Category name, e.g. `"Methodology"`.
    pub name: String,
    /// Directive issued when this category is critical.
    pub critical_action: String,
    /// Section headers holding improvement notes, in priority order.
    pub section_headers: Vec<String>,
}

impl FeedbackCategory {
    pub fn new(name: &str, critical_action: &str) -> Self {
        Self {
            name: name.to_string(),
            critical_action: critical_action.to_string(),
            section_headers: vec![AREAS_FOR_IMPROVEMENT.to_string()],
        }
    }

    /// Append a fallback section header.
    pub fn with_section(mut self, header: &str) -> Self {
        self.section_headers.push(header.to_string());
        self
    }
}

/// Default improvement section header of the review template
pub const AREAS_FOR_IMPROVEMENT: &str = "Areas for Improvement";

/// Identity of one reviewer seat: ordinal, display label, category.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReviewerSlot {
    pub id: ReviewerId,
    pub label: String,
    pub category: FeedbackCategory,
}

impl ReviewerSlot {
    pub fn new(id: usize, label: &str, category: FeedbackCategory) -> Self {
        Self {
            id: ReviewerId(id),
            label: label.to_string(),
            category,
        }
    }

    /// The three-member research council: methodology, comprehensiveness
    /// and clarity.
    pub fn default_panel() -> Vec<ReviewerSlot> {
        vec![
            ReviewerSlot::new(
                0,
                "Dr. Sarah Chen (Methodology)",
                FeedbackCategory::new("Methodology", "Address methodology issues"),
            ),
            ReviewerSlot::new(
                1,
                "Prof. James Rodriguez (Comprehensiveness)",
                FeedbackCategory::new("Comprehensiveness", "Expand topic coverage")
                    .with_section("Coverage Gaps Identified"),
            ),
            ReviewerSlot::new(
                2,
                "Dr. Emily Thompson (Clarity)",
                FeedbackCategory::new("Clarity", "Improve clarity and organization"),
            ),
        ]
    }
}

/// A reviewer slot bound to the capability that fills it.
#[derive(Clone)]
pub struct ReviewerSeat {
    pub slot: ReviewerSlot,
    pub reviewer: Arc<dyn Reviewer>,
}

impl ReviewerSeat {
    pub fn new(slot: ReviewerSlot, reviewer: Arc<dyn Reviewer>) -> Self {
        Self { slot, reviewer }
    }
}

impl std::fmt::Debug for ReviewerSeat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ReviewerSeat")
            .field("slot", &self.slot)
            .finish_non_exhaustive()
    }
}
