//! Review Council Coordination Library
//!
//! Orchestration core of a multi-agent "produce → review → decide → revise"
//! workflow:
//! - A producer writes an artifact (a text report) for a query
//! - A fixed panel of independent reviewers scores it concurrently
//! - A quorum rule accepts or rejects the round
//! - On rejection the producer revises from aggregated feedback, bounded by
//!   a hard iteration cap
//!
//! Producer and reviewer capabilities are opaque traits ([`Producer`],
//! [`Reviewer`]); this crate has no network, UI or persistence surface.
//!
//! # Usage
//!
//! ```ignore
//! use coordination::{ReviewerSeat, ReviewerSlot, WorkflowConfig, WorkflowController};
//!
//! let panel = ReviewerSlot::default_panel()
//!     .into_iter()
//!     .zip(reviewers)
//!     .map(|(slot, reviewer)| ReviewerSeat::new(slot, reviewer))
//!     .collect();
//! let controller = WorkflowController::new(producer, panel, WorkflowConfig::default())?;
//! let result = controller.execute("Impact of sleep on memory consolidation").await?;
//! println!("{}", result.summary_line());
//! ```

#![allow(clippy::uninlined_format_args)]

pub mod config;
pub mod council;
pub mod events;
pub mod feedback;
pub mod review;
pub mod workflow;

pub use config::{ConfigError, WorkflowConfig};
pub use council::{
    AgentError, FeedbackCategory, Producer, ReviewFanout, Reviewer, ReviewerId, ReviewerSeat,
    ReviewerSlot,
};
pub use events::{EventBus, SharedEventBus, WorkflowEvent};
pub use feedback::{
    build_revision_prompt, FeedbackAggregator, JsonResponseParser, MarkdownResponseParser,
    ResponseParser, RevisionDirective,
};
pub use review::{Recommendation, Review, Round};
pub use workflow::{
    AcceptancePolicy, Decision, RunSession, WorkflowController, WorkflowError, WorkflowPhase,
    WorkflowResult, WorkflowStatus,
};
