//! Review Feedback Module
//!
//! Turns council prose into signals the workflow can act on:
//! - Extract score, verdict and sections from reviewer text
//! - Aggregate one round's reviews into a revision directive
//! - Render the revision prompt for the producer
//!
//! # Architecture
//!
//! ```text
//! Reviewer text → ResponseParser → Review ─┐
//!                                          ├→ FeedbackAggregator → RevisionDirective → revision prompt
//! Reviewer text → ResponseParser → Review ─┘
//! ```

pub mod aggregator;
pub mod parser;

pub use aggregator::{
    build_revision_prompt, CategoryFeedback, FeedbackAggregator, PriorityItem, PriorityLevel,
    RevisionDirective,
};
pub use parser::{JsonResponseParser, MarkdownResponseParser, ResponseParser};
