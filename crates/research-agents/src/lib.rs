//! LLM-backed capabilities for the review council workflow.
//!
//! Supplies a researcher [`Producer`](coordination::Producer) and a panel of
//! persona [`Reviewer`](coordination::Reviewer)s over any OpenAI-compatible
//! chat completions endpoint, plus result rendering for the CLI.

pub mod agents;
pub mod config;
pub mod llm;
pub mod prompts;
pub mod render;

pub use agents::{build_panel, build_producer, LlmProducer, LlmReviewer};
pub use config::{AgentsConfig, ModelEntry, ReviewerEntry};
pub use llm::{ChatClient, ChatMessage};
pub use prompts::{Persona, PROMPT_VERSION};
