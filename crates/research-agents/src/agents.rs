//! LLM-backed producer and reviewer capabilities.

use std::sync::Arc;

use async_trait::async_trait;
use coordination::{AgentError, Producer, Reviewer, ReviewerSeat};
use tracing::info;

use crate::config::AgentsConfig;
use crate::llm::{ChatClient, ChatMessage};
use crate::prompts::{review_request, RESEARCHER_PROMPT};

/// Researcher: writes and revises the report.
pub struct LlmProducer {
    client: ChatClient,
    system_prompt: String,
}

impl LlmProducer {
    pub fn new(client: ChatClient) -> Self {
        Self {
            client,
            system_prompt: RESEARCHER_PROMPT.to_string(),
        }
    }

    pub fn with_system_prompt(mut self, prompt: impl Into<String>) -> Self {
        self.system_prompt = prompt.into();
        self
    }
}

#[async_trait]
impl Producer for LlmProducer {
    async fn produce(&self, prompt: &str) -> Result<String, AgentError> {
        self.client
            .chat(&[
                ChatMessage::system(self.system_prompt.as_str()),
                ChatMessage::user(prompt),
            ])
            .await
    }
}

/// One council member backed by a chat model.
pub struct LlmReviewer {
    client: ChatClient,
    system_prompt: String,
}

impl LlmReviewer {
    pub fn new(client: ChatClient, system_prompt: String) -> Self {
        Self {
            client,
            system_prompt,
        }
    }
}

#[async_trait]
impl Reviewer for LlmReviewer {
    async fn review(&self, artifact: &str) -> Result<String, AgentError> {
        self.client
            .chat(&[
                ChatMessage::system(self.system_prompt.as_str()),
                ChatMessage::user(review_request(artifact)),
            ])
            .await
    }
}

/// Build the researcher from `config`.
pub fn build_producer(config: &AgentsConfig, api_key: &str) -> Result<Arc<dyn Producer>, AgentError> {
    let client = ChatClient::new(config, &config.researcher.model, api_key)?;
    info!(model = %client.model(), "Researcher configured");
    Ok(Arc::new(LlmProducer::new(client)))
}

/// Build the reviewer panel from `config`, in configured order.
pub fn build_panel(config: &AgentsConfig, api_key: &str) -> Result<Vec<ReviewerSeat>, AgentError> {
    config
        .panel_slots()
        .into_iter()
        .zip(&config.reviewers)
        .map(|(slot, entry)| {
            let client = ChatClient::new(config, &entry.model, api_key)?;
            info!(reviewer = %slot.id, label = %slot.label, model = %entry.model, "Reviewer configured");
            let reviewer: Arc<dyn Reviewer> =
                Arc::new(LlmReviewer::new(client, entry.system_prompt()));
            Ok(ReviewerSeat::new(slot, reviewer))
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use coordination::ReviewerId;

    #[test]
    fn test_build_panel_follows_config_order() {
        let config = AgentsConfig::default();
        let panel = build_panel(&config, "sk-test").unwrap();
        assert_eq!(panel.len(), 3);
        for (idx, seat) in panel.iter().enumerate() {
            assert_eq!(seat.slot.id, ReviewerId(idx));
            assert_eq!(seat.slot.label, config.reviewers[idx].label);
        }
        assert_eq!(panel[1].slot.category.name, "Comprehensiveness");
    }

    #[test]
    fn test_build_producer() {
        assert!(build_producer(&AgentsConfig::default(), "sk-test").is_ok());
    }
}
