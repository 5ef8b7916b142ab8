//! OpenAI-compatible chat completions client.
//!
//! Works with any gateway exposing `{api_base}/chat/completions`:
//! OpenRouter, OpenAI, Ollama, vLLM, LiteLLM.

use std::time::Duration;

use coordination::AgentError;
use serde::Serialize;
use serde_json::Value;
use tracing::debug;

use crate::config::AgentsConfig;

/// A message in a chat conversation.
#[derive(Debug, Clone, Serialize)]
pub struct ChatMessage {
    pub role: &'static str,
    pub content: String,
}

impl ChatMessage {
    pub fn system(content: impl Into<String>) -> Self {
        Self {
            role: "system",
            content: content.into(),
        }
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: "user",
            content: content.into(),
        }
    }
}

/// Chat client bound to one model.
#[derive(Debug, Clone)]
pub struct ChatClient {
    client: reqwest::Client,
    endpoint: String,
    api_key: String,
    model: String,
    temperature: f32,
    max_tokens: Option<u32>,
}

impl ChatClient {
    pub fn new(config: &AgentsConfig, model: &str, api_key: &str) -> Result<Self, AgentError> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.request_timeout_secs))
            .build()
            .map_err(|e| AgentError::Unavailable(format!("failed to create HTTP client: {e}")))?;

        Ok(Self {
            client,
            endpoint: format!("{}/chat/completions", config.api_base.trim_end_matches('/')),
            api_key: api_key.to_string(),
            model: model.to_string(),
            temperature: config.temperature,
            max_tokens: config.max_tokens,
        })
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    /// Request body for `messages`.
    pub fn request_body(&self, messages: &[ChatMessage]) -> Value {
        let mut body = serde_json::json!({
            "model": self.model,
            "messages": messages,
            "temperature": self.temperature,
        });
        if let Some(max_tokens) = self.max_tokens {
            body["max_tokens"] = Value::from(max_tokens);
        }
        body
    }

    /// Send one completion request and return the assistant text.
    pub async fn chat(&self, messages: &[ChatMessage]) -> Result<String, AgentError> {
        let start = std::time::Instant::now();

        let response = self
            .client
            .post(&self.endpoint)
            .header("Authorization", format!("Bearer {}", self.api_key))
            .header("Content-Type", "application/json")
            .json(&self.request_body(messages))
            .send()
            .await
            .map_err(|e| AgentError::RequestFailed(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(AgentError::RequestFailed(format!(
                "API error ({}): {}",
                status, body
            )));
        }

        let body: Value = response
            .json()
            .await
            .map_err(|e| AgentError::InvalidResponse(e.to_string()))?;
        let content = extract_content(&body)?;

        debug!(
            model = %self.model,
            chars = content.len(),
            elapsed_ms = start.elapsed().as_millis() as u64,
            "Completion received"
        );
        Ok(content)
    }
}

/// Assistant text of the first choice; empty text is an error.
pub fn extract_content(body: &Value) -> Result<String, AgentError> {
    if let Some(message) = body.get("error").and_then(|e| e.get("message")).and_then(Value::as_str) {
        return Err(AgentError::RequestFailed(message.to_string()));
    }

    let content = body
        .get("choices")
        .and_then(|c| c.get(0))
        .and_then(|c| c.get("message"))
        .and_then(|m| m.get("content"))
        .and_then(Value::as_str)
        .ok_or_else(|| AgentError::InvalidResponse(format!("unexpected response structure: {body}")))?;

    let content = content.trim();
    if content.is_empty() {
        return Err(AgentError::InvalidResponse("empty completion".to_string()));
    }
    Ok(content.to_string())
}
