//! Agent configuration: endpoint, models and the reviewer panel.
//!
//! One explicit value built at startup and passed to the capability
//! factories. Nothing here is global.

use std::path::Path;

use coordination::{AgentError, ConfigError, FeedbackCategory, ReviewerSlot, WorkflowConfig};
use serde::{Deserialize, Serialize};

use crate::prompts::Persona;

/// OpenRouter, the default OpenAI-compatible gateway.
pub const DEFAULT_API_BASE: &str = "https://openrouter.ai/api/v1";

/// Environment variable holding the API key by default.
pub const DEFAULT_API_KEY_ENV: &str = "OPENROUTER_API_KEY";

/// A model binding for one agent role.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModelEntry {
    pub model: String,
    #[serde(default)]
    pub description: String,
}

/// One council seat.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReviewerEntry {
    /// Display label, e.g. "Dr. Sarah Chen (Methodology)".
    pub label: String,
    /// Feedback category the reviewer's notes are filed under.
    pub category: String,
    /// Priority item issued when this reviewer scores below threshold.
    pub critical_action: String,
    pub persona: Persona,
    pub model: String,
    #[serde(default)]
    pub description: String,
    /// Improvement section headers, in priority order.
    #[serde(default = "default_sections")]
    pub sections: Vec<String>,
    /// Replaces the persona's built-in system prompt.
    #[serde(default)]
    pub system_prompt: Option<String>,
}

fn default_sections() -> Vec<String> {
    vec![coordination::council::AREAS_FOR_IMPROVEMENT.to_string()]
}

impl ReviewerEntry {
    pub fn system_prompt(&self) -> String {
        self.system_prompt
            .clone()
            .unwrap_or_else(|| self.persona.system_prompt())
    }
}

/// Top-level agents configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AgentsConfig {
    /// Base URL of an OpenAI-compatible API (without `/chat/completions`).
    pub api_base: String,
    /// Environment variable the API key is read from.
    pub api_key_env: String,
    pub request_timeout_secs: u64,
    pub temperature: f32,
    pub max_tokens: Option<u32>,
    pub researcher: ModelEntry,
    pub reviewers: Vec<ReviewerEntry>,
    pub workflow: WorkflowConfig,
}

impl Default for AgentsConfig {
    fn default() -> Self {
        let slots = ReviewerSlot::default_panel();
        let seats = [
            (
                Persona::Methodology,
                "anthropic/claude-3.7-sonnet",
                "Analytical assessment of sources and evidence",
            ),
            (
                Persona::Comprehensiveness,
                "google/gemini-2.0-flash-thinking-exp-01-21",
                "Holistic coverage assessment",
            ),
            (
                Persona::Clarity,
                "openai/gpt-4.1-turbo",
                "Communication and presentation assessment",
            ),
        ];
        let reviewers = slots
            .into_iter()
            .zip(seats)
            .map(|(slot, (persona, model, description))| ReviewerEntry {
                label: slot.label,
                category: slot.category.name,
                critical_action: slot.category.critical_action,
                persona,
                model: model.to_string(),
                description: description.to_string(),
                sections: slot.category.section_headers,
                system_prompt: None,
            })
            .collect();

        Self {
            api_base: DEFAULT_API_BASE.to_string(),
            api_key_env: DEFAULT_API_KEY_ENV.to_string(),
            request_timeout_secs: 300,
            temperature: 0.3,
            max_tokens: None,
            researcher: ModelEntry {
                model: "google/gemini-2.0-flash-thinking-exp-01-21".to_string(),
                description: "Research and report writing".to_string(),
            },
            reviewers,
            workflow: WorkflowConfig::default(),
        }
    }
}

impl AgentsConfig {
    pub fn from_toml(text: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(text)?)
    }

    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let text = std::fs::read_to_string(path)?;
        Self::from_toml(&text)
    }

    /// Apply `COUNCIL_*` environment overrides, including the workflow's.
    pub fn apply_env_overrides(&mut self) {
        if let Ok(base) = std::env::var("COUNCIL_API_BASE") {
            self.api_base = base;
        }
        if let Ok(model) = std::env::var("COUNCIL_RESEARCHER_MODEL") {
            self.researcher.model = model;
        }
        self.workflow.apply_env_overrides();
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.api_base.trim().is_empty() {
            return Err(ConfigError::Invalid("api_base must not be empty".to_string()));
        }
        if self.researcher.model.trim().is_empty() {
            return Err(ConfigError::Invalid(
                "researcher model must not be empty".to_string(),
            ));
        }
        for entry in &self.reviewers {
            if entry.model.trim().is_empty() {
                return Err(ConfigError::Invalid(format!(
                    "reviewer '{}' has no model",
                    entry.label
                )));
            }
            if entry.sections.is_empty() {
                return Err(ConfigError::Invalid(format!(
                    "reviewer '{}' reads no improvement section",
                    entry.label
                )));
            }
        }
        self.workflow.validate(self.reviewers.len())
    }

    /// Reviewer identities in panel order.
    pub fn panel_slots(&self) -> Vec<ReviewerSlot> {
        self.reviewers
            .iter()
            .enumerate()
            .map(|(idx, entry)| {
                ReviewerSlot::new(
                    idx,
                    &entry.label,
                    FeedbackCategory {
                        name: entry.category.clone(),
                        critical_action: entry.critical_action.clone(),
                        section_headers: entry.sections.clone(),
                    },
                )
            })
            .collect()
    }

    /// Read the API key from `api_key_env`.
    pub fn resolve_api_key(&self) -> Result<String, AgentError> {
        self.api_key_from(|key| std::env::var(key).ok())
    }

    /// Read the API key through an arbitrary lookup.
    pub fn api_key_from<F>(&self, lookup: F) -> Result<String, AgentError>
    where
        F: Fn(&str) -> Option<String>,
    {
        lookup(&self.api_key_env)
            .map(|key| key.trim().to_string())
            .filter(|key| !key.is_empty())
            .ok_or_else(|| AgentError::MissingApiKey(self.api_key_env.clone()))
    }
}
