//! Workflow configuration
//!
//! Constructed once per process and handed to the controller; there is no
//! global registry. Values come from defaults, an optional TOML file and
//! `COUNCIL_*` environment overrides, in that order.

use std::path::Path;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::feedback::parser::DEFAULT_MAX_SCORE;
use crate::workflow::policy::{AcceptancePolicy, DEFAULT_QUORUM, DEFAULT_THRESHOLD};

/// Default cap on produce → review rounds
pub const DEFAULT_MAX_ITERATIONS: u32 = 2;

/// Errors from loading or validating configuration
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to parse config: {0}")]
    Toml(#[from] toml::de::Error),

    #[error("Invalid config: {0}")]
    Invalid(String),
}

/// Tuning knobs of one workflow deployment
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct WorkflowConfig {
    /// Maximum produce → review rounds (≥ 1)
    pub max_iterations: u32,
    /// Minimum score a reviewer must give to count as passing
    pub acceptance_threshold: f64,
    /// Passing reviewers required for acceptance
    pub quorum: usize,
    /// Upper bound scores are clamped to
    pub max_score: f64,
    /// Per-reviewer timeout; `None` waits indefinitely
    pub reviewer_timeout_secs: Option<f64>,
}

impl Default for WorkflowConfig {
    fn default() -> Self {
        Self {
            max_iterations: DEFAULT_MAX_ITERATIONS,
            acceptance_threshold: DEFAULT_THRESHOLD,
            quorum: DEFAULT_QUORUM,
            max_score: DEFAULT_MAX_SCORE,
            reviewer_timeout_secs: None,
        }
    }
}

impl WorkflowConfig {
    pub fn from_toml(text: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(text)?)
    }

    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let text = std::fs::read_to_string(path)?;
        Self::from_toml(&text)
    }

    /// Apply `COUNCIL_*` environment overrides. Unparseable values are ignored.
    pub fn apply_env_overrides(&mut self) {
        self.apply_overrides(|key| std::env::var(key).ok());
    }

    /// Apply overrides from an arbitrary key lookup.
    pub fn apply_overrides<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(n) = lookup("COUNCIL_MAX_ITERATIONS").and_then(|v| v.trim().parse().ok()) {
            self.max_iterations = n;
        }
        if let Some(t) = lookup("COUNCIL_ACCEPTANCE_THRESHOLD").and_then(|v| v.trim().parse().ok())
        {
            self.acceptance_threshold = t;
        }
        if let Some(q) = lookup("COUNCIL_QUORUM").and_then(|v| v.trim().parse().ok()) {
            self.quorum = q;
        }
        if let Some(s) =
            lookup("COUNCIL_REVIEWER_TIMEOUT_SECS").and_then(|v| v.trim().parse::<f64>().ok())
        {
            self.reviewer_timeout_secs = Some(s);
        }
    }

    /// Check the config against a panel of `reviewer_count` reviewers.
    pub fn validate(&self, reviewer_count: usize) -> Result<(), ConfigError> {
        if reviewer_count == 0 {
            return Err(ConfigError::Invalid(
                "reviewer panel must not be empty".to_string(),
            ));
        }
        if self.max_iterations == 0 {
            return Err(ConfigError::Invalid(
                "max_iterations must be at least 1".to_string(),
            ));
        }
        if !(self.max_score.is_finite() && self.max_score > 0.0) {
            return Err(ConfigError::Invalid(format!(
                "max_score must be positive, got {}",
                self.max_score
            )));
        }
        if !(0.0..=self.max_score).contains(&self.acceptance_threshold) {
            return Err(ConfigError::Invalid(format!(
                "acceptance_threshold {} outside [0, {}]",
                self.acceptance_threshold, self.max_score
            )));
        }
        if self.quorum == 0 || self.quorum > reviewer_count {
            return Err(ConfigError::Invalid(format!(
                "quorum {} must be between 1 and the reviewer count {}",
                self.quorum, reviewer_count
            )));
        }
        if let Some(secs) = self.reviewer_timeout_secs {
            if !(secs.is_finite() && secs > 0.0) {
                return Err(ConfigError::Invalid(format!(
                    "reviewer_timeout_secs must be positive, got {}",
                    secs
                )));
            }
            if Duration::try_from_secs_f64(secs).is_err() {
                return Err(ConfigError::Invalid(format!(
                    "reviewer_timeout_secs {} is too large",
                    secs
                )));
            }
        }
        Ok(())
    }

    pub fn policy(&self) -> AcceptancePolicy {
        AcceptancePolicy::new(self.acceptance_threshold, self.quorum)
    }

    /// Per-reviewer timeout; values `validate` rejects map to `None`.
    pub fn reviewer_timeout(&self) -> Option<Duration> {
        self.reviewer_timeout_secs
            .and_then(|secs| Duration::try_from_secs_f64(secs).ok())
            .filter(|timeout| !timeout.is_zero())
    }
}
