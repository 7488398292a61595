//! Application-level configuration (spec.md §6 "Configuration (environment)")
//!
//! Concrete values are sourced by the infrastructure layer's figment loader;
//! this module only defines the typed shape and the validation/defaulting
//! rules use cases depend on.

use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("{field} must be in [{min}, {max}], got {actual}")]
    OutOfRange {
        field: &'static str,
        min: f64,
        max: f64,
        actual: f64,
    },
}

/// Model/temperature/retry knobs for the `expand` and persona-review steps.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LlmConfig {
    pub llm_model: String,
    pub expand_model: Option<String>,
    pub review_model: Option<String>,
    pub expand_temperature: f64,
    pub review_temperature: f64,
    pub max_retries_per_persona: u32,
    pub retry_initial_backoff_seconds: f64,
    pub retry_backoff_multiplier: f64,
}

impl Default for LlmConfig {
    fn default() -> Self {
        Self {
            llm_model: "anthropic.claude-3-5-sonnet".into(),
            expand_model: None,
            review_model: None,
            expand_temperature: 0.7,
            review_temperature: 0.2,
            max_retries_per_persona: 3,
            retry_initial_backoff_seconds: 1.0,
            retry_backoff_multiplier: 2.0,
        }
    }
}

impl LlmConfig {
    pub fn expand_model(&self) -> &str {
        self.expand_model.as_deref().unwrap_or(&self.llm_model)
    }

    pub fn review_model(&self) -> &str {
        self.review_model.as_deref().unwrap_or(&self.llm_model)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        check_range(
            "EXPAND_TEMPERATURE",
            self.expand_temperature,
            0.0,
            1.0,
        )?;
        check_range("REVIEW_TEMPERATURE", self.review_temperature, 0.0, 1.0)?;
        check_range(
            "MAX_RETRIES_PER_PERSONA",
            self.max_retries_per_persona as f64,
            1.0,
            10.0,
        )?;
        check_range(
            "RETRY_INITIAL_BACKOFF_SECONDS",
            self.retry_initial_backoff_seconds,
            0.1,
            60.0,
        )?;
        check_range(
            "RETRY_BACKOFF_MULTIPLIER",
            self.retry_backoff_multiplier,
            1.0,
            10.0,
        )?;
        Ok(())
    }
}

/// Pipeline worker concurrency and timeout knobs.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WorkerConfig {
    pub max_concurrency: usize,
    pub ack_deadline_seconds: u64,
    pub step_timeout_seconds: u64,
    pub job_timeout_seconds: u64,
    pub shutdown_grace_seconds: u64,
    pub max_redeliveries: u32,
}

impl Default for WorkerConfig {
    fn default() -> Self {
        Self {
            max_concurrency: 10,
            ack_deadline_seconds: 600,
            step_timeout_seconds: 300,
            job_timeout_seconds: 3600,
            shutdown_grace_seconds: 30,
            max_redeliveries: 5,
        }
    }
}

impl WorkerConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        check_range("WORKER_MAX_CONCURRENCY", self.max_concurrency as f64, 1.0, 1000.0)?;
        check_range(
            "WORKER_ACK_DEADLINE_SECONDS",
            self.ack_deadline_seconds as f64,
            60.0,
            3600.0,
        )?;
        check_range(
            "WORKER_STEP_TIMEOUT_SECONDS",
            self.step_timeout_seconds as f64,
            10.0,
            1800.0,
        )?;
        check_range(
            "WORKER_JOB_TIMEOUT_SECONDS",
            self.job_timeout_seconds as f64,
            60.0,
            7200.0,
        )?;
        Ok(())
    }
}

/// Versioning/revision knobs carried on every artifact (spec.md §3 "parameters").
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VersioningConfig {
    pub schema_version: String,
    pub prompt_set_version: String,
    pub persona_template_version: String,
    pub rerun_confidence_threshold: f64,
}

impl Default for VersioningConfig {
    fn default() -> Self {
        Self {
            schema_version: "1.0.0".into(),
            prompt_set_version: "1".into(),
            persona_template_version: "1".into(),
            rerun_confidence_threshold: 0.70,
        }
    }
}

/// Database, broker, and LLM provider connection identifiers.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConnectionConfig {
    pub database_url: String,
    pub redis_url: String,
    pub broker_subscription: String,
    pub aws_region: String,
    pub aws_profile: Option<String>,
}

impl Default for ConnectionConfig {
    fn default() -> Self {
        Self {
            database_url: "postgres://localhost/quorum_review".into(),
            redis_url: "redis://localhost:6379".into(),
            broker_subscription: "quorum.runs".into(),
            aws_region: "us-east-1".into(),
            aws_profile: None,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct AppConfig {
    #[serde(flatten)]
    pub llm: LlmConfig,
    pub worker: WorkerConfig,
    pub versioning: VersioningConfig,
    pub connections: ConnectionConfig,
}

fn check_range(field: &'static str, actual: f64, min: f64, max: f64) -> Result<(), ConfigError> {
    if actual < min || actual > max {
        return Err(ConfigError::OutOfRange {
            field,
            min,
            max,
            actual,
        });
    }
    Ok(())
}

impl AppConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.llm.validate()?;
        self.worker.validate()?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_validates() {
        let worker = WorkerConfig::default();
        assert!(worker.validate().is_ok());
    }

    #[test]
    fn out_of_range_temperature_rejected() {
        let mut llm = LlmConfig::default();
        llm.review_temperature = 1.5;
        assert!(llm.validate().is_err());
    }

    #[test]
    fn expand_model_falls_back_to_default() {
        let llm = LlmConfig::default();
        assert_eq!(llm.expand_model(), llm.llm_model);
    }
}
