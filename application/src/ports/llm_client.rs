//! LLM client port (spec.md §4.2)

use async_trait::async_trait;
use quorum_domain::StepName;
use serde::Serialize;
use thiserror::Error;

use crate::ports::schema_validator::SchemaValidationError;

/// The system+user halves of a structured-output prompt.
#[derive(Debug, Clone)]
pub struct ProducePayload {
    pub system: String,
    pub user: String,
}

/// One call to the LLM client: produce a structurally-valid instance of a
/// named response type.
#[derive(Debug, Clone)]
pub struct ProduceRequest {
    pub payload: ProducePayload,
    pub schema_name: String,
    pub schema_version: String,
    pub step_name: StepName,
    pub persona_id: Option<String>,
    pub model: String,
    pub temperature: f64,
    pub max_retries: u32,
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct TokenUsage {
    pub input_tokens: u32,
    pub output_tokens: u32,
}

#[derive(Debug, Clone, Serialize)]
pub struct ProduceMetadata {
    pub request_id: String,
    pub model: String,
    pub temperature: f64,
    pub latency_ms: u64,
    pub attempt_count: u32,
    pub finish_reason: String,
    pub token_usage: TokenUsage,
    pub status: String,
}

#[derive(Debug, Clone)]
pub struct ProducedOutput {
    pub value: serde_json::Value,
    pub metadata: ProduceMetadata,
}

/// Error taxonomy mapped from the underlying provider API (spec.md §4.2).
#[derive(Error, Debug)]
pub enum LlmClientError {
    #[error("LLM auth error: {0}")]
    Auth(String),
    #[error("LLM rate limited: {0}")]
    RateLimit(String),
    #[error("LLM call timed out after {0}s")]
    Timeout(u64),
    #[error("LLM connection error: {0}")]
    Connection(String),
    #[error("LLM service error: {0}")]
    Service(String),
    #[error(transparent)]
    SchemaValidation(#[from] SchemaValidationError),
}

impl LlmClientError {
    /// Whether this class of error is retryable per spec.md §4.2's taxonomy.
    /// `Service` is retryable only if the wrapped provider classification
    /// said so — adapters construct `Service` only for non-retryable cases
    /// and use `RateLimit`/`Timeout`/`Connection` for retryable ones.
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            LlmClientError::RateLimit(_) | LlmClientError::Timeout(_) | LlmClientError::Connection(_)
        )
    }
}

/// Exposes one operation: produce a structurally-valid instance of a named
/// response type given a prompt payload. Bounded retry with exponential
/// backoff is internal to the adapter; `attempt_count` is always recorded.
#[async_trait]
pub trait LlmClient: Send + Sync {
    async fn produce(&self, request: ProduceRequest) -> Result<ProducedOutput, LlmClientError>;
}
