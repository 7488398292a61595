//! Schema registry & validator port (spec.md §4.1)

use serde::Serialize;

#[derive(Debug, Clone, Serialize)]
pub struct FieldError {
    pub field: String,
    pub message: String,
    pub kind: String,
}

/// Carries field-level errors, the schema version checked against, and
/// request correlation context, as required by spec.md §4.1. Non-retryable
/// at the LLM-client layer.
#[derive(Debug, Clone, thiserror::Error, Serialize)]
#[error("schema validation failed for {schema_name}@{schema_version}: {field_errors:?}")]
pub struct SchemaValidationError {
    pub schema_name: String,
    pub schema_version: String,
    pub field_errors: Vec<FieldError>,
    pub request_id: Option<String>,
}

/// Validates a structured LLM response against a registered, versioned
/// schema. Every pipeline output passes through this before persistence; an
/// invalid output is never stored as a committed artifact.
pub trait SchemaValidator: Send + Sync {
    fn validate(
        &self,
        schema_name: &str,
        schema_version: &str,
        value: &serde_json::Value,
        request_id: Option<&str>,
    ) -> Result<(), SchemaValidationError>;
}
