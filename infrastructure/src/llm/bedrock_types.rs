//! JSON <-> AWS Smithy `Document` conversions and Bedrock error mapping.
//!
//! Grounded in the Bedrock Converse adapter's own conversions; the error
//! taxonomy here is the one [`quorum_application::ports::llm_client::LlmClientError`]
//! defines rather than the teacher's `GatewayError`.

use aws_sdk_bedrockruntime::error::SdkError;
use aws_sdk_bedrockruntime::operation::converse::ConverseError;
use aws_smithy_types::Document;
use quorum_application::ports::llm_client::LlmClientError;

pub fn json_to_document(value: &serde_json::Value) -> Document {
    match value {
        serde_json::Value::Null => Document::Null,
        serde_json::Value::Bool(b) => Document::Bool(*b),
        serde_json::Value::Number(n) => {
            if let Some(i) = n.as_i64() {
                Document::Number(aws_smithy_types::Number::NegInt(i))
            } else if let Some(f) = n.as_f64() {
                Document::Number(aws_smithy_types::Number::Float(f))
            } else {
                Document::Null
            }
        }
        serde_json::Value::String(s) => Document::String(s.clone()),
        serde_json::Value::Array(arr) => Document::Array(arr.iter().map(json_to_document).collect()),
        serde_json::Value::Object(map) => {
            Document::Object(map.iter().map(|(k, v)| (k.clone(), json_to_document(v))).collect())
        }
    }
}

pub fn document_to_json(doc: &Document) -> serde_json::Value {
    match doc {
        Document::Null => serde_json::Value::Null,
        Document::Bool(b) => serde_json::Value::Bool(*b),
        Document::Number(n) => match n {
            aws_smithy_types::Number::PosInt(i) => serde_json::json!(*i),
            aws_smithy_types::Number::NegInt(i) => serde_json::json!(*i),
            aws_smithy_types::Number::Float(f) => {
                serde_json::Number::from_f64(*f).map(serde_json::Value::Number).unwrap_or(serde_json::Value::Null)
            }
        },
        Document::String(s) => serde_json::Value::String(s.clone()),
        Document::Array(arr) => serde_json::Value::Array(arr.iter().map(document_to_json).collect()),
        Document::Object(map) => {
            serde_json::Value::Object(map.iter().map(|(k, v)| (k.clone(), document_to_json(v))).collect())
        }
    }
}

/// Maps a Bedrock Converse SDK error onto the taxonomy the pipeline's retry
/// loop understands. `ValidationException` is treated as non-retryable
/// service misconfiguration (bad request shape), not a transient failure.
pub fn convert_converse_error(err: &SdkError<ConverseError>) -> LlmClientError {
    match err {
        SdkError::ServiceError(service_err) => match service_err.err() {
            ConverseError::ThrottlingException(e) => LlmClientError::RateLimit(e.to_string()),
            ConverseError::ModelTimeoutException(e) => {
                let _ = e;
                LlmClientError::Timeout(0)
            }
            ConverseError::ModelNotReadyException(e) => LlmClientError::Service(e.to_string()),
            ConverseError::ValidationException(e) => LlmClientError::Service(e.to_string()),
            ConverseError::AccessDeniedException(e) => LlmClientError::Auth(e.to_string()),
            other => LlmClientError::Service(format!("{other:?}")),
        },
        SdkError::TimeoutError(_) => LlmClientError::Timeout(0),
        SdkError::DispatchFailure(e) => LlmClientError::Connection(format!("{e:?}")),
        other => LlmClientError::Connection(format!("{other}")),
    }
}
