//! Bedrock Converse-backed [`LlmClient`] adapter (spec.md §4.2).
//!
//! Every call forces the model into a single tool use so its output is
//! already JSON shaped to the registered schema before it ever reaches the
//! use-case layer's validation step. Retries are bounded and exponential,
//! grounded in the same Converse error taxonomy the teacher's Bedrock
//! session maps, but onto this system's own `LlmClientError` set.

use std::sync::Arc;
use std::time::{Duration, Instant};

use async_trait::async_trait;
use aws_sdk_bedrockruntime::types as bedrock;
use aws_sdk_bedrockruntime::Client as BedrockClient;
use quorum_application::ports::llm_client::{
    LlmClient, LlmClientError, ProduceMetadata, ProduceRequest, ProducedOutput, TokenUsage,
};
use tracing::{debug, warn};
use uuid::Uuid;

use crate::llm::bedrock_types::{convert_converse_error, document_to_json, json_to_document};
use crate::schema::SchemaRegistry;

const TOOL_NAME: &str = "emit_result";

pub struct BedrockLlmClient {
    client: BedrockClient,
    schemas: Arc<SchemaRegistry>,
    retry_initial_backoff_seconds: f64,
    retry_backoff_multiplier: f64,
}

impl BedrockLlmClient {
    pub async fn new(
        region: String,
        profile: Option<String>,
        schemas: Arc<SchemaRegistry>,
        retry_initial_backoff_seconds: f64,
        retry_backoff_multiplier: f64,
    ) -> Self {
        let mut loader = aws_config::defaults(aws_config::BehaviorVersion::latest())
            .region(aws_config::Region::new(region));
        if let Some(profile) = profile {
            loader = loader.profile_name(profile);
        }
        let config = loader.load().await;
        Self {
            client: BedrockClient::new(&config),
            schemas,
            retry_initial_backoff_seconds,
            retry_backoff_multiplier,
        }
    }

    fn tool_config(&self, schema_name: &str, schema_version: &str) -> Result<bedrock::ToolConfiguration, LlmClientError> {
        let raw_schema = self
            .schemas
            .raw_schema(schema_name, schema_version)
            .ok_or_else(|| LlmClientError::Service(format!("no schema registered for {schema_name}@{schema_version}")))?;

        let tool_spec = bedrock::ToolSpecification::builder()
            .name(TOOL_NAME)
            .description(format!("Emit a {schema_name} result matching the required JSON shape"))
            .input_schema(bedrock::ToolInputSchema::Json(json_to_document(raw_schema)))
            .build()
            .map_err(|e| LlmClientError::Service(format!("failed to build tool spec: {e}")))?;

        bedrock::ToolConfiguration::builder()
            .tools(bedrock::Tool::ToolSpec(tool_spec))
            .tool_choice(bedrock::ToolChoice::Tool(
                bedrock::SpecificToolChoice::builder()
                    .name(TOOL_NAME)
                    .build()
                    .map_err(|e| LlmClientError::Service(format!("failed to build tool choice: {e}")))?,
            ))
            .build()
            .map_err(|e| LlmClientError::Service(format!("failed to build tool config: {e}")))
    }

    /// `attempt` is the attempt that just failed; the sleep computed here
    /// precedes attempt `attempt + 1`. Delay before attempt k = initial *
    /// multiplier^(k-1), with attempt 1 unthrottled, so the sleep after a
    /// failed attempt `attempt` uses exponent `attempt`.
    fn backoff_for_attempt(&self, attempt: u32) -> Duration {
        let seconds =
            self.retry_initial_backoff_seconds * self.retry_backoff_multiplier.powi(attempt as i32);
        Duration::from_secs_f64(seconds.max(0.0))
    }

    async fn call_once(
        &self,
        request: &ProduceRequest,
        tool_config: &bedrock::ToolConfiguration,
    ) -> Result<(serde_json::Value, String, TokenUsage), LlmClientError> {
        let message = bedrock::Message::builder()
            .role(bedrock::ConversationRole::User)
            .content(bedrock::ContentBlock::Text(request.payload.user.clone()))
            .build()
            .map_err(|e| LlmClientError::Service(format!("failed to build message: {e}")))?;

        let response = self
            .client
            .converse()
            .model_id(&request.model)
            .system(bedrock::SystemContentBlock::Text(request.payload.system.clone()))
            .messages(message)
            .inference_config(
                bedrock::InferenceConfiguration::builder()
                    .temperature(request.temperature as f32)
                    .build(),
            )
            .tool_config(tool_config.clone())
            .send()
            .await
            .map_err(|e| convert_converse_error(&e))?;

        let finish_reason = format!("{:?}", response.stop_reason());

        let output = response
            .output()
            .ok_or_else(|| LlmClientError::Service("Bedrock Converse response carried no output".into()))?;

        let bedrock::ConverseOutput::Message(message) = output else {
            return Err(LlmClientError::Service("Bedrock Converse output was not a message".into()));
        };

        let tool_input = message
            .content()
            .iter()
            .find_map(|block| match block {
                bedrock::ContentBlock::ToolUse(tool_use) => Some(document_to_json(tool_use.input())),
                _ => None,
            })
            .ok_or_else(|| LlmClientError::Service("model did not emit the forced tool call".into()))?;

        let usage = response
            .usage()
            .map(|u| TokenUsage {
                input_tokens: u.input_tokens().max(0) as u32,
                output_tokens: u.output_tokens().max(0) as u32,
            })
            .unwrap_or_default();

        Ok((tool_input, finish_reason, usage))
    }
}

#[async_trait]
impl LlmClient for BedrockLlmClient {
    async fn produce(&self, request: ProduceRequest) -> Result<ProducedOutput, LlmClientError> {
        let request_id = Uuid::new_v4().to_string();
        let tool_config = self.tool_config(&request.schema_name, &request.schema_version)?;
        let started = Instant::now();

        let mut attempt: u32 = 0;
        loop {
            attempt += 1;
            match self.call_once(&request, &tool_config).await {
                Ok((value, finish_reason, token_usage)) => {
                    return Ok(ProducedOutput {
                        value,
                        metadata: ProduceMetadata {
                            request_id,
                            model: request.model.clone(),
                            temperature: request.temperature,
                            latency_ms: started.elapsed().as_millis() as u64,
                            attempt_count: attempt,
                            finish_reason,
                            token_usage,
                            status: "ok".into(),
                        },
                    });
                }
                Err(err) => {
                    let retryable = err.is_retryable();
                    let exhausted = attempt > request.max_retries;
                    if !retryable || exhausted {
                        warn!(
                            request_id = %request_id,
                            attempt,
                            step = %request.step_name.as_str(),
                            persona = ?request.persona_id,
                            error = %err,
                            "LLM call failed"
                        );
                        return Err(err);
                    }
                    let backoff = self.backoff_for_attempt(attempt);
                    debug!(
                        request_id = %request_id,
                        attempt,
                        backoff_ms = backoff.as_millis(),
                        "retrying LLM call after transient error"
                    );
                    tokio::time::sleep(backoff).await;
                }
            }
        }
    }
}
