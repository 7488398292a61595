//! Persona review use case: run one persona's review of an expanded proposal
//! (spec.md §4.2).

use std::sync::Arc;

use quorum_domain::{ExpandedProposal, Persona, PromptParameters, ReviewPayload, StepName};
use thiserror::Error;

use crate::ports::llm_client::{LlmClient, LlmClientError, ProduceRequest};
use crate::ports::schema_validator::{SchemaValidationError, SchemaValidator};
use crate::use_cases::prompts;

pub const PERSONA_REVIEW_SCHEMA: &str = "PersonaReview";
pub const SCHEMA_VERSION: &str = "1.0.0";

#[derive(Error, Debug)]
pub enum ReviewError {
    #[error(transparent)]
    Llm(#[from] LlmClientError),
    #[error(transparent)]
    Schema(#[from] SchemaValidationError),
    #[error("LLM returned a structurally valid but undeserializable review: {0}")]
    Malformed(#[from] serde_json::Error),
}

pub struct ExecutePersonaReviewUseCase {
    llm: Arc<dyn LlmClient>,
    validator: Arc<dyn SchemaValidator>,
}

pub struct ReviewOutcome {
    pub review: ReviewPayload,
    pub raw: serde_json::Value,
    pub prompt_parameters: PromptParameters,
}

impl ExecutePersonaReviewUseCase {
    pub fn new(llm: Arc<dyn LlmClient>, validator: Arc<dyn SchemaValidator>) -> Self {
        Self { llm, validator }
    }

    pub async fn execute(
        &self,
        persona: Persona,
        proposal: &ExpandedProposal,
        edit_notes: Option<&str>,
        model: &str,
        temperature: f64,
        persona_template_version: &str,
        max_retries: u32,
    ) -> Result<ReviewOutcome, ReviewError> {
        let payload = prompts::review_payload(persona, proposal, edit_notes);

        let request = ProduceRequest {
            payload,
            schema_name: PERSONA_REVIEW_SCHEMA.into(),
            schema_version: SCHEMA_VERSION.into(),
            step_name: StepName::from_str(persona.step_name())
                .expect("persona.step_name() always names a canonical step"),
            persona_id: Some(persona.id().to_string()),
            model: model.to_string(),
            temperature,
            max_retries,
        };

        let output = self.llm.produce(request).await?;

        self.validator.validate(
            PERSONA_REVIEW_SCHEMA,
            SCHEMA_VERSION,
            &output.value,
            Some(output.metadata.request_id.as_str()),
        )?;

        let review: ReviewPayload = serde_json::from_value(output.value.clone())?;

        Ok(ReviewOutcome {
            review,
            raw: output.value,
            prompt_parameters: PromptParameters {
                model: model.to_string(),
                temperature,
                persona_template_version: persona_template_version.to_string(),
                attempt_count: output.metadata.attempt_count,
            },
        })
    }
}
