//! Expand use case: turn a raw idea (or an edit against a parent proposal)
//! into a schema-validated [`ExpandedProposal`] (spec.md §4.2, §4.6 step 1).

use std::sync::Arc;

use quorum_domain::{ExpandedProposal, StepName};
use thiserror::Error;

use crate::ports::llm_client::{LlmClient, LlmClientError, ProduceRequest};
use crate::ports::schema_validator::{SchemaValidationError, SchemaValidator};
use crate::use_cases::prompts;

pub const EXPANDED_PROPOSAL_SCHEMA: &str = "ExpandedProposal";
pub const SCHEMA_VERSION: &str = "1.0.0";

#[derive(Error, Debug)]
pub enum ExpandError {
    #[error(transparent)]
    Llm(#[from] LlmClientError),
    #[error(transparent)]
    Schema(#[from] SchemaValidationError),
    #[error("LLM returned a structurally valid but undeserializable proposal: {0}")]
    Malformed(#[from] serde_json::Error),
}

pub struct ExpandProposalUseCase {
    llm: Arc<dyn LlmClient>,
    validator: Arc<dyn SchemaValidator>,
}

pub struct ExpandOutcome {
    pub expanded: ExpandedProposal,
    pub raw: serde_json::Value,
    pub attempt_count: u32,
}

impl ExpandProposalUseCase {
    pub fn new(llm: Arc<dyn LlmClient>, validator: Arc<dyn SchemaValidator>) -> Self {
        Self { llm, validator }
    }

    pub async fn expand_initial(
        &self,
        idea: &str,
        extra_context: Option<&serde_json::Value>,
        model: &str,
        temperature: f64,
        max_retries: u32,
    ) -> Result<ExpandOutcome, ExpandError> {
        let payload = prompts::expand_payload(idea, extra_context);
        self.produce_and_validate(payload, model, temperature, max_retries, None)
            .await
    }

    pub async fn expand_revision(
        &self,
        parent: &ExpandedProposal,
        edited_proposal: Option<&serde_json::Value>,
        edit_notes: Option<&str>,
        model: &str,
        temperature: f64,
        max_retries: u32,
    ) -> Result<ExpandOutcome, ExpandError> {
        let payload = prompts::revision_expand_payload(parent, edited_proposal, edit_notes);
        self.produce_and_validate(payload, model, temperature, max_retries, None)
            .await
    }

    async fn produce_and_validate(
        &self,
        payload: crate::ports::llm_client::ProducePayload,
        model: &str,
        temperature: f64,
        max_retries: u32,
        request_id: Option<&str>,
    ) -> Result<ExpandOutcome, ExpandError> {
        let request = ProduceRequest {
            payload,
            schema_name: EXPANDED_PROPOSAL_SCHEMA.into(),
            schema_version: SCHEMA_VERSION.into(),
            step_name: StepName::Expand,
            persona_id: None,
            model: model.to_string(),
            temperature,
            max_retries,
        };

        let output = self.llm.produce(request).await?;

        self.validator.validate(
            EXPANDED_PROPOSAL_SCHEMA,
            SCHEMA_VERSION,
            &output.value,
            request_id.or(Some(output.metadata.request_id.as_str())),
        )?;

        let expanded: ExpandedProposal = serde_json::from_value(output.value.clone())?;

        Ok(ExpandOutcome {
            expanded,
            raw: output.value,
            attempt_count: output.metadata.attempt_count,
        })
    }
}
