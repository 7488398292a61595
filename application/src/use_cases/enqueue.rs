//! Enqueue service (spec.md §4.8): the two synchronous-from-the-caller's-
//! perspective entrypoints that create a Run, seed its StepProgress rows,
//! and publish a job envelope.

use std::sync::Arc;

use chrono::Utc;
use quorum_domain::{
    validate_extra_context, validate_idea, DomainError, Run, RunId, RunParameters, RunStatus,
    RunType,
};
use thiserror::Error;

use crate::config::{LlmConfig, VersioningConfig};
use crate::ports::job_broker::{BrokerError, JobBroker, JobEnvelope};
use crate::ports::proposal_repository::ProposalRepository;
use crate::ports::run_repository::{RepositoryError, RunRepository};
use crate::ports::step_progress_repository::StepProgressRepository;

#[derive(Error, Debug)]
pub enum EnqueueError {
    #[error(transparent)]
    Validation(#[from] DomainError),
    #[error("parent run {0} not found")]
    ParentNotFound(RunId),
    #[error("parent run {0} is not completed")]
    ParentNotCompleted(RunId),
    #[error("revision requested with neither edited_proposal nor edit_notes")]
    MissingEditInputs,
    #[error(transparent)]
    Repository(#[from] RepositoryError),
    #[error(transparent)]
    Broker(#[from] BrokerError),
}

/// `JobEnqueued`-shaped response (spec.md §6), returned for both enqueue
/// flavors.
#[derive(Debug, Clone, serde::Serialize)]
pub struct EnqueuedRun {
    pub run_id: RunId,
    pub status: RunStatus,
    pub queued_at: chrono::DateTime<Utc>,
    pub priority: quorum_domain::Priority,
    pub run_type: RunType,
}

impl From<&Run> for EnqueuedRun {
    fn from(run: &Run) -> Self {
        Self {
            run_id: run.id,
            status: run.status,
            queued_at: run.queued_at.unwrap_or(run.created_at),
            priority: run.priority,
            run_type: run.run_type,
        }
    }
}

pub struct EnqueueService {
    run_repo: Arc<dyn RunRepository>,
    proposal_repo: Arc<dyn ProposalRepository>,
    step_repo: Arc<dyn StepProgressRepository>,
    broker: Arc<dyn JobBroker>,
}

impl EnqueueService {
    pub fn new(
        run_repo: Arc<dyn RunRepository>,
        proposal_repo: Arc<dyn ProposalRepository>,
        step_repo: Arc<dyn StepProgressRepository>,
        broker: Arc<dyn JobBroker>,
    ) -> Self {
        Self {
            run_repo,
            proposal_repo,
            step_repo,
            broker,
        }
    }

    pub async fn enqueue_initial(
        &self,
        raw_idea: &str,
        extra_context: Option<serde_json::Value>,
        llm: &LlmConfig,
        versioning: &VersioningConfig,
    ) -> Result<EnqueuedRun, EnqueueError> {
        let idea = validate_idea(raw_idea)?;
        if let Some(serde_json::Value::String(s)) = &extra_context {
            validate_extra_context(s)?;
        }

        let parameters = RunParameters {
            schema_version: versioning.schema_version.clone(),
            prompt_set_version: versioning.prompt_set_version.clone(),
            persona_template_version: versioning.persona_template_version.clone(),
            max_retries: llm.max_retries_per_persona,
        };

        let run = Run::new_initial(
            idea,
            extra_context,
            llm.expand_model().to_string(),
            llm.expand_temperature,
            parameters,
        );

        self.persist_and_publish(run).await
    }

    pub async fn enqueue_revision(
        &self,
        parent_run_id: RunId,
        edited_proposal: Option<serde_json::Value>,
        edit_notes: Option<String>,
        llm: &LlmConfig,
        versioning: &VersioningConfig,
    ) -> Result<EnqueuedRun, EnqueueError> {
        if edited_proposal.is_none() && edit_notes.is_none() {
            return Err(EnqueueError::MissingEditInputs);
        }

        let parent = self
            .run_repo
            .get(parent_run_id)
            .await?
            .ok_or(EnqueueError::ParentNotFound(parent_run_id))?;

        if parent.status != RunStatus::Completed {
            return Err(EnqueueError::ParentNotCompleted(parent_run_id));
        }

        let parent_proposal = self
            .proposal_repo
            .get(parent_run_id)
            .await?
            .ok_or(EnqueueError::ParentNotFound(parent_run_id))?;

        // The revision's "idea" is carried as the parent's raw idea; the edit
        // itself is planned and re-expanded inside the worker (§4.6), not here.
        let parameters = RunParameters {
            schema_version: versioning.schema_version.clone(),
            prompt_set_version: versioning.prompt_set_version.clone(),
            persona_template_version: versioning.persona_template_version.clone(),
            max_retries: llm.max_retries_per_persona,
        };

        let extra_context = build_revision_extra_context(edited_proposal, edit_notes);

        let run = Run::new_revision(
            parent_run_id,
            parent_proposal.raw_idea.clone(),
            Some(extra_context),
            llm.expand_model().to_string(),
            llm.expand_temperature,
            parameters,
        );

        self.persist_and_publish(run).await
    }

    async fn persist_and_publish(&self, run: Run) -> Result<EnqueuedRun, EnqueueError> {
        self.run_repo.create(&run).await?;
        self.step_repo.seed(run.id).await?;

        let envelope = JobEnvelope {
            run_id: run.id,
            run_type: run.run_type,
            parent_run_id: run.parent_run_id,
            priority: run.priority,
            enqueued_at: Utc::now(),
        };
        self.broker.publish(&envelope).await?;

        Ok(EnqueuedRun::from(&run))
    }
}

/// Bundles the edit inputs into a structured `extra_context` payload the
/// worker's revision planner reads back out of the Run (spec.md §3's
/// `extra_context` is "string or structured map").
fn build_revision_extra_context(
    edited_proposal: Option<serde_json::Value>,
    edit_notes: Option<String>,
) -> serde_json::Value {
    serde_json::json!({
        "edited_proposal": edited_proposal,
        "edit_notes": edit_notes,
    })
}
