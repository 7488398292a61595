//! Pipeline worker (spec.md §4.7): drives one Run through `S_CANON` to a
//! terminal state, idempotent under redelivery.

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use quorum_domain::{
    Decision, Persona, PersonaReview, ProposalVersion, Run, RunType, StepName, StepStatus,
    PERSONAS,
};
use thiserror::Error;
use tracing::{info, warn};

use crate::config::{LlmConfig, VersioningConfig, WorkerConfig};
use crate::ports::decision_repository::DecisionRepository;
use crate::ports::job_broker::JobEnvelope;
use crate::ports::persona_review_repository::PersonaReviewRepository;
use crate::ports::proposal_repository::ProposalRepository;
use crate::ports::run_repository::{ClaimOutcome, RepositoryError, RunRepository};
use crate::ports::schema_validator::SchemaValidator;
use crate::ports::step_progress_repository::{StepProgressRepository, StepProgressUpsert};
use crate::use_cases::aggregate_decision;
use crate::use_cases::execute_persona_review::ExecutePersonaReviewUseCase;
use crate::use_cases::expand_proposal::ExpandProposalUseCase;
use crate::use_cases::revision_plan;

const DECISION_AGGREGATION_SCHEMA: &str = "DecisionAggregation";
const SCHEMA_VERSION: &str = "1.0.0";

#[derive(Error, Debug)]
pub enum WorkerError {
    #[error("run {0} referenced by envelope does not exist")]
    RunNotFound(quorum_domain::RunId),
    #[error(transparent)]
    Repository(#[from] RepositoryError),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PipelineOutcome {
    /// Run was already `completed`; the caller must ack without re-executing.
    IdempotentSkip,
    Completed,
    Failed(String),
}

struct StepFailure {
    step: StepName,
    message: String,
}

impl StepFailure {
    fn new(step: StepName, message: impl Into<String>) -> Self {
        Self {
            step,
            message: message.into(),
        }
    }
}

pub struct PipelineExecutor {
    run_repo: Arc<dyn RunRepository>,
    proposal_repo: Arc<dyn ProposalRepository>,
    review_repo: Arc<dyn PersonaReviewRepository>,
    decision_repo: Arc<dyn DecisionRepository>,
    step_repo: Arc<dyn StepProgressRepository>,
    expand_use_case: ExpandProposalUseCase,
    review_use_case: ExecutePersonaReviewUseCase,
    validator: Arc<dyn SchemaValidator>,
    llm: LlmConfig,
    versioning: VersioningConfig,
    worker: WorkerConfig,
}

impl PipelineExecutor {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        run_repo: Arc<dyn RunRepository>,
        proposal_repo: Arc<dyn ProposalRepository>,
        review_repo: Arc<dyn PersonaReviewRepository>,
        decision_repo: Arc<dyn DecisionRepository>,
        step_repo: Arc<dyn StepProgressRepository>,
        expand_use_case: ExpandProposalUseCase,
        review_use_case: ExecutePersonaReviewUseCase,
        validator: Arc<dyn SchemaValidator>,
        llm: LlmConfig,
        versioning: VersioningConfig,
        worker: WorkerConfig,
    ) -> Self {
        Self {
            run_repo,
            proposal_repo,
            review_repo,
            decision_repo,
            step_repo,
            expand_use_case,
            review_use_case,
            validator,
            llm,
            versioning,
            worker,
        }
    }

    /// Handle one delivered job envelope end to end. The caller (the broker
    /// adapter's message loop) is responsible for ack/nack based on the
    /// returned outcome — this method never talks to the broker directly.
    pub async fn handle_message(&self, envelope: &JobEnvelope) -> Result<PipelineOutcome, WorkerError> {
        let claim = self
            .run_repo
            .claim(envelope.run_id, self.worker.job_timeout_seconds)
            .await?;

        let run = match claim {
            ClaimOutcome::NotFound => return Err(WorkerError::RunNotFound(envelope.run_id)),
            ClaimOutcome::AlreadyCompleted(_) => {
                info!(run_id = %envelope.run_id, "idempotent_skip");
                return Ok(PipelineOutcome::IdempotentSkip);
            }
            ClaimOutcome::Claimed { run, retried } => {
                if retried {
                    info!(run_id = %envelope.run_id, retry_count = run.retry_count, "claimed run for retry");
                } else {
                    info!(run_id = %envelope.run_id, "claimed run");
                }
                run
            }
        };

        let job_timeout = Duration::from_secs(self.worker.job_timeout_seconds);
        match tokio::time::timeout(job_timeout, self.run_steps(&run)).await {
            Ok(Ok(())) => Ok(PipelineOutcome::Completed),
            Ok(Err(failure)) => {
                self.persist_step_failure(&run, &failure).await?;
                Ok(PipelineOutcome::Failed(failure.message))
            }
            Err(_) => {
                let message = format!(
                    "job timed out after {}s",
                    self.worker.job_timeout_seconds
                );
                warn!(run_id = %run.id, "{message}");
                self.run_repo.mark_failed(run.id, &message).await?;
                Ok(PipelineOutcome::Failed(message))
            }
        }
    }

    async fn run_steps(&self, run: &Run) -> Result<(), StepFailure> {
        self.do_expand(run).await?;
        for persona in PERSONAS {
            self.do_review(run, persona).await?;
        }
        self.do_aggregate(run).await?;
        Ok(())
    }

    async fn persist_step_failure(&self, run: &Run, failure: &StepFailure) -> Result<(), WorkerError> {
        self.step_repo
            .upsert(StepProgressUpsert {
                run_id: run.id,
                step_name: failure.step,
                status: StepStatus::Failed,
                started_at: None,
                completed_at: None,
                error_message: Some(failure.message.clone()),
            })
            .await?;
        self.run_repo.mark_failed(run.id, &failure.message).await?;
        Ok(())
    }

    async fn mark_step_running(&self, run: &Run, step: StepName) -> Result<(), StepFailure> {
        self.step_repo
            .upsert(StepProgressUpsert {
                run_id: run.id,
                step_name: step,
                status: StepStatus::Running,
                started_at: Some(chrono::Utc::now()),
                completed_at: None,
                error_message: None,
            })
            .await
            .map_err(|e| StepFailure::new(step, e.to_string()))
    }

    async fn mark_step_completed(&self, run: &Run, step: StepName) -> Result<(), StepFailure> {
        self.step_repo
            .upsert(StepProgressUpsert {
                run_id: run.id,
                step_name: step,
                status: StepStatus::Completed,
                started_at: None,
                completed_at: Some(chrono::Utc::now()),
                error_message: None,
            })
            .await
            .map_err(|e| StepFailure::new(step, e.to_string()))
    }

    async fn do_expand(&self, run: &Run) -> Result<(), StepFailure> {
        self.mark_step_running(run, StepName::Expand).await?;

        if self
            .proposal_repo
            .get(run.id)
            .await
            .map_err(|e| StepFailure::new(StepName::Expand, e.to_string()))?
            .is_some()
        {
            return self.mark_step_completed(run, StepName::Expand).await;
        }

        match run.run_type {
            RunType::Initial => self.do_initial_expand(run).await?,
            RunType::Revision => self.do_revision_expand(run).await?,
        }

        self.mark_step_completed(run, StepName::Expand).await
    }

    async fn do_initial_expand(&self, run: &Run) -> Result<(), StepFailure> {
        let outcome = timeout_step(
            StepName::Expand,
            self.worker.step_timeout_seconds,
            self.expand_use_case.expand_initial(
                &run.input_idea,
                run.extra_context.as_ref(),
                &run.model,
                run.temperature,
                run.parameters.max_retries,
            ),
        )
        .await?;

        let proposal = ProposalVersion::new_initial(
            run.id,
            outcome.expanded,
            run.input_idea.clone(),
            outcome.raw,
            run.parameters.persona_template_version.clone(),
        );

        self.proposal_repo
            .create(&proposal)
            .await
            .map_err(|e| StepFailure::new(StepName::Expand, e.to_string()))
    }

    async fn do_revision_expand(&self, run: &Run) -> Result<(), StepFailure> {
        let parent_run_id = run
            .parent_run_id
            .ok_or_else(|| StepFailure::new(StepName::Expand, "revision run has no parent_run_id"))?;

        let parent_proposal = self
            .proposal_repo
            .get(parent_run_id)
            .await
            .map_err(|e| StepFailure::new(StepName::Expand, e.to_string()))?
            .ok_or_else(|| StepFailure::new(StepName::Expand, "parent proposal missing"))?;

        let parent_reviews = self
            .review_repo
            .list_for_run(parent_run_id)
            .await
            .map_err(|e| StepFailure::new(StepName::Expand, e.to_string()))?;

        let (edited_proposal, edit_notes) = extract_edit_inputs(run.extra_context.as_ref());

        let outcome = timeout_step(
            StepName::Expand,
            self.worker.step_timeout_seconds,
            self.expand_use_case.expand_revision(
                &parent_proposal.expanded,
                edited_proposal.as_ref(),
                edit_notes.as_deref(),
                &run.model,
                run.temperature,
                run.parameters.max_retries,
            ),
        )
        .await?;

        let diff = quorum_domain::diff_proposals(&parent_proposal.expanded, &outcome.expanded);

        let proposal = ProposalVersion::new_revision(
            run.id,
            outcome.expanded,
            run.input_idea.clone(),
            outcome.raw,
            run.parameters.persona_template_version.clone(),
            diff.clone(),
            edit_notes.clone(),
        );

        self.proposal_repo
            .create(&proposal)
            .await
            .map_err(|e| StepFailure::new(StepName::Expand, e.to_string()))?;

        let (_rerun, reused) = revision_plan::plan_rerun(&diff, &parent_reviews);
        for parent_review in reused {
            self.copy_reused_review(run, parent_run_id, parent_review).await?;
        }

        Ok(())
    }

    async fn copy_reused_review(
        &self,
        run: &Run,
        parent_run_id: quorum_domain::RunId,
        parent_review: &PersonaReview,
    ) -> Result<(), StepFailure> {
        let already_present = self
            .review_repo
            .get(run.id, parent_review.persona)
            .await
            .map_err(|e| StepFailure::new(StepName::Expand, e.to_string()))?
            .is_some();
        if already_present {
            return Ok(());
        }

        let reused = PersonaReview::new(
            run.id,
            parent_review.persona,
            parent_review.review.clone(),
            parent_review.prompt_parameters.clone(),
        )
        .reused_from(parent_run_id);

        match self.review_repo.create(&reused).await {
            Ok(()) => Ok(()),
            Err(crate::ports::run_repository::RepositoryError::UniqueViolation(_)) => Ok(()),
            Err(e) => Err(StepFailure::new(StepName::Expand, e.to_string())),
        }
    }

    async fn do_review(&self, run: &Run, persona: Persona) -> Result<(), StepFailure> {
        let step = StepName::from_str(persona.step_name())
            .expect("persona.step_name() always names a canonical step");

        self.mark_step_running(run, step).await?;

        if self
            .review_repo
            .get(run.id, persona)
            .await
            .map_err(|e| StepFailure::new(step, e.to_string()))?
            .is_some()
        {
            return self.mark_step_completed(run, step).await;
        }

        let proposal = self
            .proposal_repo
            .get(run.id)
            .await
            .map_err(|e| StepFailure::new(step, e.to_string()))?
            .ok_or_else(|| StepFailure::new(step, "proposal missing for review step"))?;

        let review_model = self.llm.review_model().to_string();
        let review_temperature = self.llm.review_temperature;

        let outcome = timeout_step(
            step,
            self.worker.step_timeout_seconds,
            self.review_use_case.execute(
                persona,
                &proposal.expanded,
                proposal.edit_notes.as_deref(),
                &review_model,
                review_temperature,
                &self.versioning.persona_template_version,
                self.llm.max_retries_per_persona,
            ),
        )
        .await?;

        let review = PersonaReview::new(run.id, persona, outcome.review, outcome.prompt_parameters);

        match self.review_repo.create(&review).await {
            Ok(()) | Err(crate::ports::run_repository::RepositoryError::UniqueViolation(_)) => {}
            Err(e) => return Err(StepFailure::new(step, e.to_string())),
        }

        self.mark_step_completed(run, step).await
    }

    async fn do_aggregate(&self, run: &Run) -> Result<(), StepFailure> {
        self.mark_step_running(run, StepName::AggregateDecision).await?;

        if let Some(_decision) = self
            .decision_repo
            .get(run.id)
            .await
            .map_err(|e| StepFailure::new(StepName::AggregateDecision, e.to_string()))?
        {
            return self.mark_step_completed(run, StepName::AggregateDecision).await;
        }

        let reviews = self
            .review_repo
            .list_for_run(run.id)
            .await
            .map_err(|e| StepFailure::new(StepName::AggregateDecision, e.to_string()))?;

        if reviews.len() != PERSONAS.len() {
            return Err(StepFailure::new(
                StepName::AggregateDecision,
                format!("expected {} persona reviews, found {}", PERSONAS.len(), reviews.len()),
            ));
        }

        let decision_json = aggregate_decision::aggregate_reviews(run.id, &reviews)
            .map_err(|e| StepFailure::new(StepName::AggregateDecision, e.to_string()))?;

        let decision_value = serde_json::to_value(&decision_json)
            .map_err(|e| StepFailure::new(StepName::AggregateDecision, e.to_string()))?;
        self.validator
            .validate(DECISION_AGGREGATION_SCHEMA, SCHEMA_VERSION, &decision_value, None)
            .map_err(|e| StepFailure::new(StepName::AggregateDecision, e.to_string()))?;

        let decision: Decision =
            aggregate_decision::build_decision(run.id, decision_json.clone(), None);

        self.decision_repo
            .create(&decision)
            .await
            .map_err(|e| StepFailure::new(StepName::AggregateDecision, e.to_string()))?;

        self.run_repo
            .mark_completed(run.id, decision_json.weighted_confidence, decision_json.decision)
            .await
            .map_err(|e| StepFailure::new(StepName::AggregateDecision, e.to_string()))?;

        self.mark_step_completed(run, StepName::AggregateDecision).await
    }
}

async fn timeout_step<T, E, F>(step: StepName, seconds: u64, fut: F) -> Result<T, StepFailure>
where
    F: Future<Output = Result<T, E>>,
    E: std::fmt::Display,
{
    match tokio::time::timeout(Duration::from_secs(seconds), fut).await {
        Ok(Ok(value)) => Ok(value),
        Ok(Err(e)) => Err(StepFailure::new(step, e.to_string())),
        Err(_) => Err(StepFailure::new(step, format!("step timed out after {seconds}s"))),
    }
}

fn extract_edit_inputs(
    extra_context: Option<&serde_json::Value>,
) -> (Option<serde_json::Value>, Option<String>) {
    let Some(value) = extra_context else {
        return (None, None);
    };
    let edited_proposal = value.get("edited_proposal").cloned().filter(|v| !v.is_null());
    let edit_notes = value
        .get("edit_notes")
        .and_then(|v| v.as_str())
        .map(|s| s.to_string());
    (edited_proposal, edit_notes)
}
