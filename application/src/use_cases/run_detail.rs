//! `GET /v1/runs/{run_id}` use case (spec.md §6): run + proposal + reviews
//! summary + decision + step_progress.

use std::sync::Arc;

use quorum_domain::{Decision, PersonaReview, ProposalVersion, Run, RunId, StepProgress};
use thiserror::Error;

use crate::ports::decision_repository::DecisionRepository;
use crate::ports::persona_review_repository::PersonaReviewRepository;
use crate::ports::proposal_repository::ProposalRepository;
use crate::ports::run_repository::{RepositoryError, RunRepository};
use crate::ports::step_progress_repository::StepProgressRepository;

#[derive(Error, Debug)]
pub enum RunDetailError {
    #[error("run {0} not found")]
    NotFound(RunId),
    #[error(transparent)]
    Repository(#[from] RepositoryError),
}

#[derive(Debug, Clone, serde::Serialize)]
pub struct RunDetail {
    pub run: Run,
    pub proposal: Option<ProposalVersion>,
    pub reviews: Vec<PersonaReview>,
    pub decision: Option<Decision>,
    pub step_progress: Vec<StepProgress>,
}

pub struct GetRunDetailUseCase {
    run_repo: Arc<dyn RunRepository>,
    proposal_repo: Arc<dyn ProposalRepository>,
    review_repo: Arc<dyn PersonaReviewRepository>,
    decision_repo: Arc<dyn DecisionRepository>,
    step_repo: Arc<dyn StepProgressRepository>,
}

impl GetRunDetailUseCase {
    pub fn new(
        run_repo: Arc<dyn RunRepository>,
        proposal_repo: Arc<dyn ProposalRepository>,
        review_repo: Arc<dyn PersonaReviewRepository>,
        decision_repo: Arc<dyn DecisionRepository>,
        step_repo: Arc<dyn StepProgressRepository>,
    ) -> Self {
        Self {
            run_repo,
            proposal_repo,
            review_repo,
            decision_repo,
            step_repo,
        }
    }

    pub async fn execute(&self, run_id: RunId) -> Result<RunDetail, RunDetailError> {
        let run = self
            .run_repo
            .get(run_id)
            .await?
            .ok_or(RunDetailError::NotFound(run_id))?;

        let proposal = self.proposal_repo.get(run_id).await?;
        let reviews = self.review_repo.list_for_run(run_id).await?;
        let decision = self.decision_repo.get(run_id).await?;
        let step_progress = self.step_repo.list_for_run(run_id).await?;

        Ok(RunDetail {
            run,
            proposal,
            reviews,
            decision,
            step_progress,
        })
    }
}
