//! `GET /v1/runs/{run_id}/diff/{other_run_id}` use case (spec.md §6):
//! structured diff from stored JSON only — no LLM re-invocation.

use std::sync::Arc;

use quorum_domain::{diff_proposals, ProposalDiff, RunId};
use thiserror::Error;

use crate::ports::proposal_repository::ProposalRepository;
use crate::ports::run_repository::RepositoryError;

#[derive(Error, Debug)]
pub enum DiffRunsError {
    #[error("run {0} not found")]
    NotFound(RunId),
    #[error("runs are identical")]
    IdenticalRuns,
    #[error(transparent)]
    Repository(#[from] RepositoryError),
}

pub struct DiffRunsUseCase {
    proposal_repo: Arc<dyn ProposalRepository>,
}

impl DiffRunsUseCase {
    pub fn new(proposal_repo: Arc<dyn ProposalRepository>) -> Self {
        Self { proposal_repo }
    }

    pub async fn execute(
        &self,
        run_id: RunId,
        other_run_id: RunId,
    ) -> Result<ProposalDiff, DiffRunsError> {
        if run_id == other_run_id {
            return Err(DiffRunsError::IdenticalRuns);
        }

        let a = self
            .proposal_repo
            .get(run_id)
            .await?
            .ok_or(DiffRunsError::NotFound(run_id))?;
        let b = self
            .proposal_repo
            .get(other_run_id)
            .await?
            .ok_or(DiffRunsError::NotFound(other_run_id))?;

        Ok(diff_proposals(&a.expanded, &b.expanded))
    }
}
