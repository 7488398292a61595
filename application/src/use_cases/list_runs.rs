//! `GET /v1/runs` use case (spec.md §6): filtered, paginated run listing.

use std::sync::Arc;

use quorum_domain::Run;
use thiserror::Error;

use crate::ports::run_repository::{RepositoryError, RunListFilter, RunRepository};

pub const MAX_LIMIT: u32 = 100;

#[derive(Error, Debug)]
pub enum ListRunsError {
    #[error("limit must be <= {MAX_LIMIT}, got {0}")]
    LimitTooLarge(u32),
    #[error(transparent)]
    Repository(#[from] RepositoryError),
}

pub struct ListRunsUseCase {
    run_repo: Arc<dyn RunRepository>,
}

impl ListRunsUseCase {
    pub fn new(run_repo: Arc<dyn RunRepository>) -> Self {
        Self { run_repo }
    }

    pub async fn execute(
        &self,
        filter: RunListFilter,
        limit: u32,
        offset: u32,
    ) -> Result<Vec<Run>, ListRunsError> {
        if limit > MAX_LIMIT {
            return Err(ListRunsError::LimitTooLarge(limit));
        }
        Ok(self.run_repo.list(&filter, limit, offset).await?)
    }
}
