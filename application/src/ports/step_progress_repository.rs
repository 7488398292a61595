//! StepProgress repository port (spec.md §4.3)

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use quorum_domain::{RunId, StepName, StepStatus};

pub use crate::ports::run_repository::RepositoryError;

pub struct StepProgressUpsert {
    pub run_id: RunId,
    pub step_name: StepName,
    pub status: StepStatus,
    pub started_at: Option<DateTime<Utc>>,
    pub completed_at: Option<DateTime<Utc>>,
    pub error_message: Option<String>,
}

#[async_trait]
pub trait StepProgressRepository: Send + Sync {
    /// Insert the seven `pending` rows for a fresh Run (spec.md §4.8).
    async fn seed(&self, run_id: RunId) -> Result<(), RepositoryError>;

    /// Idempotent insert-or-update on `(run_id, step_name)`. Unknown step
    /// names are rejected by the domain layer before this is ever called.
    async fn upsert(&self, row: StepProgressUpsert) -> Result<(), RepositoryError>;

    async fn get(
        &self,
        run_id: RunId,
        step_name: StepName,
    ) -> Result<Option<quorum_domain::StepProgress>, RepositoryError>;

    async fn list_for_run(
        &self,
        run_id: RunId,
    ) -> Result<Vec<quorum_domain::StepProgress>, RepositoryError>;
}
