//! Run repository port (spec.md §4.3)

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use quorum_domain::{DecisionLabel, Run, RunId, RunType};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum RepositoryError {
    #[error("not found")]
    NotFound,
    #[error("unique constraint violated: {0}")]
    UniqueViolation(String),
    #[error("connection error: {0}")]
    Connection(String),
    #[error("repository error: {0}")]
    Other(String),
}

/// Result of a claim attempt against a Run's row lock (spec.md §4.7 "Claim protocol").
#[derive(Debug, Clone)]
pub enum ClaimOutcome {
    /// Run is already `completed`; the caller must ack without re-executing.
    AlreadyCompleted(Run),
    /// Run was successfully transitioned into `running` and is now owned by
    /// this worker. `retried` is true when this claim incremented `retry_count`
    /// (a `failed -> queued -> running` transition).
    Claimed { run: Run, retried: bool },
    /// The run does not exist at all — a malformed or stale envelope.
    NotFound,
}

#[derive(Debug, Clone, Default)]
pub struct RunListFilter {
    pub status: Option<quorum_domain::RunStatus>,
    pub run_type: Option<RunType>,
    pub parent_run_id: Option<RunId>,
    pub decision: Option<DecisionLabel>,
    pub min_confidence: Option<f64>,
    pub created_after: Option<DateTime<Utc>>,
    pub created_before: Option<DateTime<Utc>>,
}

/// Repository over the Run aggregate. All mutations are commit-on-success or
/// roll-back-and-record-failure — callers never observe a half-committed Run.
#[async_trait]
pub trait RunRepository: Send + Sync {
    async fn create(&self, run: &Run) -> Result<(), RepositoryError>;

    /// Atomically claim a Run for processing: row-locks it, applies the
    /// `queued -> running`, stale-`running` reclaim, or `failed -> queued ->
    /// running` retry transition, and returns the outcome — all within one
    /// transaction so concurrent workers racing on the same `run_id` never
    /// both believe they own it.
    async fn claim(
        &self,
        run_id: RunId,
        job_timeout_seconds: u64,
    ) -> Result<ClaimOutcome, RepositoryError>;

    async fn mark_completed(
        &self,
        run_id: RunId,
        overall_weighted_confidence: f64,
        decision_label: DecisionLabel,
    ) -> Result<(), RepositoryError>;

    async fn mark_failed(&self, run_id: RunId, error_message: &str) -> Result<(), RepositoryError>;

    async fn get(&self, run_id: RunId) -> Result<Option<Run>, RepositoryError>;

    async fn list(
        &self,
        filter: &RunListFilter,
        limit: u32,
        offset: u32,
    ) -> Result<Vec<Run>, RepositoryError>;
}
