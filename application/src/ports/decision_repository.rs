//! Decision repository port (spec.md §4.3)

use async_trait::async_trait;
use quorum_domain::{Decision, RunId};

pub use crate::ports::run_repository::RepositoryError;

#[async_trait]
pub trait DecisionRepository: Send + Sync {
    /// Exactly one per Run, present iff `Run.status == completed` — invariant 5.
    async fn create(&self, decision: &Decision) -> Result<(), RepositoryError>;

    async fn get(&self, run_id: RunId) -> Result<Option<Decision>, RepositoryError>;
}
