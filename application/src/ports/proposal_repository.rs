//! ProposalVersion repository port (spec.md §4.3)

use async_trait::async_trait;
use quorum_domain::{ProposalVersion, RunId};

pub use crate::ports::run_repository::RepositoryError;

#[async_trait]
pub trait ProposalRepository: Send + Sync {
    /// Exactly one per Run — invariant 3. Implementations must enforce the
    /// uniqueness and surface a conflict as [`RepositoryError::UniqueViolation`].
    async fn create(&self, version: &ProposalVersion) -> Result<(), RepositoryError>;

    async fn get(&self, run_id: RunId) -> Result<Option<ProposalVersion>, RepositoryError>;
}
