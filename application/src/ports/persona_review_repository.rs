//! PersonaReview repository port (spec.md §4.3)

use async_trait::async_trait;
use quorum_domain::{Persona, PersonaReview, RunId};

pub use crate::ports::run_repository::RepositoryError;

#[async_trait]
pub trait PersonaReviewRepository: Send + Sync {
    /// Must fail cleanly with [`RepositoryError::UniqueViolation`] on a
    /// `(run_id, persona_id)` conflict rather than overwrite — invariant 4.
    async fn create(&self, review: &PersonaReview) -> Result<(), RepositoryError>;

    async fn get(
        &self,
        run_id: RunId,
        persona: Persona,
    ) -> Result<Option<PersonaReview>, RepositoryError>;

    async fn list_for_run(&self, run_id: RunId) -> Result<Vec<PersonaReview>, RepositoryError>;
}
