//! Postgres-backed [`PersonaReviewRepository`] (spec.md §4.3).
//!
//! Uniqueness on `(run_id, persona)` is enforced by a database constraint;
//! a conflicting insert surfaces as [`RepositoryError::UniqueViolation`]
//! rather than silently overwriting the existing review (invariant 4).

use async_trait::async_trait;
use quorum_application::ports::persona_review_repository::PersonaReviewRepository;
use quorum_application::ports::run_repository::RepositoryError;
use quorum_domain::{Persona, PersonaReview, RunId};
use sqlx::postgres::PgPool;

use crate::db::models::{PersonaReviewInsert, PersonaReviewRow};
use crate::db::run_repository::map_sqlx_err;

const REVIEW_COLUMNS: &str = "run_id, persona, review, prompt_parameters, provenance, created_at";

pub struct PgPersonaReviewRepository {
    pool: PgPool,
}

impl PgPersonaReviewRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl PersonaReviewRepository for PgPersonaReviewRepository {
    async fn create(&self, review: &PersonaReview) -> Result<(), RepositoryError> {
        let insert = PersonaReviewInsert::from(review);
        sqlx::query(
            "INSERT INTO persona_reviews (run_id, persona, review, prompt_parameters, \
             provenance, created_at) VALUES ($1,$2,$3,$4,$5,$6)",
        )
        .bind(insert.run_id)
        .bind(insert.persona)
        .bind(insert.review)
        .bind(insert.prompt_parameters)
        .bind(insert.provenance)
        .bind(insert.created_at)
        .execute(&self.pool)
        .await
        .map_err(map_sqlx_err)?;
        Ok(())
    }

    async fn get(
        &self,
        run_id: RunId,
        persona: Persona,
    ) -> Result<Option<PersonaReview>, RepositoryError> {
        let row = sqlx::query_as::<_, PersonaReviewRow>(&format!(
            "SELECT {REVIEW_COLUMNS} FROM persona_reviews WHERE run_id = $1 AND persona = $2"
        ))
        .bind(run_id.inner())
        .bind(persona.id())
        .fetch_optional(&self.pool)
        .await
        .map_err(map_sqlx_err)?;
        row.map(PersonaReview::try_from).transpose()
    }

    async fn list_for_run(&self, run_id: RunId) -> Result<Vec<PersonaReview>, RepositoryError> {
        let rows = sqlx::query_as::<_, PersonaReviewRow>(&format!(
            "SELECT {REVIEW_COLUMNS} FROM persona_reviews WHERE run_id = $1 ORDER BY created_at ASC"
        ))
        .bind(run_id.inner())
        .fetch_all(&self.pool)
        .await
        .map_err(map_sqlx_err)?;
        rows.into_iter().map(PersonaReview::try_from).collect()
    }
}
