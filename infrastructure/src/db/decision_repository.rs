//! Postgres-backed [`DecisionRepository`] (spec.md §4.3).
//!
//! Exactly one row per Run, written once by the `aggregate_decision` step in
//! the same transaction semantics as [`super::run_repository::PgRunRepository::mark_completed`]
//! (invariant 5: `Decision` exists iff `Run.status = completed`).

use async_trait::async_trait;
use quorum_application::ports::decision_repository::DecisionRepository;
use quorum_application::ports::run_repository::RepositoryError;
use quorum_domain::{Decision, RunId};
use sqlx::postgres::PgPool;

use crate::db::models::{DecisionInsert, DecisionRow};
use crate::db::run_repository::map_sqlx_err;

const DECISION_COLUMNS: &str = "run_id, decision, decision_notes";

pub struct PgDecisionRepository {
    pool: PgPool,
}

impl PgDecisionRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl DecisionRepository for PgDecisionRepository {
    async fn create(&self, decision: &Decision) -> Result<(), RepositoryError> {
        let insert = DecisionInsert::from(decision);
        sqlx::query(
            "INSERT INTO decisions (run_id, decision, decision_notes) VALUES ($1,$2,$3)",
        )
        .bind(insert.run_id)
        .bind(insert.decision)
        .bind(insert.decision_notes)
        .execute(&self.pool)
        .await
        .map_err(map_sqlx_err)?;
        Ok(())
    }

    async fn get(&self, run_id: RunId) -> Result<Option<Decision>, RepositoryError> {
        let row = sqlx::query_as::<_, DecisionRow>(&format!(
            "SELECT {DECISION_COLUMNS} FROM decisions WHERE run_id = $1"
        ))
        .bind(run_id.inner())
        .fetch_optional(&self.pool)
        .await
        .map_err(map_sqlx_err)?;
        row.map(Decision::try_from).transpose()
    }
}
