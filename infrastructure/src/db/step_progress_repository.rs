//! Postgres-backed [`StepProgressRepository`] (spec.md §4.3, §4.8).
//!
//! `upsert` is an idempotent insert-or-update keyed on `(run_id, step_name)`:
//! a later call's `status`/`error_message` always wins, while an absent
//! `started_at`/`completed_at` (e.g. the `completed` transition, which only
//! supplies `completed_at`) preserves whatever the row already recorded
//! rather than clobbering it with `NULL`.

use async_trait::async_trait;
use quorum_application::ports::run_repository::RepositoryError;
use quorum_application::ports::step_progress_repository::{
    StepProgressRepository, StepProgressUpsert,
};
use quorum_domain::{RunId, StepName, StepProgress, S_CANON};
use sqlx::postgres::PgPool;

use crate::db::models::StepProgressRow;
use crate::db::run_repository::map_sqlx_err;

const STEP_COLUMNS: &str = "run_id, step_name, step_order, status, started_at, completed_at, \
    error_message, delivery_count";

pub struct PgStepProgressRepository {
    pool: PgPool,
}

impl PgStepProgressRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl StepProgressRepository for PgStepProgressRepository {
    async fn seed(&self, run_id: RunId) -> Result<(), RepositoryError> {
        let mut tx = self.pool.begin().await.map_err(map_sqlx_err)?;
        for step in S_CANON {
            sqlx::query(
                "INSERT INTO step_progress (run_id, step_name, step_order, status, delivery_count) \
                 VALUES ($1, $2, $3, 'pending', 0) \
                 ON CONFLICT (run_id, step_name) DO NOTHING",
            )
            .bind(run_id.inner())
            .bind(step.as_str())
            .bind(step.order() as i32)
            .execute(&mut *tx)
            .await
            .map_err(map_sqlx_err)?;
        }
        tx.commit().await.map_err(map_sqlx_err)?;
        Ok(())
    }

    async fn upsert(&self, row: StepProgressUpsert) -> Result<(), RepositoryError> {
        let step_order = row.step_name.order() as i32;
        sqlx::query(
            "INSERT INTO step_progress (run_id, step_name, step_order, status, started_at, \
             completed_at, error_message, delivery_count) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, 1) \
             ON CONFLICT (run_id, step_name) DO UPDATE SET \
               status = EXCLUDED.status, \
               started_at = COALESCE(EXCLUDED.started_at, step_progress.started_at), \
               completed_at = COALESCE(EXCLUDED.completed_at, step_progress.completed_at), \
               error_message = EXCLUDED.error_message, \
               delivery_count = step_progress.delivery_count + 1",
        )
        .bind(row.run_id.inner())
        .bind(row.step_name.as_str())
        .bind(step_order)
        .bind(row.status.to_string())
        .bind(row.started_at)
        .bind(row.completed_at)
        .bind(row.error_message)
        .execute(&self.pool)
        .await
        .map_err(map_sqlx_err)?;
        Ok(())
    }

    async fn get(
        &self,
        run_id: RunId,
        step_name: StepName,
    ) -> Result<Option<StepProgress>, RepositoryError> {
        let row = sqlx::query_as::<_, StepProgressRow>(&format!(
            "SELECT {STEP_COLUMNS} FROM step_progress WHERE run_id = $1 AND step_name = $2"
        ))
        .bind(run_id.inner())
        .bind(step_name.as_str())
        .fetch_optional(&self.pool)
        .await
        .map_err(map_sqlx_err)?;
        row.map(StepProgress::try_from).transpose()
    }

    async fn list_for_run(&self, run_id: RunId) -> Result<Vec<StepProgress>, RepositoryError> {
        let rows = sqlx::query_as::<_, StepProgressRow>(&format!(
            "SELECT {STEP_COLUMNS} FROM step_progress WHERE run_id = $1 ORDER BY step_order ASC"
        ))
        .bind(run_id.inner())
        .fetch_all(&self.pool)
        .await
        .map_err(map_sqlx_err)?;
        rows.into_iter().map(StepProgress::try_from).collect()
    }
}
