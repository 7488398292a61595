//! Postgres-backed [`RunRepository`] (spec.md §4.3, §4.7 claim protocol).

use async_trait::async_trait;
use chrono::Utc;
use quorum_application::ports::run_repository::{
    ClaimOutcome, RepositoryError, RunListFilter, RunRepository,
};
use quorum_domain::{DecisionLabel, Run, RunId};
use sqlx::postgres::PgPool;
use sqlx::QueryBuilder;

use crate::db::models::{RunInsert, RunRow};

const RUN_COLUMNS: &str = "id, parent_run_id, run_type, status, created_at, queued_at, \
    started_at, completed_at, updated_at, retry_count, priority, input_idea, extra_context, \
    model, temperature, parameters, overall_weighted_confidence, decision_label, error_message";

pub struct PgRunRepository {
    pool: PgPool,
}

impl PgRunRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

pub(crate) fn map_sqlx_err(e: sqlx::Error) -> RepositoryError {
    if let sqlx::Error::Database(db_err) = &e {
        if db_err.is_unique_violation() {
            return RepositoryError::UniqueViolation(db_err.message().to_string());
        }
    }
    RepositoryError::Connection(e.to_string())
}

#[async_trait]
impl RunRepository for PgRunRepository {
    async fn create(&self, run: &Run) -> Result<(), RepositoryError> {
        let insert = RunInsert::from(run);
        sqlx::query(
            "INSERT INTO runs (id, parent_run_id, run_type, status, created_at, queued_at, \
             input_idea, extra_context, model, temperature, parameters, priority, retry_count, updated_at) \
             VALUES ($1,$2,$3,$4,$5,$6,$7,$8,$9,$10,$11,$12,0,$5)",
        )
        .bind(insert.id)
        .bind(insert.parent_run_id)
        .bind(insert.run_type)
        .bind(insert.status)
        .bind(insert.created_at)
        .bind(insert.queued_at)
        .bind(insert.input_idea)
        .bind(insert.extra_context)
        .bind(insert.model)
        .bind(insert.temperature)
        .bind(insert.parameters)
        .bind(insert.priority)
        .execute(&self.pool)
        .await
        .map_err(map_sqlx_err)?;
        Ok(())
    }

    async fn claim(
        &self,
        run_id: RunId,
        job_timeout_seconds: u64,
    ) -> Result<ClaimOutcome, RepositoryError> {
        let mut tx = self.pool.begin().await.map_err(map_sqlx_err)?;

        let locked = sqlx::query_as::<_, RunRow>(&format!(
            "SELECT {RUN_COLUMNS} FROM runs WHERE id = $1 FOR UPDATE"
        ))
        .bind(run_id.inner())
        .fetch_optional(&mut *tx)
        .await
        .map_err(map_sqlx_err)?;

        let Some(row) = locked else {
            return Ok(ClaimOutcome::NotFound);
        };

        match row.status.as_str() {
            "completed" => {
                let run = Run::try_from(row)?;
                tx.commit().await.map_err(map_sqlx_err)?;
                Ok(ClaimOutcome::AlreadyCompleted(run))
            }
            "queued" => {
                let claimed = claim_update(&mut tx, run_id, false).await?;
                tx.commit().await.map_err(map_sqlx_err)?;
                Ok(ClaimOutcome::Claimed {
                    run: claimed,
                    retried: false,
                })
            }
            "failed" => {
                let claimed = claim_update(&mut tx, run_id, true).await?;
                tx.commit().await.map_err(map_sqlx_err)?;
                Ok(ClaimOutcome::Claimed {
                    run: claimed,
                    retried: true,
                })
            }
            "running" => {
                let stale = row
                    .started_at
                    .map(|started| Utc::now().signed_duration_since(started).num_seconds() as u64 > job_timeout_seconds)
                    .unwrap_or(true);
                if !stale {
                    return Err(RepositoryError::Other(format!(
                        "run {run_id} is currently owned by another worker"
                    )));
                }
                let claimed = claim_update(&mut tx, run_id, false).await?;
                tx.commit().await.map_err(map_sqlx_err)?;
                Ok(ClaimOutcome::Claimed {
                    run: claimed,
                    retried: false,
                })
            }
            other => Err(RepositoryError::Other(format!("unknown run status: {other}"))),
        }
    }

    async fn mark_completed(
        &self,
        run_id: RunId,
        overall_weighted_confidence: f64,
        decision_label: DecisionLabel,
    ) -> Result<(), RepositoryError> {
        sqlx::query(
            "UPDATE runs SET status = 'completed', completed_at = NOW(), updated_at = NOW(), \
             overall_weighted_confidence = $2, decision_label = $3, error_message = NULL \
             WHERE id = $1",
        )
        .bind(run_id.inner())
        .bind(overall_weighted_confidence)
        .bind(decision_label.to_string())
        .execute(&self.pool)
        .await
        .map_err(map_sqlx_err)?;
        Ok(())
    }

    async fn mark_failed(&self, run_id: RunId, error_message: &str) -> Result<(), RepositoryError> {
        sqlx::query(
            "UPDATE runs SET status = 'failed', completed_at = NOW(), updated_at = NOW(), \
             error_message = $2 WHERE id = $1",
        )
        .bind(run_id.inner())
        .bind(error_message)
        .execute(&self.pool)
        .await
        .map_err(map_sqlx_err)?;
        Ok(())
    }

    async fn get(&self, run_id: RunId) -> Result<Option<Run>, RepositoryError> {
        let row = sqlx::query_as::<_, RunRow>(&format!("SELECT {RUN_COLUMNS} FROM runs WHERE id = $1"))
            .bind(run_id.inner())
            .fetch_optional(&self.pool)
            .await
            .map_err(map_sqlx_err)?;
        row.map(Run::try_from).transpose()
    }

    async fn list(
        &self,
        filter: &RunListFilter,
        limit: u32,
        offset: u32,
    ) -> Result<Vec<Run>, RepositoryError> {
        let mut builder = QueryBuilder::new(format!("SELECT {RUN_COLUMNS} FROM runs"));
        let mut has_clause = false;

        macro_rules! clause {
            ($sql:expr, $value:expr) => {
                builder.push(if has_clause { " AND " } else { " WHERE " });
                builder.push($sql);
                builder.push_bind($value);
                has_clause = true;
            };
        }

        if let Some(status) = filter.status {
            clause!(" status = ", status.to_string());
        }
        if let Some(run_type) = filter.run_type {
            clause!(" run_type = ", run_type.to_string());
        }
        if let Some(parent_run_id) = filter.parent_run_id {
            clause!(" parent_run_id = ", parent_run_id.inner());
        }
        if let Some(decision) = filter.decision {
            clause!(" decision_label = ", decision.to_string());
        }
        if let Some(min_confidence) = filter.min_confidence {
            clause!(" overall_weighted_confidence >= ", min_confidence);
        }
        if let Some(created_after) = filter.created_after {
            clause!(" created_at >= ", created_after);
        }
        if let Some(created_before) = filter.created_before {
            clause!(" created_at <= ", created_before);
        }

        builder.push(" ORDER BY created_at DESC LIMIT ");
        builder.push_bind(limit as i64);
        builder.push(" OFFSET ");
        builder.push_bind(offset as i64);

        let rows = builder
            .build_query_as::<RunRow>()
            .fetch_all(&self.pool)
            .await
            .map_err(map_sqlx_err)?;

        rows.into_iter().map(Run::try_from).collect()
    }
}

async fn claim_update(
    tx: &mut sqlx::Transaction<'_, sqlx::Postgres>,
    run_id: RunId,
    is_retry: bool,
) -> Result<Run, RepositoryError> {
    let sql = if is_retry {
        format!(
            "UPDATE runs SET status = 'running', started_at = NOW(), updated_at = NOW(), \
             retry_count = retry_count + 1, error_message = NULL WHERE id = $1 RETURNING {RUN_COLUMNS}"
        )
    } else {
        format!(
            "UPDATE runs SET status = 'running', started_at = NOW(), updated_at = NOW() \
             WHERE id = $1 RETURNING {RUN_COLUMNS}"
        )
    };

    let row = sqlx::query_as::<_, RunRow>(&sql)
        .bind(run_id.inner())
        .fetch_one(&mut *tx)
        .await
        .map_err(map_sqlx_err)?;

    Run::try_from(row)
}
