//! Connection-pool liveness check backing the out-of-scope `/health`
//! endpoint's "config sanity" contract (spec.md §6, SPEC_FULL §4.3).

use sqlx::postgres::PgPool;

pub async fn check(pool: &PgPool) -> Result<(), sqlx::Error> {
    sqlx::query("SELECT 1").execute(pool).await?;
    Ok(())
}
