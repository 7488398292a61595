//! Postgres-backed [`ProposalRepository`] (spec.md §4.3).

use async_trait::async_trait;
use quorum_application::ports::proposal_repository::ProposalRepository;
use quorum_application::ports::run_repository::RepositoryError;
use quorum_domain::{ProposalVersion, RunId};
use sqlx::postgres::PgPool;

use crate::db::models::ProposalVersionInsert;
use crate::db::run_repository::map_sqlx_err;
use crate::db::models::ProposalVersionRow;

const PROPOSAL_COLUMNS: &str = "run_id, expanded, raw_idea, raw_expanded_proposal, diff, \
    edit_notes, persona_template_version";

pub struct PgProposalRepository {
    pool: PgPool,
}

impl PgProposalRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl ProposalRepository for PgProposalRepository {
    async fn create(&self, version: &ProposalVersion) -> Result<(), RepositoryError> {
        let insert = ProposalVersionInsert::from(version);
        sqlx::query(
            "INSERT INTO proposal_versions (run_id, expanded, raw_idea, raw_expanded_proposal, \
             diff, edit_notes, persona_template_version) VALUES ($1,$2,$3,$4,$5,$6,$7)",
        )
        .bind(insert.run_id)
        .bind(insert.expanded)
        .bind(insert.raw_idea)
        .bind(insert.raw_expanded_proposal)
        .bind(insert.diff)
        .bind(insert.edit_notes)
        .bind(insert.persona_template_version)
        .execute(&self.pool)
        .await
        .map_err(map_sqlx_err)?;
        Ok(())
    }

    async fn get(&self, run_id: RunId) -> Result<Option<ProposalVersion>, RepositoryError> {
        let row = sqlx::query_as::<_, ProposalVersionRow>(&format!(
            "SELECT {PROPOSAL_COLUMNS} FROM proposal_versions WHERE run_id = $1"
        ))
        .bind(run_id.inner())
        .fetch_optional(&self.pool)
        .await
        .map_err(map_sqlx_err)?;
        row.map(ProposalVersion::try_from).transpose()
    }
}
