//! Postgres row shapes and their conversions to/from domain types.
//!
//! Structured fields (`ExpandedProposal`, `ReviewPayload`, `DecisionJson`,
//! `ProposalDiff`, `RunParameters`) are stored as `jsonb` and round-tripped
//! through `serde_json`; enum columns are stored as their `snake_case` text
//! representation via each type's existing `Display`/`FromStr`/`from_str`.

use chrono::{DateTime, Utc};
use quorum_application::ports::run_repository::RepositoryError;
use quorum_domain::{
    Decision, DecisionJson, DecisionLabel, ExpandedProposal, Persona, PersonaReview, Priority,
    ProposalDiff, ProposalVersion, PromptParameters, ReuseProvenance, ReviewPayload, Run,
    RunId, RunParameters, RunStatus, RunType, StepName, StepProgress, StepStatus,
};
use uuid::Uuid;

fn to_other<E: std::fmt::Display>(context: &'static str) -> impl Fn(E) -> RepositoryError {
    move |e| RepositoryError::Other(format!("{context}: {e}"))
}

fn parse_decision_label(s: &str) -> Result<DecisionLabel, RepositoryError> {
    match s {
        "approve" => Ok(DecisionLabel::Approve),
        "revise" => Ok(DecisionLabel::Revise),
        "reject" => Ok(DecisionLabel::Reject),
        other => Err(RepositoryError::Other(format!("unknown decision label: {other}"))),
    }
}

#[derive(Debug, sqlx::FromRow)]
pub struct RunRow {
    pub id: Uuid,
    pub parent_run_id: Option<Uuid>,
    pub run_type: String,
    pub status: String,
    pub created_at: DateTime<Utc>,
    pub queued_at: Option<DateTime<Utc>>,
    pub started_at: Option<DateTime<Utc>>,
    pub completed_at: Option<DateTime<Utc>>,
    pub updated_at: DateTime<Utc>,
    pub retry_count: i32,
    pub priority: String,
    pub input_idea: String,
    pub extra_context: Option<serde_json::Value>,
    pub model: String,
    pub temperature: f64,
    pub parameters: serde_json::Value,
    pub overall_weighted_confidence: Option<f64>,
    pub decision_label: Option<String>,
    pub error_message: Option<String>,
}

impl TryFrom<RunRow> for Run {
    type Error = RepositoryError;

    fn try_from(row: RunRow) -> Result<Self, Self::Error> {
        Ok(Run {
            id: RunId::from(row.id),
            parent_run_id: row.parent_run_id.map(RunId::from),
            run_type: row.run_type.parse::<RunType>().map_err(to_other("run_type"))?,
            status: row.status.parse::<RunStatus>().map_err(to_other("status"))?,
            created_at: row.created_at,
            queued_at: row.queued_at,
            started_at: row.started_at,
            completed_at: row.completed_at,
            updated_at: row.updated_at,
            retry_count: row.retry_count as u32,
            priority: row.priority.parse::<Priority>().map_err(to_other("priority"))?,
            input_idea: row.input_idea,
            extra_context: row.extra_context,
            model: row.model,
            temperature: row.temperature,
            parameters: serde_json::from_value::<RunParameters>(row.parameters)
                .map_err(to_other("parameters"))?,
            overall_weighted_confidence: row.overall_weighted_confidence,
            decision_label: row.decision_label.map(|s| parse_decision_label(&s)).transpose()?,
            error_message: row.error_message,
        })
    }
}

pub struct RunInsert {
    pub id: Uuid,
    pub parent_run_id: Option<Uuid>,
    pub run_type: String,
    pub status: String,
    pub created_at: DateTime<Utc>,
    pub queued_at: Option<DateTime<Utc>>,
    pub input_idea: String,
    pub extra_context: Option<serde_json::Value>,
    pub model: String,
    pub temperature: f64,
    pub parameters: serde_json::Value,
    pub priority: String,
}

impl From<&Run> for RunInsert {
    fn from(run: &Run) -> Self {
        Self {
            id: run.id.inner(),
            parent_run_id: run.parent_run_id.map(|id| id.inner()),
            run_type: run.run_type.to_string(),
            status: run.status.to_string(),
            created_at: run.created_at,
            queued_at: run.queued_at,
            input_idea: run.input_idea.clone(),
            extra_context: run.extra_context.clone(),
            model: run.model.clone(),
            temperature: run.temperature,
            parameters: serde_json::to_value(&run.parameters).expect("RunParameters serializes"),
            priority: run.priority.to_string(),
        }
    }
}

#[derive(Debug, sqlx::FromRow)]
pub struct ProposalVersionRow {
    pub run_id: Uuid,
    pub expanded: serde_json::Value,
    pub raw_idea: String,
    pub raw_expanded_proposal: serde_json::Value,
    pub diff: Option<serde_json::Value>,
    pub edit_notes: Option<String>,
    pub persona_template_version: String,
}

impl TryFrom<ProposalVersionRow> for ProposalVersion {
    type Error = RepositoryError;

    fn try_from(row: ProposalVersionRow) -> Result<Self, Self::Error> {
        Ok(ProposalVersion {
            run_id: RunId::from(row.run_id),
            expanded: serde_json::from_value::<ExpandedProposal>(row.expanded)
                .map_err(to_other("expanded"))?,
            raw_idea: row.raw_idea,
            raw_expanded_proposal: row.raw_expanded_proposal,
            diff: row
                .diff
                .map(serde_json::from_value::<ProposalDiff>)
                .transpose()
                .map_err(to_other("diff"))?,
            edit_notes: row.edit_notes,
            persona_template_version: row.persona_template_version,
        })
    }
}

pub struct ProposalVersionInsert {
    pub run_id: Uuid,
    pub expanded: serde_json::Value,
    pub raw_idea: String,
    pub raw_expanded_proposal: serde_json::Value,
    pub diff: Option<serde_json::Value>,
    pub edit_notes: Option<String>,
    pub persona_template_version: String,
}

impl From<&ProposalVersion> for ProposalVersionInsert {
    fn from(v: &ProposalVersion) -> Self {
        Self {
            run_id: v.run_id.inner(),
            expanded: serde_json::to_value(&v.expanded).expect("ExpandedProposal serializes"),
            raw_idea: v.raw_idea.clone(),
            raw_expanded_proposal: v.raw_expanded_proposal.clone(),
            diff: v
                .diff
                .as_ref()
                .map(|d| serde_json::to_value(d).expect("ProposalDiff serializes")),
            edit_notes: v.edit_notes.clone(),
            persona_template_version: v.persona_template_version.clone(),
        }
    }
}

#[derive(Debug, sqlx::FromRow)]
pub struct PersonaReviewRow {
    pub run_id: Uuid,
    pub persona: String,
    pub review: serde_json::Value,
    pub prompt_parameters: serde_json::Value,
    pub provenance: serde_json::Value,
    pub created_at: DateTime<Utc>,
}

impl TryFrom<PersonaReviewRow> for PersonaReview {
    type Error = RepositoryError;

    fn try_from(row: PersonaReviewRow) -> Result<Self, Self::Error> {
        Ok(PersonaReview {
            run_id: RunId::from(row.run_id),
            persona: Persona::from_id(&row.persona).map_err(to_other("persona"))?,
            review: serde_json::from_value::<ReviewPayload>(row.review).map_err(to_other("review"))?,
            prompt_parameters: serde_json::from_value::<PromptParameters>(row.prompt_parameters)
                .map_err(to_other("prompt_parameters"))?,
            provenance: serde_json::from_value::<ReuseProvenance>(row.provenance)
                .map_err(to_other("provenance"))?,
            created_at: row.created_at,
        })
    }
}

pub struct PersonaReviewInsert {
    pub run_id: Uuid,
    pub persona: String,
    pub review: serde_json::Value,
    pub prompt_parameters: serde_json::Value,
    pub provenance: serde_json::Value,
    pub created_at: DateTime<Utc>,
}

impl From<&PersonaReview> for PersonaReviewInsert {
    fn from(r: &PersonaReview) -> Self {
        Self {
            run_id: r.run_id.inner(),
            persona: r.persona.id().to_string(),
            review: serde_json::to_value(&r.review).expect("ReviewPayload serializes"),
            prompt_parameters: serde_json::to_value(&r.prompt_parameters)
                .expect("PromptParameters serializes"),
            provenance: serde_json::to_value(&r.provenance).expect("ReuseProvenance serializes"),
            created_at: r.created_at,
        }
    }
}

#[derive(Debug, sqlx::FromRow)]
pub struct DecisionRow {
    pub run_id: Uuid,
    pub decision: serde_json::Value,
    pub decision_notes: Option<String>,
}

impl TryFrom<DecisionRow> for Decision {
    type Error = RepositoryError;

    fn try_from(row: DecisionRow) -> Result<Self, Self::Error> {
        Ok(Decision {
            run_id: RunId::from(row.run_id),
            decision: serde_json::from_value::<DecisionJson>(row.decision)
                .map_err(to_other("decision"))?,
            decision_notes: row.decision_notes,
        })
    }
}

pub struct DecisionInsert {
    pub run_id: Uuid,
    pub decision: serde_json::Value,
    pub decision_notes: Option<String>,
}

impl From<&Decision> for DecisionInsert {
    fn from(d: &Decision) -> Self {
        Self {
            run_id: d.run_id.inner(),
            decision: serde_json::to_value(&d.decision).expect("DecisionJson serializes"),
            decision_notes: d.decision_notes.clone(),
        }
    }
}

#[derive(Debug, sqlx::FromRow)]
pub struct StepProgressRow {
    pub run_id: Uuid,
    pub step_name: String,
    pub step_order: i32,
    pub status: String,
    pub started_at: Option<DateTime<Utc>>,
    pub completed_at: Option<DateTime<Utc>>,
    pub error_message: Option<String>,
    pub delivery_count: i32,
}

impl TryFrom<StepProgressRow> for StepProgress {
    type Error = RepositoryError;

    fn try_from(row: StepProgressRow) -> Result<Self, Self::Error> {
        Ok(StepProgress {
            run_id: RunId::from(row.run_id),
            step_name: StepName::from_str(&row.step_name).map_err(to_other("step_name"))?,
            step_order: row.step_order as usize,
            status: row.status.parse::<StepStatus>().map_err(to_other("status"))?,
            started_at: row.started_at,
            completed_at: row.completed_at,
            error_message: row.error_message,
            delivery_count: row.delivery_count as u32,
        })
    }
}
