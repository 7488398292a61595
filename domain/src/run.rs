//! Run entity: the root aggregate for one evaluation attempt

use crate::ids::RunId;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Lifecycle status of a [`Run`].
///
/// Transitions only along `queued -> running -> {completed, failed}`, with
/// retry resetting `failed -> queued` and incrementing `retry_count`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RunStatus {
    Queued,
    Running,
    Completed,
    Failed,
}

impl RunStatus {
    pub fn is_terminal(&self) -> bool {
        matches!(self, RunStatus::Completed | RunStatus::Failed)
    }
}

impl std::fmt::Display for RunStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            RunStatus::Queued => "queued",
            RunStatus::Running => "running",
            RunStatus::Completed => "completed",
            RunStatus::Failed => "failed",
        };
        write!(f, "{s}")
    }
}

impl std::str::FromStr for RunStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "queued" => Ok(RunStatus::Queued),
            "running" => Ok(RunStatus::Running),
            "completed" => Ok(RunStatus::Completed),
            "failed" => Ok(RunStatus::Failed),
            other => Err(format!("unknown run status: {other}")),
        }
    }
}

/// Whether a Run is a fresh evaluation or derives from a parent.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RunType {
    Initial,
    Revision,
}

impl std::fmt::Display for RunType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            RunType::Initial => "initial",
            RunType::Revision => "revision",
        };
        write!(f, "{s}")
    }
}

impl std::str::FromStr for RunType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "initial" => Ok(RunType::Initial),
            "revision" => Ok(RunType::Revision),
            other => Err(format!("unknown run type: {other}")),
        }
    }
}

/// Dispatch priority. Does not affect worker scheduling in this repo
/// (spec.md's Non-goals exclude priority preemption); it is carried through
/// the broker envelope for a future broker-level priority queue.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Priority {
    #[default]
    Normal,
    High,
}

impl std::fmt::Display for Priority {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Priority::Normal => "normal",
            Priority::High => "high",
        };
        write!(f, "{s}")
    }
}

impl std::str::FromStr for Priority {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "normal" => Ok(Priority::Normal),
            "high" => Ok(Priority::High),
            other => Err(format!("unknown priority: {other}")),
        }
    }
}

/// Final label attached to a completed Run's decision.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DecisionLabel {
    Approve,
    Revise,
    Reject,
}

impl std::fmt::Display for DecisionLabel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            DecisionLabel::Approve => "approve",
            DecisionLabel::Revise => "revise",
            DecisionLabel::Reject => "reject",
        };
        write!(f, "{s}")
    }
}

impl std::str::FromStr for DecisionLabel {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "approve" => Ok(DecisionLabel::Approve),
            "revise" => Ok(DecisionLabel::Revise),
            "reject" => Ok(DecisionLabel::Reject),
            other => Err(format!("unknown decision label: {other}")),
        }
    }
}

/// Run-scoped model/prompt parameters, persisted verbatim in `parameters_json`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunParameters {
    pub schema_version: String,
    pub prompt_set_version: String,
    pub persona_template_version: String,
    pub max_retries: u32,
}

/// Root aggregate for one evaluation attempt of an idea.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Run {
    pub id: RunId,
    pub parent_run_id: Option<RunId>,
    pub run_type: RunType,
    pub status: RunStatus,
    pub created_at: DateTime<Utc>,
    pub queued_at: Option<DateTime<Utc>>,
    pub started_at: Option<DateTime<Utc>>,
    pub completed_at: Option<DateTime<Utc>>,
    pub updated_at: DateTime<Utc>,
    pub retry_count: u32,
    pub priority: Priority,
    pub input_idea: String,
    pub extra_context: Option<serde_json::Value>,
    pub model: String,
    pub temperature: f64,
    pub parameters: RunParameters,
    pub overall_weighted_confidence: Option<f64>,
    pub decision_label: Option<DecisionLabel>,
    pub error_message: Option<String>,
}

impl Run {
    /// Build a fresh `queued` Run for an initial submission.
    pub fn new_initial(
        input_idea: String,
        extra_context: Option<serde_json::Value>,
        model: String,
        temperature: f64,
        parameters: RunParameters,
    ) -> Self {
        let now = Utc::now();
        Self {
            id: RunId::new(),
            parent_run_id: None,
            run_type: RunType::Initial,
            status: RunStatus::Queued,
            created_at: now,
            queued_at: Some(now),
            started_at: None,
            completed_at: None,
            updated_at: now,
            retry_count: 0,
            priority: Priority::Normal,
            input_idea,
            extra_context,
            model,
            temperature,
            parameters,
            overall_weighted_confidence: None,
            decision_label: None,
            error_message: None,
        }
    }

    /// Build a fresh `queued` Run deriving from `parent`.
    pub fn new_revision(
        parent_id: RunId,
        input_idea: String,
        extra_context: Option<serde_json::Value>,
        model: String,
        temperature: f64,
        parameters: RunParameters,
    ) -> Self {
        let mut run = Self::new_initial(input_idea, extra_context, model, temperature, parameters);
        run.parent_run_id = Some(parent_id);
        run.run_type = RunType::Revision;
        run
    }

    pub fn is_queued(&self) -> bool {
        self.status == RunStatus::Queued
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn params() -> RunParameters {
        RunParameters {
            schema_version: "1.0.0".into(),
            prompt_set_version: "1".into(),
            persona_template_version: "1".into(),
            max_retries: 3,
        }
    }

    #[test]
    fn new_initial_starts_queued_with_timestamps() {
        let run = Run::new_initial("Build a thing.".into(), None, "m".into(), 0.2, params());
        assert_eq!(run.status, RunStatus::Queued);
        assert!(run.queued_at.is_some());
        assert!(run.started_at.is_none());
        assert_eq!(run.retry_count, 0);
        assert_eq!(run.run_type, RunType::Initial);
    }

    #[test]
    fn new_revision_carries_parent() {
        let parent = RunId::new();
        let run = Run::new_revision(parent, "edit.".into(), None, "m".into(), 0.2, params());
        assert_eq!(run.parent_run_id, Some(parent));
        assert_eq!(run.run_type, RunType::Revision);
    }

    #[test]
    fn status_round_trips_through_str() {
        for s in ["queued", "running", "completed", "failed"] {
            let parsed: RunStatus = s.parse().unwrap();
            assert_eq!(parsed.to_string(), s);
        }
    }

    #[test]
    fn decision_label_round_trips_through_str() {
        for s in ["approve", "revise", "reject"] {
            let parsed: DecisionLabel = s.parse().unwrap();
            assert_eq!(parsed.to_string(), s);
        }
    }

    #[test]
    fn decision_label_rejects_unknown_str() {
        assert!("maybe".parse::<DecisionLabel>().is_err());
    }
}
