//! Canonical pipeline steps and their per-Run progress tracking

use crate::error::DomainError;
use crate::ids::RunId;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// The fixed, ordered set of pipeline steps (`S_CANON` in spec.md §3).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StepName {
    Expand,
    ReviewArchitect,
    ReviewCritic,
    ReviewOptimist,
    ReviewSecurityGuardian,
    ReviewUserAdvocate,
    AggregateDecision,
}

/// Canonical, ordered step list. `step_order` is this slice's index.
pub const S_CANON: [StepName; 7] = [
    StepName::Expand,
    StepName::ReviewArchitect,
    StepName::ReviewCritic,
    StepName::ReviewOptimist,
    StepName::ReviewSecurityGuardian,
    StepName::ReviewUserAdvocate,
    StepName::AggregateDecision,
];

impl StepName {
    pub fn as_str(&self) -> &'static str {
        match self {
            StepName::Expand => "expand",
            StepName::ReviewArchitect => "review_architect",
            StepName::ReviewCritic => "review_critic",
            StepName::ReviewOptimist => "review_optimist",
            StepName::ReviewSecurityGuardian => "review_security_guardian",
            StepName::ReviewUserAdvocate => "review_user_advocate",
            StepName::AggregateDecision => "aggregate_decision",
        }
    }

    pub fn order(&self) -> usize {
        S_CANON.iter().position(|s| s == self).expect("S_CANON is exhaustive")
    }

    pub fn from_str(s: &str) -> Result<Self, DomainError> {
        S_CANON
            .iter()
            .copied()
            .find(|step| step.as_str() == s)
            .ok_or_else(|| DomainError::UnknownStep(s.to_string()))
    }

    pub fn is_review(&self) -> bool {
        matches!(
            self,
            StepName::ReviewArchitect
                | StepName::ReviewCritic
                | StepName::ReviewOptimist
                | StepName::ReviewSecurityGuardian
                | StepName::ReviewUserAdvocate
        )
    }
}

impl std::fmt::Display for StepName {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Execution status of a single step within a Run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StepStatus {
    Pending,
    Running,
    Completed,
    Failed,
}

impl std::fmt::Display for StepStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            StepStatus::Pending => "pending",
            StepStatus::Running => "running",
            StepStatus::Completed => "completed",
            StepStatus::Failed => "failed",
        };
        write!(f, "{s}")
    }
}

impl std::str::FromStr for StepStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "pending" => Ok(StepStatus::Pending),
            "running" => Ok(StepStatus::Running),
            "completed" => Ok(StepStatus::Completed),
            "failed" => Ok(StepStatus::Failed),
            other => Err(format!("unknown step status: {other}")),
        }
    }
}

/// One per (Run, canonical step), unique on (run_id, step_name), cascade
/// deleted with its Run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StepProgress {
    pub run_id: RunId,
    pub step_name: StepName,
    pub step_order: usize,
    pub status: StepStatus,
    pub started_at: Option<DateTime<Utc>>,
    pub completed_at: Option<DateTime<Utc>>,
    pub error_message: Option<String>,
    pub delivery_count: u32,
}

impl StepProgress {
    pub fn pending(run_id: RunId, step_name: StepName) -> Self {
        Self {
            run_id,
            step_name,
            step_order: step_name.order(),
            status: StepStatus::Pending,
            started_at: None,
            completed_at: None,
            error_message: None,
            delivery_count: 0,
        }
    }

    /// Build the seven `pending` rows for a fresh Run (spec.md §4.8).
    pub fn seed(run_id: RunId) -> Vec<Self> {
        S_CANON.iter().map(|step| Self::pending(run_id, *step)).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn s_canon_order_matches_index() {
        for (i, step) in S_CANON.iter().enumerate() {
            assert_eq!(step.order(), i);
        }
    }

    #[test]
    fn step_name_round_trips() {
        for step in S_CANON {
            assert_eq!(StepName::from_str(step.as_str()).unwrap(), step);
        }
    }

    #[test]
    fn unknown_step_name_errors() {
        assert!(StepName::from_str("bogus").is_err());
    }

    #[test]
    fn seed_produces_seven_pending_rows_in_order() {
        let run_id = RunId::new();
        let rows = StepProgress::seed(run_id);
        assert_eq!(rows.len(), 7);
        for (i, row) in rows.iter().enumerate() {
            assert_eq!(row.step_order, i);
            assert_eq!(row.status, StepStatus::Pending);
        }
    }
}
