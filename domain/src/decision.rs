//! Decision: the aggregated outcome of a Run's persona panel

use crate::ids::RunId;
use crate::persona::Persona;
use crate::run::DecisionLabel;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// A persona's structured dissent from the final decision (spec.md §4.5
/// "Minority reports").
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MinorityReport {
    pub persona_id: String,
    pub persona_name: String,
    pub confidence_score: f64,
    pub blocking_summary: Option<String>,
    pub mitigation_recommendation: Option<String>,
}

/// Accompanies every decision: the weights used, each persona's raw score,
/// its weighted contribution, and the formula string for audit display.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScoreBreakdown {
    pub weights: BTreeMap<String, f64>,
    pub individual_scores: BTreeMap<String, f64>,
    pub weighted_contributions: BTreeMap<String, f64>,
    pub formula: String,
}

/// The full structured decision payload, validated against the
/// `DecisionAggregation@1.0.0` schema before it is ever persisted.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DecisionJson {
    pub decision: DecisionLabel,
    pub weighted_confidence: f64,
    pub security_veto: bool,
    pub any_blocking: bool,
    pub score_breakdown: ScoreBreakdown,
    pub minority_reports: Vec<MinorityReport>,
}

/// Exactly one per Run, present iff `Run.status == completed`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Decision {
    pub run_id: RunId,
    pub decision: DecisionJson,
    pub decision_notes: Option<String>,
}

impl Decision {
    pub fn overall_weighted_confidence(&self) -> f64 {
        self.decision.weighted_confidence
    }

    pub fn decision_label(&self) -> DecisionLabel {
        self.decision.decision
    }
}

/// Per-persona input to the aggregator: just what §4.5's formula needs.
#[derive(Debug, Clone)]
pub struct PersonaScore {
    pub persona: Persona,
    pub confidence_score: f64,
    pub blocking_issues_present: bool,
    pub security_concerns_present: bool,
    pub blocking_summary: Option<String>,
}
