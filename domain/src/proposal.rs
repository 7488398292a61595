//! Proposal version: the expanded, structured form of an idea

use crate::ids::RunId;
use serde::{Deserialize, Serialize};

/// The structured output of the `expand` step, validated against the
/// `ExpandedProposal@1.0.0` schema before it is ever persisted.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ExpandedProposal {
    pub problem_statement: String,
    pub proposed_solution: String,
    pub assumptions: Vec<String>,
    pub scope_non_goals: Vec<String>,
    pub title: Option<String>,
    pub summary: Option<String>,
}

/// A field-level change recorded by the revision planner's diff (§4.6 step 2).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChangedField {
    pub field: String,
    pub before: serde_json::Value,
    pub after: serde_json::Value,
}

/// The diff between a parent proposal and an edited proposal.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProposalDiff {
    pub changed_fields: Vec<ChangedField>,
    pub num_changes: usize,
    pub timestamp: chrono::DateTime<chrono::Utc>,
}

/// Exactly one per Run. Carries the expanded proposal plus, for revisions,
/// the diff against the parent and any free-text edit notes.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProposalVersion {
    pub run_id: RunId,
    pub expanded: ExpandedProposal,
    pub raw_idea: String,
    pub raw_expanded_proposal: serde_json::Value,
    pub diff: Option<ProposalDiff>,
    pub edit_notes: Option<String>,
    pub persona_template_version: String,
}

impl ProposalVersion {
    pub fn new_initial(
        run_id: RunId,
        expanded: ExpandedProposal,
        raw_idea: String,
        raw_expanded_proposal: serde_json::Value,
        persona_template_version: String,
    ) -> Self {
        Self {
            run_id,
            expanded,
            raw_idea,
            raw_expanded_proposal,
            diff: None,
            edit_notes: None,
            persona_template_version,
        }
    }

    pub fn new_revision(
        run_id: RunId,
        expanded: ExpandedProposal,
        raw_idea: String,
        raw_expanded_proposal: serde_json::Value,
        persona_template_version: String,
        diff: ProposalDiff,
        edit_notes: Option<String>,
    ) -> Self {
        Self {
            run_id,
            expanded,
            raw_idea,
            raw_expanded_proposal,
            diff: Some(diff),
            edit_notes,
            persona_template_version,
        }
    }
}
