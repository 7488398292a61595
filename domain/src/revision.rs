//! Revision planning: proposal diffing and persona re-run selection

use crate::persona::{Persona, PERSONAS};
use crate::proposal::{ChangedField, ExpandedProposal, ProposalDiff};
use chrono::Utc;
use serde_json::json;

/// A persona's confidence below this (and no override) still gets re-run
/// only if its field dependencies changed; this threshold governs the
/// "low confidence" re-run trigger independent of the diff (spec.md §4.6).
pub const RERUN_CONFIDENCE_THRESHOLD: f64 = 0.70;

/// Compute the field-level diff between a parent proposal and its edited
/// successor. Only fields that actually changed are included.
pub fn diff_proposals(parent: &ExpandedProposal, edited: &ExpandedProposal) -> ProposalDiff {
    let mut changed_fields = Vec::new();

    if parent.problem_statement != edited.problem_statement {
        changed_fields.push(ChangedField {
            field: "problem_statement".into(),
            before: json!(parent.problem_statement),
            after: json!(edited.problem_statement),
        });
    }
    if parent.proposed_solution != edited.proposed_solution {
        changed_fields.push(ChangedField {
            field: "proposed_solution".into(),
            before: json!(parent.proposed_solution),
            after: json!(edited.proposed_solution),
        });
    }
    if parent.assumptions != edited.assumptions {
        changed_fields.push(ChangedField {
            field: "assumptions".into(),
            before: json!(parent.assumptions),
            after: json!(edited.assumptions),
        });
    }
    if parent.scope_non_goals != edited.scope_non_goals {
        changed_fields.push(ChangedField {
            field: "scope_non_goals".into(),
            before: json!(parent.scope_non_goals),
            after: json!(edited.scope_non_goals),
        });
    }
    if parent.title != edited.title {
        changed_fields.push(ChangedField {
            field: "title".into(),
            before: json!(parent.title),
            after: json!(edited.title),
        });
    }
    if parent.summary != edited.summary {
        changed_fields.push(ChangedField {
            field: "summary".into(),
            before: json!(parent.summary),
            after: json!(edited.summary),
        });
    }

    ProposalDiff {
        num_changes: changed_fields.len(),
        changed_fields,
        timestamp: Utc::now(),
    }
}

/// Prior-review facts the re-run selector needs for one persona (spec.md §4.6
/// step 3). Kept separate from [`crate::persona::PersonaReview`] so the
/// selector doesn't need the full review payload.
pub struct PriorReviewFacts {
    pub persona: Persona,
    pub confidence_score: f64,
    pub blocking_issues_present: bool,
    pub security_concerns_present: bool,
}

/// Decide which personas must be re-run for a revision, given each
/// persona's prior-run facts (spec.md §4.6 step 3).
///
/// A persona is re-run if any of:
/// - its prior confidence was below [`RERUN_CONFIDENCE_THRESHOLD`],
/// - its prior review raised a blocking issue,
/// - it is `security_guardian` and its prior review raised security concerns.
///
/// Selection is per-persona and does not depend on which proposal fields the
/// edit touched — spec.md §4.6 step 3 names only the three criteria above.
/// `diff` is accepted for symmetry with callers that already have it in
/// hand (and because a future field-to-persona invalidation mapping would
/// read it), but step 3 itself ignores it; the diff's role is limited to
/// the `ProposalDiff` record attached to the revision's ProposalVersion.
/// Any persona missing from `prior` (no completed prior review to reuse) is
/// always re-run.
pub fn select_personas_to_rerun(diff: &ProposalDiff, prior: &[PriorReviewFacts]) -> Vec<Persona> {
    let _ = diff;

    PERSONAS
        .iter()
        .copied()
        .filter(|persona| {
            let Some(facts) = prior.iter().find(|f| f.persona == *persona) else {
                return true;
            };
            facts.confidence_score < RERUN_CONFIDENCE_THRESHOLD
                || facts.blocking_issues_present
                || (*persona == Persona::SecurityGuardian && facts.security_concerns_present)
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn base_proposal() -> ExpandedProposal {
        ExpandedProposal {
            problem_statement: "Users cannot export data.".into(),
            proposed_solution: "Add a CSV export button.".into(),
            assumptions: vec!["Data fits in memory".into()],
            scope_non_goals: vec!["No streaming export".into()],
            title: Some("CSV export".into()),
            summary: Some("Let users export their data as CSV.".into()),
        }
    }

    fn facts(persona: Persona, confidence: f64, blocking: bool, security: bool) -> PriorReviewFacts {
        PriorReviewFacts {
            persona,
            confidence_score: confidence,
            blocking_issues_present: blocking,
            security_concerns_present: security,
        }
    }

    #[test]
    fn identical_proposals_produce_empty_diff() {
        let diff = diff_proposals(&base_proposal(), &base_proposal());
        assert_eq!(diff.num_changes, 0);
        assert!(diff.changed_fields.is_empty());
    }

    #[test]
    fn changed_solution_is_reported() {
        let mut edited = base_proposal();
        edited.proposed_solution = "Add a CSV and JSON export button.".into();
        let diff = diff_proposals(&base_proposal(), &edited);
        assert_eq!(diff.num_changes, 1);
        assert_eq!(diff.changed_fields[0].field, "proposed_solution");
    }

    /// S4 from spec.md §8: an edit to `scope_non_goals` only, with every
    /// persona but `critic` above the confidence threshold and blocking-free,
    /// selects exactly `{critic}` for re-run regardless of the diff.
    #[test]
    fn s4_edit_with_one_low_confidence_persona_reruns_only_that_persona() {
        let mut edited = base_proposal();
        edited.scope_non_goals.push("No bulk export".into());
        let diff = diff_proposals(&base_proposal(), &edited);

        let mut prior: Vec<PriorReviewFacts> = PERSONAS
            .iter()
            .map(|p| facts(*p, 0.95, false, false))
            .collect();
        prior[1] = facts(Persona::Critic, 0.50, false, false);

        let rerun = select_personas_to_rerun(&diff, &prior);
        assert_eq!(rerun, vec![Persona::Critic]);
    }

    #[test]
    fn diff_does_not_by_itself_force_a_rerun() {
        let mut edited = base_proposal();
        edited.title = Some("New title".into());
        let diff = diff_proposals(&base_proposal(), &edited);
        let prior: Vec<PriorReviewFacts> = PERSONAS
            .iter()
            .map(|p| facts(*p, 0.95, false, false))
            .collect();
        let rerun = select_personas_to_rerun(&diff, &prior);
        assert!(rerun.is_empty());
    }

    #[test]
    fn no_diff_reuses_high_confidence_personas() {
        let diff = diff_proposals(&base_proposal(), &base_proposal());
        let prior: Vec<PriorReviewFacts> = PERSONAS
            .iter()
            .map(|p| facts(*p, 0.95, false, false))
            .collect();
        let rerun = select_personas_to_rerun(&diff, &prior);
        assert!(rerun.is_empty());
    }

    #[test]
    fn no_diff_still_reruns_low_confidence_persona() {
        let diff = diff_proposals(&base_proposal(), &base_proposal());
        let mut prior: Vec<PriorReviewFacts> = PERSONAS
            .iter()
            .map(|p| facts(*p, 0.95, false, false))
            .collect();
        prior[1] = facts(Persona::Critic, 0.5, false, false);
        let rerun = select_personas_to_rerun(&diff, &prior);
        assert_eq!(rerun, vec![Persona::Critic]);
    }

    #[test]
    fn no_diff_still_reruns_persona_with_blocking_issue() {
        let diff = diff_proposals(&base_proposal(), &base_proposal());
        let mut prior: Vec<PriorReviewFacts> = PERSONAS
            .iter()
            .map(|p| facts(*p, 0.95, false, false))
            .collect();
        let idx = PERSONAS.iter().position(|p| *p == Persona::Optimist).unwrap();
        prior[idx] = facts(Persona::Optimist, 0.95, true, false);
        let rerun = select_personas_to_rerun(&diff, &prior);
        assert_eq!(rerun, vec![Persona::Optimist]);
    }

    #[test]
    fn no_diff_still_reruns_security_guardian_with_security_concerns() {
        let diff = diff_proposals(&base_proposal(), &base_proposal());
        let mut prior: Vec<PriorReviewFacts> = PERSONAS
            .iter()
            .map(|p| facts(*p, 0.95, false, false))
            .collect();
        let idx = PERSONAS
            .iter()
            .position(|p| *p == Persona::SecurityGuardian)
            .unwrap();
        prior[idx] = facts(Persona::SecurityGuardian, 0.95, false, true);
        let rerun = select_personas_to_rerun(&diff, &prior);
        assert_eq!(rerun, vec![Persona::SecurityGuardian]);
    }

    #[test]
    fn missing_prior_review_forces_rerun() {
        let diff = diff_proposals(&base_proposal(), &base_proposal());
        let prior: Vec<PriorReviewFacts> = PERSONAS
            .iter()
            .filter(|p| **p != Persona::UserAdvocate)
            .map(|p| facts(*p, 0.95, false, false))
            .collect();
        let rerun = select_personas_to_rerun(&diff, &prior);
        assert_eq!(rerun, vec![Persona::UserAdvocate]);
    }
}
