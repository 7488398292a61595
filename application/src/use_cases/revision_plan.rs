//! Revision planner use case (spec.md §4.6): diffs a parent proposal against
//! an edit and decides which personas must be re-run. The diff is computed
//! purely from stored structured JSON — no LLM call (spec.md §9).

use quorum_domain::{
    select_personas_to_rerun, Persona, PersonaReview, PriorReviewFacts, ProposalDiff,
};

pub fn prior_facts_from_reviews(reviews: &[PersonaReview]) -> Vec<PriorReviewFacts> {
    reviews
        .iter()
        .map(|r| PriorReviewFacts {
            persona: r.persona,
            confidence_score: r.review.confidence_score,
            blocking_issues_present: r.review.blocking_issues_present(),
            security_concerns_present: r.review.security_concerns_present(),
        })
        .collect()
}

/// Split the panel into the personas that must be freshly re-run and the
/// reviews that can be copied forward unchanged.
pub fn plan_rerun<'a>(
    diff: &ProposalDiff,
    parent_reviews: &'a [PersonaReview],
) -> (Vec<Persona>, Vec<&'a PersonaReview>) {
    let facts = prior_facts_from_reviews(parent_reviews);
    let rerun = select_personas_to_rerun(diff, &facts);

    let reused = parent_reviews
        .iter()
        .filter(|r| !rerun.contains(&r.persona))
        .collect();

    (rerun, reused)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use quorum_domain::{diff_proposals, ExpandedProposal, PromptParameters, ReviewPayload, RunId, PERSONAS};

    fn proposal() -> ExpandedProposal {
        ExpandedProposal {
            problem_statement: "Users cannot export data.".into(),
            proposed_solution: "Add a CSV export button.".into(),
            assumptions: vec!["Data fits in memory".into()],
            scope_non_goals: vec!["No streaming export".into()],
            title: Some("CSV export".into()),
            summary: None,
        }
    }

    fn review(persona: Persona, confidence: f64) -> PersonaReview {
        PersonaReview {
            run_id: RunId::new(),
            persona,
            review: ReviewPayload {
                confidence_score: confidence,
                strengths: vec![],
                concerns: vec![],
                recommendations: vec![],
                blocking_issues: vec![],
                estimated_effort: "small".into(),
                dependency_risks: vec![],
            },
            prompt_parameters: PromptParameters {
                model: "m".into(),
                temperature: 0.2,
                persona_template_version: "1".into(),
                attempt_count: 1,
            },
            provenance: Default::default(),
            created_at: Utc::now(),
        }
    }

    /// S4 from spec.md §8: only `critic` (confidence 0.50) is re-run; the
    /// other four reviews are reused, even though the edit changed a field.
    #[test]
    fn s4_revision_reuse_selects_only_low_confidence_persona() {
        let parent = proposal();
        let mut edited = proposal();
        edited.scope_non_goals.push("No bulk export".into());
        let diff = diff_proposals(&parent, &edited);

        let reviews: Vec<PersonaReview> = PERSONAS
            .iter()
            .map(|p| review(*p, if *p == Persona::Critic { 0.50 } else { 0.80 }))
            .collect();

        let (rerun, reused) = plan_rerun(&diff, &reviews);
        assert_eq!(rerun, vec![Persona::Critic]);
        assert_eq!(reused.len(), 4);
    }

    #[test]
    fn no_diff_reuses_all_but_low_confidence_persona() {
        let parent = proposal();
        let diff = diff_proposals(&parent, &parent);
        let reviews: Vec<PersonaReview> = PERSONAS
            .iter()
            .map(|p| review(*p, if *p == Persona::Critic { 0.50 } else { 0.80 }))
            .collect();

        let (rerun, reused) = plan_rerun(&diff, &reviews);
        assert_eq!(rerun, vec![Persona::Critic]);
        assert_eq!(reused.len(), 4);
    }
}
