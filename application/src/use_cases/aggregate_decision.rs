//! Aggregation use case: wraps the pure domain aggregator with the mapping
//! from persisted [`PersonaReview`] rows to the domain's [`PersonaScore`]
//! input (spec.md §4.5).

use quorum_domain::{aggregate, Decision, DecisionJson, DomainError, PersonaReview, PersonaScore, RunId};

pub fn aggregate_reviews(
    run_id: RunId,
    reviews: &[PersonaReview],
) -> Result<DecisionJson, DomainError> {
    let scores: Vec<PersonaScore> = reviews
        .iter()
        .map(|r| PersonaScore {
            persona: r.persona,
            confidence_score: r.review.confidence_score,
            blocking_issues_present: r.review.blocking_issues_present(),
            security_concerns_present: r.review.security_concerns_present(),
            blocking_summary: r
                .review
                .blocking_issues
                .first()
                .map(|b| b.text.clone()),
        })
        .collect();

    let decision_json = aggregate(&scores)?;
    let _ = run_id; // decision_json carries no run_id; caller wraps it into a Decision.
    Ok(decision_json)
}

pub fn build_decision(run_id: RunId, decision_json: DecisionJson, notes: Option<String>) -> Decision {
    Decision {
        run_id,
        decision: decision_json,
        decision_notes: notes,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use quorum_domain::{Persona, PromptParameters, ReviewPayload, PERSONAS};

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

    #[test]
    fn happy_path_matches_s1_from_spec() {
        let run_id = RunId::new();
        let scores = [0.80, 0.70, 0.90, 0.75, 0.85];
        let reviews: Vec<PersonaReview> = PERSONAS
            .iter()
            .zip(scores)
            .map(|(p, s)| review(*p, s))
            .collect();
        let decision = aggregate_reviews(run_id, &reviews).unwrap();
        assert!((decision.weighted_confidence - 0.7875).abs() < 1e-9);
        assert_eq!(decision.decision, quorum_domain::DecisionLabel::Revise);
    }

    #[test]
    fn approval_matches_s2_from_spec() {
        let run_id = RunId::new();
        let scores = [0.90, 0.85, 0.92, 0.82, 0.88];
        let reviews: Vec<PersonaReview> = PERSONAS
            .iter()
            .zip(scores)
            .map(|(p, s)| review(*p, s))
            .collect();
        let decision = aggregate_reviews(run_id, &reviews).unwrap();
        assert!((decision.weighted_confidence - 0.875).abs() < 1e-9);
        assert_eq!(decision.decision, quorum_domain::DecisionLabel::Approve);
    }
}
