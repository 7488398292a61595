//! Pure decision aggregation: weighted confidence, veto rules, minority reports

use crate::decision::{DecisionJson, MinorityReport, PersonaScore, ScoreBreakdown};
use crate::error::DomainError;
use crate::run::DecisionLabel;
use std::collections::BTreeMap;

/// Confidence at or above this threshold yields `approve` (absent veto/blocking).
pub const APPROVE_THRESHOLD: f64 = 0.80;
/// Confidence at or above this threshold (and below [`APPROVE_THRESHOLD`]) yields `revise`.
pub const REVISE_THRESHOLD: f64 = 0.60;
/// A persona's score more than this far below the weighted confidence is dissenting.
pub const MINORITY_DELTA: f64 = 0.25;

/// Aggregate a complete set of persona scores into a decision (spec.md §4.5).
///
/// Applies, in order: security veto, any-blocking override, then the
/// threshold ladder. Always produces a minority report for every persona
/// whose score dissents from the outcome by more than [`MINORITY_DELTA`],
/// or who raised a blocking issue without the run being rejected for it.
pub fn aggregate(scores: &[PersonaScore]) -> Result<DecisionJson, DomainError> {
    if scores.is_empty() {
        return Err(DomainError::NoReviews);
    }

    let weighted_confidence: f64 = scores
        .iter()
        .map(|s| s.persona.weight() * s.confidence_score)
        .sum();

    let security_veto = scores
        .iter()
        .any(|s| matches!(s.persona, crate::persona::Persona::SecurityGuardian) && s.security_concerns_present);

    let any_blocking = scores.iter().any(|s| s.blocking_issues_present);

    let decision = if security_veto {
        DecisionLabel::Reject
    } else if any_blocking {
        DecisionLabel::Reject
    } else if weighted_confidence >= APPROVE_THRESHOLD {
        DecisionLabel::Approve
    } else if weighted_confidence >= REVISE_THRESHOLD {
        DecisionLabel::Revise
    } else {
        DecisionLabel::Reject
    };

    let score_breakdown = build_score_breakdown(scores, weighted_confidence);
    let minority_reports = build_minority_reports(scores, weighted_confidence, decision);

    Ok(DecisionJson {
        decision,
        weighted_confidence,
        security_veto,
        any_blocking,
        score_breakdown,
        minority_reports,
    })
}

fn build_score_breakdown(scores: &[PersonaScore], weighted_confidence: f64) -> ScoreBreakdown {
    let mut weights = BTreeMap::new();
    let mut individual_scores = BTreeMap::new();
    let mut weighted_contributions = BTreeMap::new();

    for s in scores {
        let id = s.persona.id().to_string();
        weights.insert(id.clone(), s.persona.weight());
        individual_scores.insert(id.clone(), s.confidence_score);
        weighted_contributions.insert(id, s.persona.weight() * s.confidence_score);
    }

    ScoreBreakdown {
        weights,
        individual_scores,
        weighted_contributions,
        formula: format!(
            "weighted_confidence = sum(weight_i * score_i) = {weighted_confidence:.4}"
        ),
    }
}

/// The decision band a single score would fall into on its own, using the
/// same thresholds as the aggregate decision rule (spec.md §4.5).
fn band(confidence_score: f64) -> DecisionLabel {
    if confidence_score >= APPROVE_THRESHOLD {
        DecisionLabel::Approve
    } else if confidence_score >= REVISE_THRESHOLD {
        DecisionLabel::Revise
    } else {
        DecisionLabel::Reject
    }
}

/// A persona dissents when: (a) its own score bands to a different label
/// than the final decision, (b) it raised a blocking issue that the final
/// decision did not act on by rejecting, or (c) its score differs from the
/// weighted confidence by more than [`MINORITY_DELTA`] in either direction.
fn build_minority_reports(
    scores: &[PersonaScore],
    weighted_confidence: f64,
    decision: DecisionLabel,
) -> Vec<MinorityReport> {
    scores
        .iter()
        .filter(|s| {
            let dissenting_band = band(s.confidence_score) != decision;
            let unaddressed_blocking =
                s.blocking_issues_present && decision != DecisionLabel::Reject;
            let dissenting_score = (weighted_confidence - s.confidence_score).abs() > MINORITY_DELTA;
            dissenting_band || unaddressed_blocking || dissenting_score
        })
        .map(|s| MinorityReport {
            persona_id: s.persona.id().to_string(),
            persona_name: s.persona.display_name().to_string(),
            confidence_score: s.confidence_score,
            blocking_summary: s.blocking_summary.clone(),
            mitigation_recommendation: None,
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::persona::PERSONAS;

    fn score(persona: crate::persona::Persona, confidence: f64) -> PersonaScore {
        PersonaScore {
            persona,
            confidence_score: confidence,
            blocking_issues_present: false,
            security_concerns_present: false,
            blocking_summary: None,
        }
    }

    fn all_at(confidence: f64) -> Vec<PersonaScore> {
        PERSONAS.iter().map(|p| score(*p, confidence)).collect()
    }

    #[test]
    fn empty_scores_error() {
        assert!(aggregate(&[]).is_err());
    }

    #[test]
    fn high_uniform_confidence_approves() {
        let result = aggregate(&all_at(0.9)).unwrap();
        assert_eq!(result.decision, DecisionLabel::Approve);
        assert!((result.weighted_confidence - 0.9).abs() < 1e-9);
        assert!(!result.security_veto);
        assert!(!result.any_blocking);
    }

    #[test]
    fn mid_confidence_revises() {
        let result = aggregate(&all_at(0.7)).unwrap();
        assert_eq!(result.decision, DecisionLabel::Revise);
    }

    #[test]
    fn low_confidence_rejects() {
        let result = aggregate(&all_at(0.3)).unwrap();
        assert_eq!(result.decision, DecisionLabel::Reject);
    }

    #[test]
    fn security_veto_rejects_regardless_of_confidence() {
        let mut scores = all_at(0.95);
        let sec = scores
            .iter_mut()
            .find(|s| matches!(s.persona, crate::persona::Persona::SecurityGuardian))
            .unwrap();
        sec.security_concerns_present = true;
        sec.blocking_issues_present = true;
        sec.blocking_summary = Some("unauthenticated admin endpoint".into());

        let result = aggregate(&scores).unwrap();
        assert_eq!(result.decision, DecisionLabel::Reject);
        assert!(result.security_veto);
    }

    #[test]
    fn any_blocking_issue_rejects_even_without_security_veto() {
        let mut scores = all_at(0.95);
        let critic = scores
            .iter_mut()
            .find(|s| matches!(s.persona, crate::persona::Persona::Critic))
            .unwrap();
        critic.blocking_issues_present = true;
        critic.blocking_summary = Some("missing rollback plan".into());

        let result = aggregate(&scores).unwrap();
        assert_eq!(result.decision, DecisionLabel::Reject);
        assert!(!result.security_veto);
        assert!(result.any_blocking);
    }

    #[test]
    fn dissenting_persona_produces_minority_report() {
        let mut scores = all_at(0.9);
        let optimist = scores
            .iter_mut()
            .find(|s| matches!(s.persona, crate::persona::Persona::Optimist))
            .unwrap();
        optimist.confidence_score = 0.3;

        let result = aggregate(&scores).unwrap();
        assert_eq!(result.minority_reports.len(), 1);
        assert_eq!(result.minority_reports[0].persona_id, "optimist");
    }

    #[test]
    fn veto_dissenter_flagged_by_band_even_when_undercutting_delta_and_blocking_checks() {
        // security_guardian's own score bands to approve, but the veto it raised
        // drags the final decision to reject — its score delta from the weighted
        // confidence is small and its blocking issue is "addressed" by the reject,
        // so only the band-dissent trigger (a) catches it.
        let mut scores = vec![
            score(crate::persona::Persona::Architect, 0.90),
            score(crate::persona::Persona::Critic, 0.85),
            score(crate::persona::Persona::Optimist, 0.92),
            score(crate::persona::Persona::SecurityGuardian, 0.82),
            score(crate::persona::Persona::UserAdvocate, 0.88),
        ];
        let sec = scores
            .iter_mut()
            .find(|s| matches!(s.persona, crate::persona::Persona::SecurityGuardian))
            .unwrap();
        sec.security_concerns_present = true;
        sec.blocking_issues_present = true;
        sec.blocking_summary = Some("stores session tokens in plaintext".into());

        let result = aggregate(&scores).unwrap();
        assert_eq!(result.decision, DecisionLabel::Reject);
        assert!(result.security_veto);
        assert!(result
            .minority_reports
            .iter()
            .any(|r| r.persona_id == "security_guardian"));
    }

    #[test]
    fn score_breakdown_carries_one_entry_per_persona() {
        let result = aggregate(&all_at(0.8)).unwrap();
        assert_eq!(result.score_breakdown.weights.len(), 5);
        assert_eq!(result.score_breakdown.individual_scores.len(), 5);
        assert_eq!(result.score_breakdown.weighted_contributions.len(), 5);
    }

    #[test]
    fn boundary_confidence_at_approve_threshold_approves() {
        let result = aggregate(&all_at(APPROVE_THRESHOLD)).unwrap();
        assert_eq!(result.decision, DecisionLabel::Approve);
    }

    #[test]
    fn boundary_confidence_at_revise_threshold_revises() {
        let result = aggregate(&all_at(REVISE_THRESHOLD)).unwrap();
        assert_eq!(result.decision, DecisionLabel::Revise);
    }
}
