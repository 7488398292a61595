//! Persona panel: the fixed, weighted set of reviewer roles

use crate::error::DomainError;
use crate::ids::RunId;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// One of the five fixed reviewer roles. The panel's composition is
/// immutable — no persona is added, removed, or reweighted at runtime.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Persona {
    Architect,
    Critic,
    Optimist,
    SecurityGuardian,
    UserAdvocate,
}

/// Fixed panel order, also the iteration order used when building a
/// complete review set.
pub const PERSONAS: [Persona; 5] = [
    Persona::Architect,
    Persona::Critic,
    Persona::Optimist,
    Persona::SecurityGuardian,
    Persona::UserAdvocate,
];

impl Persona {
    /// Stable slug used as `persona_id` everywhere it's persisted.
    pub fn id(&self) -> &'static str {
        match self {
            Persona::Architect => "architect",
            Persona::Critic => "critic",
            Persona::Optimist => "optimist",
            Persona::SecurityGuardian => "security_guardian",
            Persona::UserAdvocate => "user_advocate",
        }
    }

    pub fn display_name(&self) -> &'static str {
        match self {
            Persona::Architect => "Architect",
            Persona::Critic => "Critic",
            Persona::Optimist => "Optimist",
            Persona::SecurityGuardian => "Security Guardian",
            Persona::UserAdvocate => "User Advocate",
        }
    }

    /// Weight in the weighted-confidence aggregation. Fixed by spec.md §4.5.
    pub fn weight(&self) -> f64 {
        match self {
            Persona::Architect => 0.25,
            Persona::Critic => 0.25,
            Persona::Optimist => 0.15,
            Persona::SecurityGuardian => 0.20,
            Persona::UserAdvocate => 0.15,
        }
    }

    /// The canonical `S_CANON` step name for this persona's review.
    pub fn step_name(&self) -> &'static str {
        match self {
            Persona::Architect => "review_architect",
            Persona::Critic => "review_critic",
            Persona::Optimist => "review_optimist",
            Persona::SecurityGuardian => "review_security_guardian",
            Persona::UserAdvocate => "review_user_advocate",
        }
    }

    pub fn from_id(id: &str) -> Result<Self, DomainError> {
        match id {
            "architect" => Ok(Persona::Architect),
            "critic" => Ok(Persona::Critic),
            "optimist" => Ok(Persona::Optimist),
            "security_guardian" => Ok(Persona::SecurityGuardian),
            "user_advocate" => Ok(Persona::UserAdvocate),
            other => Err(DomainError::UnknownPersona(other.to_string())),
        }
    }
}

/// Startup assertion (spec.md invariant 7): persona weights must sum to
/// exactly 1.0.
pub fn assert_weights_sum_to_one() -> Result<(), DomainError> {
    let sum: f64 = PERSONAS.iter().map(|p| p.weight()).sum();
    if (sum - 1.0).abs() > 1e-9 {
        return Err(DomainError::PersonaWeightsInvalid(sum));
    }
    Ok(())
}

/// A single blocking concern raised in a review.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BlockingIssue {
    pub text: String,
    #[serde(default)]
    pub security_critical: bool,
}

/// A non-blocking concern raised in a review.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Concern {
    pub text: String,
    pub is_blocking: bool,
}

/// A risk tied to an external dependency or assumption.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DependencyRisk {
    pub description: String,
    #[serde(default)]
    pub severity: Option<String>,
}

/// The structured output of a single persona review, validated against the
/// `PersonaReview@1.0.0` schema before it is ever persisted.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReviewPayload {
    pub confidence_score: f64,
    #[serde(default)]
    pub strengths: Vec<String>,
    #[serde(default)]
    pub concerns: Vec<Concern>,
    #[serde(default)]
    pub recommendations: Vec<String>,
    #[serde(default)]
    pub blocking_issues: Vec<BlockingIssue>,
    pub estimated_effort: String,
    #[serde(default)]
    pub dependency_risks: Vec<DependencyRisk>,
}

impl ReviewPayload {
    pub fn blocking_issues_present(&self) -> bool {
        !self.blocking_issues.is_empty()
    }

    pub fn security_concerns_present(&self) -> bool {
        self.blocking_issues.iter().any(|b| b.security_critical)
    }
}

/// Model/prompt parameters recorded alongside a review for audit.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PromptParameters {
    pub model: String,
    pub temperature: f64,
    pub persona_template_version: String,
    pub attempt_count: u32,
}

/// Provenance for a review that was copied forward from a parent run
/// instead of freshly executed (spec.md §4.6 step 3).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReuseProvenance {
    pub reused: bool,
    pub source_run_id: Option<RunId>,
}

impl Default for ReuseProvenance {
    fn default() -> Self {
        Self {
            reused: false,
            source_run_id: None,
        }
    }
}

/// One persona's review of one Run's proposal. Unique on (run_id, persona_id).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PersonaReview {
    pub run_id: RunId,
    pub persona: Persona,
    pub review: ReviewPayload,
    pub prompt_parameters: PromptParameters,
    pub provenance: ReuseProvenance,
    pub created_at: DateTime<Utc>,
}

impl PersonaReview {
    pub fn new(
        run_id: RunId,
        persona: Persona,
        review: ReviewPayload,
        prompt_parameters: PromptParameters,
    ) -> Self {
        Self {
            run_id,
            persona,
            review,
            prompt_parameters,
            provenance: ReuseProvenance::default(),
            created_at: Utc::now(),
        }
    }

    pub fn reused_from(mut self, source_run_id: RunId) -> Self {
        self.provenance = ReuseProvenance {
            reused: true,
            source_run_id: Some(source_run_id),
        };
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn weights_sum_to_one() {
        assert!(assert_weights_sum_to_one().is_ok());
    }

    #[test]
    fn persona_ids_round_trip() {
        for p in PERSONAS {
            assert_eq!(Persona::from_id(p.id()).unwrap(), p);
        }
    }

    #[test]
    fn unknown_persona_id_errors() {
        assert!(Persona::from_id("nonexistent").is_err());
    }

    #[test]
    fn security_concerns_detected_only_on_critical_blocking_issue() {
        let review = ReviewPayload {
            confidence_score: 0.9,
            strengths: vec![],
            concerns: vec![],
            recommendations: vec![],
            blocking_issues: vec![BlockingIssue {
                text: "sql injection risk".into(),
                security_critical: true,
            }],
            estimated_effort: "small".into(),
            dependency_risks: vec![],
        };
        assert!(review.blocking_issues_present());
        assert!(review.security_concerns_present());
    }
}
