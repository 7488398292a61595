//! Domain layer for the idea review quorum
//!
//! This crate contains the core business logic, entities, and value objects
//! for turning a short idea into an expanded proposal, gathering five
//! weighted persona reviews, and aggregating them into a decision. It has
//! no dependencies on infrastructure or presentation concerns.

pub mod aggregation;
pub mod decision;
pub mod error;
pub mod ids;
pub mod persona;
pub mod proposal;
pub mod revision;
pub mod run;
pub mod step;
pub mod validation;

// Re-export commonly used types
pub use aggregation::{aggregate, APPROVE_THRESHOLD, MINORITY_DELTA, REVISE_THRESHOLD};
pub use decision::{Decision, DecisionJson, MinorityReport, PersonaScore, ScoreBreakdown};
pub use error::DomainError;
pub use ids::RunId;
pub use persona::{
    assert_weights_sum_to_one, BlockingIssue, Concern, DependencyRisk, Persona, PersonaReview,
    PromptParameters, ReuseProvenance, ReviewPayload, PERSONAS,
};
pub use proposal::{ChangedField, ExpandedProposal, ProposalDiff, ProposalVersion};
pub use revision::{diff_proposals, select_personas_to_rerun, PriorReviewFacts, RERUN_CONFIDENCE_THRESHOLD};
pub use run::{DecisionLabel, Priority, Run, RunParameters, RunStatus, RunType};
pub use step::{StepName, StepProgress, StepStatus, S_CANON};
pub use validation::{validate_extra_context, validate_idea};
