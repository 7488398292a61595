//! Postgres-backed persistence layer (spec.md §4.3).

pub mod decision_repository;
pub mod health;
pub mod models;
pub mod persona_review_repository;
pub mod pool;
pub mod proposal_repository;
pub mod run_repository;
pub mod step_progress_repository;

pub use decision_repository::PgDecisionRepository;
pub use persona_review_repository::PgPersonaReviewRepository;
pub use pool::connect;
pub use proposal_repository::PgProposalRepository;
pub use run_repository::PgRunRepository;
pub use step_progress_repository::PgStepProgressRepository;
