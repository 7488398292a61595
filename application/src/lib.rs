//! Application layer for the idea review quorum
//!
//! Use cases and port definitions that orchestrate the domain layer into
//! the enqueue, pipeline, and query flows described in spec.md §4 and §6.
//! Depends only on the domain layer and async/error-handling infrastructure
//! (tokio, async-trait, thiserror) — no concrete adapter lives here.

pub mod config;
pub mod ports;
pub mod use_cases;

pub use config::AppConfig;
pub use use_cases::aggregate_decision;
pub use use_cases::diff_runs::{DiffRunsError, DiffRunsUseCase};
pub use use_cases::enqueue::{EnqueueError, EnqueueService, EnqueuedRun};
pub use use_cases::execute_persona_review::{ExecutePersonaReviewUseCase, ReviewError, ReviewOutcome};
pub use use_cases::expand_proposal::{ExpandError, ExpandOutcome, ExpandProposalUseCase};
pub use use_cases::list_runs::{ListRunsError, ListRunsUseCase};
pub use use_cases::pipeline::{PipelineExecutor, PipelineOutcome, WorkerError};
pub use use_cases::revision_plan;
pub use use_cases::run_detail::{GetRunDetailUseCase, RunDetail, RunDetailError};
