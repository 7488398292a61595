//! Presentation layer for quorum-review
//!
//! This crate contains the `quorum-cli` argument definitions and the
//! console/JSON formatters used to render run detail, run lists, and
//! proposal diffs. It depends only on `quorum-domain` and
//! `quorum-application` types — no concrete repository, broker, or LLM
//! adapter lives here.

pub mod cli;
pub mod output;
pub mod progress;

// Re-export commonly used types
pub use cli::commands::{Cli, Command, OutputFormat};
pub use output::{ConsoleFormatter, JsonFormatter, OutputFormatter as FormatterTrait};
pub use progress::{ProgressReporter, SimpleProgress};
