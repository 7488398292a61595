//! Progress reporting for long-running `--watch` polls.

pub mod reporter;

pub use reporter::{ProgressReporter, SimpleProgress};
