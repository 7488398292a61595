//! Output formatting traits shared by `quorum-cli`'s pretty and JSON modes.

use quorum_application::{EnqueuedRun, RunDetail};
use quorum_domain::{ProposalDiff, Run};

/// Formats the results `quorum-cli` prints for each subcommand.
pub trait OutputFormatter {
    fn format_enqueued(&self, enqueued: &EnqueuedRun) -> String;
    fn format_run_detail(&self, detail: &RunDetail) -> String;
    fn format_run_list(&self, runs: &[Run]) -> String;
    fn format_diff(&self, diff: &ProposalDiff) -> String;
}
