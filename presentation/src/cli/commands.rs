//! CLI command definitions for `quorum-cli`, the operator tool that stands
//! in for the out-of-scope HTTP surface (spec.md §6): it enqueues runs and
//! inspects state directly against the store.

use clap::{Parser, Subcommand, ValueEnum};

/// Output format for command results.
#[derive(Debug, Clone, Copy, ValueEnum, Default)]
pub enum OutputFormat {
    /// Human-readable, colorized console output.
    #[default]
    Pretty,
    /// JSON output (the persisted/validated payloads, verbatim).
    Json,
}

/// CLI arguments for quorum-cli.
#[derive(Parser, Debug)]
#[command(name = "quorum-cli")]
#[command(author, version, about = "Operator tool for the idea review quorum")]
#[command(long_about = r#"
quorum-cli enqueues runs against the idea review quorum and inspects their
state directly against the store, standing in for the out-of-scope HTTP API.

Example:
  quorum-cli submit "Add a retry queue for failed webhook deliveries"
  quorum-cli status 3fa85f64-5717-4562-b3fc-2c963f66afa6 --watch
  quorum-cli list --status completed --decision approve
"#)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,

    /// Output format
    #[arg(short, long, value_enum, default_value = "pretty", global = true)]
    pub output: OutputFormat,

    /// Verbosity level (-v = info, -vv = debug, -vvv = trace)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Suppress progress indicators
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Path to a quorum.toml config file (merged over defaults and env)
    #[arg(long, global = true)]
    pub config: Option<String>,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Enqueue an initial run for a new idea (spec.md §4.8 "Initial").
    Submit {
        /// The idea to evaluate (1-10 sentences, <= 10,000 chars)
        idea: String,

        /// Optional extra context as free text or a path to a JSON file
        #[arg(long)]
        extra_context: Option<String>,

        /// Block and poll until the run reaches a terminal state
        #[arg(long)]
        watch: bool,
    },

    /// Enqueue a revision of a completed run (spec.md §4.8 "Revision").
    Revise {
        /// The parent run id; must be `completed`
        parent_run_id: String,

        /// Path to a JSON file holding the edited proposal fields
        #[arg(long)]
        edited_proposal: Option<String>,

        /// Free-text notes describing the edit
        #[arg(long)]
        edit_notes: Option<String>,

        /// Block and poll until the run reaches a terminal state
        #[arg(long)]
        watch: bool,
    },

    /// Show a run's full detail: proposal, reviews, decision, step progress.
    Status {
        /// The run id to inspect
        run_id: String,

        /// Poll every --interval-seconds until the run is completed/failed
        #[arg(long)]
        watch: bool,

        /// Poll interval while --watch is set
        #[arg(long, default_value = "2")]
        interval_seconds: u64,
    },

    /// List runs with optional filters (spec.md §6 `GET /v1/runs`).
    List {
        #[arg(long)]
        status: Option<String>,

        #[arg(long)]
        run_type: Option<String>,

        #[arg(long)]
        parent_run_id: Option<String>,

        #[arg(long)]
        decision: Option<String>,

        #[arg(long)]
        min_confidence: Option<f64>,

        #[arg(long, default_value = "20")]
        limit: u32,

        #[arg(long, default_value = "0")]
        offset: u32,
    },

    /// Show the structured proposal diff between two runs.
    Diff {
        run_id: String,
        other_run_id: String,
    },
}
