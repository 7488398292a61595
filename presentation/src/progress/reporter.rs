//! Progress reporting for `quorum-cli --watch`: a spinner that tracks a
//! run's status while the CLI polls `GET`-equivalent run detail reads.

use colored::Colorize;
use indicatif::{ProgressBar, ProgressStyle};
use quorum_domain::RunStatus;

/// Reports a run's progress with a spinner while `quorum-cli` polls for a
/// terminal state.
pub struct ProgressReporter {
    bar: ProgressBar,
}

impl ProgressReporter {
    pub fn new(run_id: &str) -> Self {
        let bar = ProgressBar::new_spinner();
        bar.set_style(
            ProgressStyle::default_spinner()
                .template("{spinner:.cyan} {prefix:.bold} {msg}")
                .unwrap(),
        );
        bar.set_prefix(format!("run {run_id}"));
        bar.enable_steady_tick(std::time::Duration::from_millis(120));
        Self { bar }
    }

    /// Called after every poll with the run's current lifecycle status and,
    /// once known, the current step being executed.
    pub fn on_poll(&self, status: RunStatus, current_step: Option<&str>) {
        let msg = match current_step {
            Some(step) => format!("{status} ({step})"),
            None => status.to_string(),
        };
        self.bar.set_message(msg);
    }

    pub fn finish_completed(&self, decision: &str, confidence: f64) {
        self.bar.finish_with_message(format!(
            "{} decision={} confidence={:.4}",
            "completed".green().bold(),
            decision,
            confidence
        ));
    }

    pub fn finish_failed(&self, error_message: &str) {
        self.bar
            .finish_with_message(format!("{} {}", "failed".red().bold(), error_message));
    }
}

/// Plain-text progress for non-interactive terminals (`--quiet` is not set
/// but color/tty detection says no fancy spinner).
pub struct SimpleProgress;

impl SimpleProgress {
    pub fn on_poll(&self, status: RunStatus, current_step: Option<&str>) {
        match current_step {
            Some(step) => println!("{} {} ({step})", "->".cyan(), status),
            None => println!("{} {}", "->".cyan(), status),
        }
    }

    pub fn finish_completed(&self, decision: &str, confidence: f64) {
        println!(
            "{} decision={} confidence={:.4}",
            "completed".green().bold(),
            decision,
            confidence
        );
    }

    pub fn finish_failed(&self, error_message: &str) {
        println!("{} {}", "failed".red().bold(), error_message);
    }
}
