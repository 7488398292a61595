//! Console output formatters for `quorum-cli` run results.

use colored::Colorize;
use quorum_application::{EnqueuedRun, RunDetail};
use quorum_domain::{DecisionLabel, ProposalDiff, Run, RunStatus};

use crate::output::formatter::OutputFormatter;

/// Human-readable, colorized console output.
pub struct ConsoleFormatter;

impl ConsoleFormatter {
    fn status_badge(status: RunStatus) -> colored::ColoredString {
        match status {
            RunStatus::Queued => "queued".yellow(),
            RunStatus::Running => "running".cyan(),
            RunStatus::Completed => "completed".green(),
            RunStatus::Failed => "failed".red(),
        }
    }

    fn decision_badge(label: DecisionLabel) -> colored::ColoredString {
        match label {
            DecisionLabel::Approve => "approve".green().bold(),
            DecisionLabel::Revise => "revise".yellow().bold(),
            DecisionLabel::Reject => "reject".red().bold(),
        }
    }

    fn header(title: &str) -> String {
        format!("{}\n{}\n", title.bold(), "=".repeat(title.len()))
    }
}

impl OutputFormatter for ConsoleFormatter {
    fn format_enqueued(&self, enqueued: &EnqueuedRun) -> String {
        let mut out = String::new();
        out.push_str(&Self::header("Run enqueued"));
        out.push_str(&format!("{} {}\n", "Run ID:".cyan().bold(), enqueued.run_id));
        out.push_str(&format!("{} {}\n", "Type:".cyan().bold(), enqueued.run_type));
        out.push_str(&format!(
            "{} {}\n",
            "Status:".cyan().bold(),
            Self::status_badge(enqueued.status)
        ));
        out.push_str(&format!("{} {}\n", "Priority:".cyan().bold(), enqueued.priority));
        out.push_str(&format!(
            "{} {}\n",
            "Queued at:".cyan().bold(),
            enqueued.queued_at.to_rfc3339()
        ));
        out
    }

    fn format_run_detail(&self, detail: &RunDetail) -> String {
        let run = &detail.run;
        let mut out = String::new();

        out.push_str(&Self::header(&format!("Run {}", run.id)));
        out.push_str(&format!(
            "{} {}   {} {}   {} {}\n",
            "status:".cyan().bold(),
            Self::status_badge(run.status),
            "type:".cyan().bold(),
            run.run_type,
            "retries:".cyan().bold(),
            run.retry_count
        ));
        if let Some(parent) = run.parent_run_id {
            out.push_str(&format!("{} {}\n", "parent run:".cyan().bold(), parent));
        }
        out.push_str(&format!("\n{}\n{}\n", "Idea:".cyan().bold(), run.input_idea));

        if let Some(err) = &run.error_message {
            out.push_str(&format!("\n{} {}\n", "Error:".red().bold(), err));
        }

        if let Some(proposal) = &detail.proposal {
            out.push_str(&format!("\n{}\n", "Expanded Proposal".bold()));
            if let Some(title) = &proposal.expanded.title {
                out.push_str(&format!("  {} {}\n", "Title:".cyan(), title));
            }
            out.push_str(&format!(
                "  {} {}\n",
                "Problem:".cyan(),
                proposal.expanded.problem_statement
            ));
            out.push_str(&format!(
                "  {} {}\n",
                "Solution:".cyan(),
                proposal.expanded.proposed_solution
            ));
            if !proposal.expanded.assumptions.is_empty() {
                out.push_str(&format!("  {}\n", "Assumptions:".cyan()));
                for a in &proposal.expanded.assumptions {
                    out.push_str(&format!("    - {a}\n"));
                }
            }
            if !proposal.expanded.scope_non_goals.is_empty() {
                out.push_str(&format!("  {}\n", "Non-goals:".cyan()));
                for n in &proposal.expanded.scope_non_goals {
                    out.push_str(&format!("    - {n}\n"));
                }
            }
            if let Some(diff) = &proposal.diff {
                out.push_str(&format!(
                    "  {} {} field(s) changed from parent\n",
                    "Diff:".cyan(),
                    diff.num_changes
                ));
            }
        }

        if !detail.reviews.is_empty() {
            out.push_str(&format!("\n{}\n", "Persona Reviews".bold()));
            for review in &detail.reviews {
                let reused = if review.provenance.reused { " (reused)".dimmed() } else { "".normal() };
                out.push_str(&format!(
                    "  {} score={:.2}{}\n",
                    format!("{}:", review.persona.display_name()).yellow().bold(),
                    review.review.confidence_score,
                    reused
                ));
                if review.review.blocking_issues_present() {
                    for issue in &review.review.blocking_issues {
                        let tag = if issue.security_critical { " [security]".red() } else { "".normal() };
                        out.push_str(&format!("    ! {}{}\n", issue.text, tag));
                    }
                }
            }
        }

        if !detail.step_progress.is_empty() {
            out.push_str(&format!("\n{}\n", "Step Progress".bold()));
            let mut steps = detail.step_progress.clone();
            steps.sort_by_key(|s| s.step_order);
            for step in &steps {
                let badge = match step.status {
                    quorum_domain::StepStatus::Pending => "pending".dimmed(),
                    quorum_domain::StepStatus::Running => "running".cyan(),
                    quorum_domain::StepStatus::Completed => "completed".green(),
                    quorum_domain::StepStatus::Failed => "failed".red(),
                };
                out.push_str(&format!("  {:<28} {}\n", step.step_name.as_str(), badge));
            }
        }

        if let Some(decision) = &detail.decision {
            out.push_str(&format!("\n{}\n", "Decision".bold()));
            out.push_str(&format!(
                "  {} (confidence {:.4})\n",
                Self::decision_badge(decision.decision.decision),
                decision.decision.weighted_confidence
            ));
            if decision.decision.security_veto {
                out.push_str(&format!("  {}\n", "security veto triggered".red().bold()));
            }
            if !decision.decision.minority_reports.is_empty() {
                out.push_str(&format!("  {}\n", "Minority reports:".yellow()));
                for mr in &decision.decision.minority_reports {
                    out.push_str(&format!(
                        "    - {} (score {:.2}){}\n",
                        mr.persona_name,
                        mr.confidence_score,
                        mr.blocking_summary
                            .as_ref()
                            .map(|s| format!(": {s}"))
                            .unwrap_or_default()
                    ));
                }
            }
        }

        out
    }

    fn format_run_list(&self, runs: &[Run]) -> String {
        let mut out = String::new();
        out.push_str(&Self::header(&format!("Runs ({})", runs.len())));
        out.push_str(&format!(
            "{:<38} {:<10} {:<10} {:<10} {:<9}\n",
            "ID", "STATUS", "TYPE", "DECISION", "CONFIDENCE"
        ));
        for run in runs {
            out.push_str(&format!(
                "{:<38} {:<10} {:<10} {:<10} {}\n",
                run.id.to_string(),
                Self::status_badge(run.status),
                run.run_type.to_string(),
                run.decision_label.map(|d| d.to_string()).unwrap_or_else(|| "-".into()),
                run.overall_weighted_confidence
                    .map(|c| format!("{c:.4}"))
                    .unwrap_or_else(|| "-".into()),
            ));
        }
        out
    }

    fn format_diff(&self, diff: &ProposalDiff) -> String {
        let mut out = String::new();
        out.push_str(&Self::header(&format!("Diff ({} field(s) changed)", diff.num_changes)));
        for field in &diff.changed_fields {
            out.push_str(&format!("\n{}\n", field.field.yellow().bold()));
            out.push_str(&format!("  {} {}\n", "-".red(), field.before));
            out.push_str(&format!("  {} {}\n", "+".green(), field.after));
        }
        out
    }
}

/// JSON output: the validated payloads, serialized verbatim.
pub struct JsonFormatter;

impl OutputFormatter for JsonFormatter {
    fn format_enqueued(&self, enqueued: &EnqueuedRun) -> String {
        serde_json::to_string_pretty(enqueued).expect("EnqueuedRun is always serializable")
    }

    fn format_run_detail(&self, detail: &RunDetail) -> String {
        serde_json::to_string_pretty(detail).expect("RunDetail is always serializable")
    }

    fn format_run_list(&self, runs: &[Run]) -> String {
        serde_json::to_string_pretty(runs).expect("Vec<Run> is always serializable")
    }

    fn format_diff(&self, diff: &ProposalDiff) -> String {
        serde_json::to_string_pretty(diff).expect("ProposalDiff is always serializable")
    }
}
