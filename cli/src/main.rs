//! CLI entrypoint for quorum-cli
//!
//! Wires the Postgres repositories and, for the enqueue subcommands, the
//! Redis broker, into the application layer's use cases — the same
//! dependency-injection shape `worker/src/main.rs` uses, minus the LLM
//! client and schema registry this binary never calls.

use std::sync::Arc;

use anyhow::{bail, Context, Result};
use chrono::Utc;
use clap::Parser;
use quorum_application::ports::run_repository::RunListFilter;
use quorum_application::{DiffRunsUseCase, EnqueueService, GetRunDetailUseCase, ListRunsUseCase};
use quorum_domain::{DecisionLabel, RunId, RunStatus, RunType};
use quorum_infrastructure::db::{
    PgDecisionRepository, PgPersonaReviewRepository, PgProposalRepository, PgRunRepository,
    PgStepProgressRepository,
};
use quorum_infrastructure::{ConfigLoader, RedisJobBroker};
use quorum_presentation::cli::Command;
use quorum_presentation::{Cli, ConsoleFormatter, FormatterTrait, JsonFormatter, OutputFormat, ProgressReporter};
use tracing_subscriber::EnvFilter;
use uuid::Uuid;

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let filter = match cli.verbose {
        0 => EnvFilter::new("warn"),
        1 => EnvFilter::new("info"),
        2 => EnvFilter::new("debug"),
        _ => EnvFilter::new("trace"),
    };
    tracing_subscriber::fmt().with_env_filter(filter).with_target(false).init();

    let mut loader = ConfigLoader::new();
    if let Some(path) = &cli.config {
        loader = loader.with_explicit_path(path.clone());
    }
    let config = loader.load().context("failed to load configuration")?;

    let pool = quorum_infrastructure::db::connect(&config.connections.database_url, 5)
        .await
        .context("failed to connect to postgres")?;

    let run_repo = Arc::new(PgRunRepository::new(pool.clone()));
    let proposal_repo = Arc::new(PgProposalRepository::new(pool.clone()));
    let review_repo = Arc::new(PgPersonaReviewRepository::new(pool.clone()));
    let decision_repo = Arc::new(PgDecisionRepository::new(pool.clone()));
    let step_repo = Arc::new(PgStepProgressRepository::new(pool.clone()));

    let formatter: Box<dyn FormatterTrait> = match cli.output {
        OutputFormat::Pretty => Box::new(ConsoleFormatter),
        OutputFormat::Json => Box::new(JsonFormatter),
    };

    match cli.command {
        Command::Submit { idea, extra_context, watch } => {
            let broker = connect_broker(&config).await?;
            let enqueue = EnqueueService::new(run_repo.clone(), proposal_repo.clone(), step_repo.clone(), broker);

            let extra_context = extra_context.map(|raw| read_json_or_string(&raw)).transpose()?;
            let enqueued = enqueue
                .enqueue_initial(&idea, extra_context, &config.llm, &config.versioning)
                .await?;

            println!("{}", formatter.format_enqueued(&enqueued));

            if watch {
                watch_run(enqueued.run_id, &run_repo, &proposal_repo, &review_repo, &decision_repo, &step_repo, &formatter, cli.quiet).await?;
            }
        }

        Command::Revise { parent_run_id, edited_proposal, edit_notes, watch } => {
            let broker = connect_broker(&config).await?;
            let enqueue = EnqueueService::new(run_repo.clone(), proposal_repo.clone(), step_repo.clone(), broker);

            let parent_run_id = parse_run_id(&parent_run_id)?;
            let edited_proposal = edited_proposal.map(|raw| read_json_or_string(&raw)).transpose()?;

            let enqueued = enqueue
                .enqueue_revision(parent_run_id, edited_proposal, edit_notes, &config.llm, &config.versioning)
                .await?;

            println!("{}", formatter.format_enqueued(&enqueued));

            if watch {
                watch_run(enqueued.run_id, &run_repo, &proposal_repo, &review_repo, &decision_repo, &step_repo, &formatter, cli.quiet).await?;
            }
        }

        Command::Status { run_id, watch, interval_seconds } => {
            let run_id = parse_run_id(&run_id)?;
            if watch {
                watch_run_with_interval(
                    run_id, &run_repo, &proposal_repo, &review_repo, &decision_repo, &step_repo, &formatter, cli.quiet, interval_seconds,
                )
                .await?;
            } else {
                let use_case = GetRunDetailUseCase::new(
                    run_repo.clone(), proposal_repo.clone(), review_repo.clone(), decision_repo.clone(), step_repo.clone(),
                );
                let detail = use_case.execute(run_id).await?;
                println!("{}", formatter.format_run_detail(&detail));
            }
        }

        Command::List { status, run_type, parent_run_id, decision, min_confidence, limit, offset } => {
            let filter = RunListFilter {
                status: status.map(|s| s.parse::<RunStatus>()).transpose().map_err(|e| anyhow::anyhow!(e))?,
                run_type: run_type.map(|s| s.parse::<RunType>()).transpose().map_err(|e| anyhow::anyhow!(e))?,
                parent_run_id: parent_run_id.map(|s| parse_run_id(&s)).transpose()?,
                decision: decision.map(|s| s.parse::<DecisionLabel>()).transpose().map_err(|e| anyhow::anyhow!(e))?,
                min_confidence,
                created_after: None,
                created_before: None,
            };

            let use_case = ListRunsUseCase::new(run_repo.clone());
            let runs = use_case.execute(filter, limit, offset).await?;
            println!("{}", formatter.format_run_list(&runs));
        }

        Command::Diff { run_id, other_run_id } => {
            let use_case = DiffRunsUseCase::new(proposal_repo.clone());
            let diff = use_case.execute(parse_run_id(&run_id)?, parse_run_id(&other_run_id)?).await?;
            println!("{}", formatter.format_diff(&diff));
        }
    }

    Ok(())
}

fn parse_run_id(raw: &str) -> Result<RunId> {
    Ok(RunId::from(Uuid::parse_str(raw).with_context(|| format!("invalid run id: {raw}"))?))
}

/// Accepts either a path to a JSON file or an inline string; a path whose
/// contents parse as JSON is read structured, anything else is wrapped as a
/// plain string value (spec.md §3 `extra_context` is "string or structured
/// map").
fn read_json_or_string(raw: &str) -> Result<serde_json::Value> {
    if let Ok(contents) = std::fs::read_to_string(raw) {
        if let Ok(value) = serde_json::from_str::<serde_json::Value>(&contents) {
            return Ok(value);
        }
        return Ok(serde_json::Value::String(contents));
    }
    if let Ok(value) = serde_json::from_str::<serde_json::Value>(raw) {
        return Ok(value);
    }
    Ok(serde_json::Value::String(raw.to_string()))
}

async fn connect_broker(config: &quorum_application::AppConfig) -> Result<Arc<RedisJobBroker>> {
    Ok(Arc::new(
        RedisJobBroker::connect(
            &config.connections.redis_url,
            config.connections.broker_subscription.clone(),
            "quorum-workers".to_string(),
            format!("quorum-cli-{}", Uuid::new_v4()),
            config.worker.max_redeliveries,
        )
        .await
        .context("failed to connect to the job broker")?,
    ))
}

#[allow(clippy::too_many_arguments)]
async fn watch_run(
    run_id: RunId,
    run_repo: &Arc<PgRunRepository>,
    proposal_repo: &Arc<PgProposalRepository>,
    review_repo: &Arc<PgPersonaReviewRepository>,
    decision_repo: &Arc<PgDecisionRepository>,
    step_repo: &Arc<PgStepProgressRepository>,
    formatter: &dyn FormatterTrait,
    quiet: bool,
) -> Result<()> {
    watch_run_with_interval(run_id, run_repo, proposal_repo, review_repo, decision_repo, step_repo, formatter, quiet, 2).await
}

/// Polls `GET`-equivalent run detail reads until the run reaches a terminal
/// state, printing a spinner unless `quiet` is set.
#[allow(clippy::too_many_arguments)]
async fn watch_run_with_interval(
    run_id: RunId,
    run_repo: &Arc<PgRunRepository>,
    proposal_repo: &Arc<PgProposalRepository>,
    review_repo: &Arc<PgPersonaReviewRepository>,
    decision_repo: &Arc<PgDecisionRepository>,
    step_repo: &Arc<PgStepProgressRepository>,
    formatter: &dyn FormatterTrait,
    quiet: bool,
    interval_seconds: u64,
) -> Result<()> {
    let use_case = GetRunDetailUseCase::new(
        run_repo.clone(), proposal_repo.clone(), review_repo.clone(), decision_repo.clone(), step_repo.clone(),
    );

    let reporter = (!quiet).then(|| ProgressReporter::new(&run_id.to_string()));
    let started = Utc::now();

    loop {
        let detail = use_case.execute(run_id).await?;
        let current_step = detail
            .step_progress
            .iter()
            .find(|s| s.status != quorum_domain::StepStatus::Completed)
            .map(|s| s.step_name.as_str());

        if let Some(reporter) = &reporter {
            reporter.on_poll(detail.run.status, current_step);
        }

        match detail.run.status {
            RunStatus::Completed => {
                let decision = detail.decision.as_ref().expect("completed run has a decision");
                if let Some(reporter) = &reporter {
                    reporter.finish_completed(&decision.decision.decision.to_string(), decision.decision.weighted_confidence);
                }
                println!("{}", formatter.format_run_detail(&detail));
                return Ok(());
            }
            RunStatus::Failed => {
                let message = detail.run.error_message.clone().unwrap_or_else(|| "unknown error".into());
                if let Some(reporter) = &reporter {
                    reporter.finish_failed(&message);
                }
                println!("{}", formatter.format_run_detail(&detail));
                bail!("run {run_id} failed: {message}");
            }
            _ => {
                if Utc::now().signed_duration_since(started).num_hours() >= 2 {
                    bail!("timed out watching run {run_id} after 2 hours");
                }
                tokio::time::sleep(std::time::Duration::from_secs(interval_seconds)).await;
            }
        }
    }
}
