//! Pipeline worker entrypoint: wires the Postgres repositories, the Redis
//! Streams broker, the Bedrock LLM client, and the jsonschema registry into
//! a [`PipelineExecutor`], then drains the broker subscription until asked
//! to stop (spec.md §4.4, §4.7).

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use anyhow::Context;
use quorum_application::ports::job_broker::JobBroker;
use quorum_application::{ExecutePersonaReviewUseCase, ExpandProposalUseCase, PipelineExecutor};
use quorum_infrastructure::db::{
    PgDecisionRepository, PgPersonaReviewRepository, PgProposalRepository, PgRunRepository,
    PgStepProgressRepository,
};
use quorum_infrastructure::{BedrockLlmClient, ConfigLoader, RedisJobBroker, SchemaRegistry};
use tokio::sync::Semaphore;
use tracing::{error, info, warn};
use uuid::Uuid;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    quorum_infrastructure::logging::init_tracing(std::env::var("QUORUM_LOG_JSON").is_ok());

    quorum_domain::assert_weights_sum_to_one().context("persona weight panel is misconfigured")?;

    let config = ConfigLoader::new().load().context("failed to load configuration")?;
    info!(
        max_concurrency = config.worker.max_concurrency,
        subscription = %config.connections.broker_subscription,
        "starting quorum worker"
    );

    let pool = quorum_infrastructure::db::connect(&config.connections.database_url, 10)
        .await
        .context("failed to connect to postgres")?;

    let run_repo = Arc::new(PgRunRepository::new(pool.clone()));
    let proposal_repo = Arc::new(PgProposalRepository::new(pool.clone()));
    let review_repo = Arc::new(PgPersonaReviewRepository::new(pool.clone()));
    let decision_repo = Arc::new(PgDecisionRepository::new(pool.clone()));
    let step_repo = Arc::new(PgStepProgressRepository::new(pool.clone()));

    let schemas = Arc::new(SchemaRegistry::bootstrap().context("failed to compile schema registry")?);

    let llm = Arc::new(
        BedrockLlmClient::new(
            config.connections.aws_region.clone(),
            config.connections.aws_profile.clone(),
            schemas.clone(),
            config.llm.retry_initial_backoff_seconds,
            config.llm.retry_backoff_multiplier,
        )
        .await,
    );

    let expand_use_case = ExpandProposalUseCase::new(llm.clone(), schemas.clone());
    let review_use_case = ExecutePersonaReviewUseCase::new(llm.clone(), schemas.clone());

    let pipeline = Arc::new(PipelineExecutor::new(
        run_repo.clone(),
        proposal_repo.clone(),
        review_repo.clone(),
        decision_repo.clone(),
        step_repo.clone(),
        expand_use_case,
        review_use_case,
        schemas.clone(),
        config.llm.clone(),
        config.versioning.clone(),
        config.worker.clone(),
    ));

    let consumer_name = format!("worker-{}", Uuid::new_v4());
    let broker = Arc::new(
        RedisJobBroker::connect(
            &config.connections.redis_url,
            config.connections.broker_subscription.clone(),
            "quorum-workers".to_string(),
            consumer_name,
            config.worker.max_redeliveries,
        )
        .await
        .context("failed to connect to the job broker")?,
    );

    run_subscription_loop(broker, pipeline, config.worker.clone()).await;
    Ok(())
}

/// Pulls deliveries, dispatches each onto the concurrency semaphore, and
/// stops pulling new work once `shutdown_requested` flips — in-flight
/// handlers still get `shutdown_grace_seconds` to finish before the process
/// exits regardless (spec.md §4.7 graceful shutdown).
async fn run_subscription_loop(
    broker: Arc<RedisJobBroker>,
    pipeline: Arc<PipelineExecutor>,
    worker: quorum_application::config::WorkerConfig,
) {
    let shutdown_requested = Arc::new(AtomicBool::new(false));
    spawn_shutdown_listener(shutdown_requested.clone());

    let semaphore = Arc::new(Semaphore::new(worker.max_concurrency));
    let mut in_flight = Vec::new();

    loop {
        if shutdown_requested.load(Ordering::SeqCst) {
            break;
        }

        let available = semaphore.available_permits().max(1);
        let deliveries = match broker.receive(available, worker.ack_deadline_seconds).await {
            Ok(d) => d,
            Err(e) => {
                error!(error = %e, "failed to pull deliveries from broker, backing off");
                tokio::time::sleep(std::time::Duration::from_secs(2)).await;
                continue;
            }
        };

        if deliveries.is_empty() {
            tokio::time::sleep(std::time::Duration::from_millis(500)).await;
            continue;
        }

        for delivery in deliveries {
            let permit = semaphore.clone().acquire_owned().await.expect("semaphore never closed");
            let pipeline = pipeline.clone();
            let handle = tokio::spawn(async move {
                let _permit = permit;
                let envelope = delivery.envelope().clone();
                match pipeline.handle_message(&envelope).await {
                    Ok(outcome) => {
                        info!(run_id = %envelope.run_id, outcome = ?outcome, "run processed");
                        if let Err(e) = delivery.ack().await {
                            error!(run_id = %envelope.run_id, error = %e, "failed to ack delivery");
                        }
                    }
                    Err(e) => {
                        warn!(run_id = %envelope.run_id, error = %e, "pipeline handler failed, nacking");
                        if let Err(e) = delivery.nack().await {
                            error!(run_id = %envelope.run_id, error = %e, "failed to nack delivery");
                        }
                    }
                }
            });
            in_flight.push(handle);
        }

        in_flight.retain(|h| !h.is_finished());
    }

    info!(
        grace_seconds = worker.shutdown_grace_seconds,
        "shutdown requested, draining in-flight work"
    );
    let grace = std::time::Duration::from_secs(worker.shutdown_grace_seconds);
    let _ = tokio::time::timeout(grace, futures::future::join_all(in_flight)).await;
    info!("worker shut down");
}

#[cfg(unix)]
fn spawn_shutdown_listener(flag: Arc<AtomicBool>) {
    tokio::spawn(async move {
        let mut sigterm = tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())
            .expect("failed to install SIGTERM handler");
        tokio::select! {
            _ = sigterm.recv() => {}
            _ = tokio::signal::ctrl_c() => {}
        }
        flag.store(true, Ordering::SeqCst);
    });
}

#[cfg(not(unix))]
fn spawn_shutdown_listener(flag: Arc<AtomicBool>) {
    tokio::spawn(async move {
        let _ = tokio::signal::ctrl_c().await;
        flag.store(true, Ordering::SeqCst);
    });
}
