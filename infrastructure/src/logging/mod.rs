//! Structured logging setup (spec.md §6 "Logging")
//!
//! Every pipeline log line carries `run_id`, and step-scoped spans add
//! `step_name`/`persona_id` — set up once at process start via
//! [`tracing::Span`] fields on the spans the worker/CLI open, not here.

use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{fmt, EnvFilter, Registry};

fn env_filter() -> EnvFilter {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"))
}

/// Initialize the global tracing subscriber from `RUST_LOG` (defaulting to
/// `info`), writing to stdout as JSON (for the worker) or compact text (for
/// the interactive CLI).
pub fn init_tracing(json: bool) {
    let subscriber = fmt().with_env_filter(env_filter()).with_target(false);
    if json {
        subscriber.json().init();
    } else {
        subscriber.init();
    }
}

/// Initialize tracing with a non-blocking rolling file appender in addition
/// to stdout, for long-running worker processes. Returns the guard that
/// must be held for the lifetime of the process to flush buffered writes.
pub fn init_tracing_with_file(
    json: bool,
    log_dir: &std::path::Path,
    file_name_prefix: &str,
) -> tracing_appender::non_blocking::WorkerGuard {
    let file_appender = tracing_appender::rolling::daily(log_dir, file_name_prefix);
    let (non_blocking, guard) = tracing_appender::non_blocking(file_appender);

    let stdout_layer = fmt::layer().with_target(false);
    let file_layer = fmt::layer()
        .with_target(false)
        .with_writer(non_blocking)
        .with_ansi(false);

    let registry = Registry::default().with(env_filter());

    if json {
        registry.with(stdout_layer.json()).with(file_layer.json()).init();
    } else {
        registry.with(stdout_layer).with(file_layer).init();
    }

    guard
}
