//! Structured logging configuration
//!
//! Provides:
//! - JSON output for machine consumption
//! - Pretty or compact formatting for terminals
//! - Optional daily-rolling file output
//! - `RUST_LOG` taking precedence over the configured level
//!
//! Console output always goes to stderr so the report on stdout stays clean.

use crate::config::LoggingConfig;
use std::path::Path;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{
    fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter, Layer, Registry,
};
use uuid::Uuid;

const LOG_FILE_NAME: &str = "traffic-analyzer.log";

type BoxedLayer = Box<dyn Layer<Registry> + Send + Sync + 'static>;

/// Initialize the logging system.
///
/// The returned guard flushes the file appender on drop and must be held for
/// the lifetime of the program when file output is enabled.
pub fn init_logging(config: &LoggingConfig, log_dir: &Path) -> Option<WorkerGuard> {
    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&config.level));

    let mut layers: Vec<BoxedLayer> = Vec::new();
    let mut guard = None;

    if matches!(config.output.as_str(), "console" | "both") {
        layers.push(console_layer(&config.format));
    }

    if matches!(config.output.as_str(), "file" | "both") {
        let file_appender = tracing_appender::rolling::daily(log_dir, LOG_FILE_NAME);
        let (non_blocking, file_guard) = tracing_appender::non_blocking(file_appender);
        guard = Some(file_guard);

        let layer = match config.format.as_str() {
            "json" => fmt::layer()
                .json()
                .with_writer(non_blocking)
                .with_current_span(true)
                .with_span_list(true)
                .boxed(),
            _ => fmt::layer()
                .with_writer(non_blocking)
                .with_ansi(false)
                .boxed(),
        };
        layers.push(layer);
    }

    // A subscriber may already be installed, e.g. by a test harness.
    let _ = tracing_subscriber::registry()
        .with(layers)
        .with(env_filter)
        .try_init();

    guard
}

fn console_layer(format: &str) -> BoxedLayer {
    match format {
        "json" => fmt::layer()
            .json()
            .with_writer(std::io::stderr)
            .with_current_span(true)
            .with_span_list(true)
            .with_target(true)
            .with_file(true)
            .with_line_number(true)
            .boxed(),
        "pretty" => fmt::layer()
            .with_writer(std::io::stderr)
            .with_target(true)
            .pretty()
            .boxed(),
        _ => fmt::layer()
            .with_writer(std::io::stderr)
            .with_target(false)
            .compact()
            .boxed(),
    }
}

/// Identifier attached to every analysis span.
pub fn new_run_id() -> String {
    Uuid::new_v4().to_string()
}
