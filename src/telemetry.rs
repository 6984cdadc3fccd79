use anyhow::Result;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};
use uuid::Uuid;

use crate::config::ObservabilityConfig;

/// Initialize structured logging.
///
/// `RUST_LOG` wins over the configured level. JSON output carries the
/// current span and span list so every line can be tied to its session.
pub fn init_telemetry(observability: &ObservabilityConfig) -> Result<()> {
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(&observability.log_level))?;

    let registry = tracing_subscriber::registry().with(filter);
    if observability.json_logs {
        registry
            .with(
                tracing_subscriber::fmt::layer()
                    .json()
                    .with_current_span(true)
                    .with_span_list(true)
                    .with_writer(std::io::stderr),
            )
            .try_init()?;
    } else {
        registry
            .with(
                tracing_subscriber::fmt::layer()
                    .compact()
                    .with_target(false)
                    .with_writer(std::io::stderr),
            )
            .try_init()?;
    }

    tracing::info!(level = %observability.log_level, json = observability.json_logs, "ScanFlow telemetry initialized");
    Ok(())
}

/// Generate a correlation ID for linking related operations
pub fn generate_correlation_id() -> String {
    Uuid::new_v4().to_string()
}

/// Create the span every operation of one scan session runs in
pub fn create_session_span(session_id: &str, initial_mode: &str) -> tracing::Span {
    tracing::info_span!(
        "scan_session",
        session.id = session_id,
        session.initial_mode = initial_mode,
        correlation.id = %generate_correlation_id()
    )
}

/// Shutdown telemetry gracefully
pub fn shutdown_telemetry() {
    // Nothing is buffered by the fmt layers
    tracing::info!("ScanFlow telemetry shutdown complete");
}
