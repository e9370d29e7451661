//! Logging and metrics setup

use crate::config::LoggingConfig;
use metrics_exporter_prometheus::{PrometheusBuilder, PrometheusHandle};
use tracing::warn;
use tracing_subscriber::EnvFilter;

pub const IRRADIANCE_QUERIES: &str = "irradiance_queries_total";
pub const SERIES_RECORDS_DROPPED: &str = "series_records_dropped_total";
pub const PREDICTIONS: &str = "predictions_total";
pub const PREDICTION_FAILURES: &str = "prediction_failures_total";
pub const PREDICTOR_LATENCY: &str = "predictor_latency_seconds";

/// Initialize logging; `RUST_LOG` overrides the configured level
pub fn init_logging(config: &LoggingConfig) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(&config.level))
        .unwrap_or_else(|_| EnvFilter::new("info"));

    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true);

    if config.json {
        builder.json().try_init()
    } else {
        builder.try_init()
    }
}

/// Install the global Prometheus recorder.
///
/// Returns `None` if a recorder is already installed; metrics calls are then
/// no-ops or go to the existing recorder.
pub fn install_metrics_recorder() -> Option<PrometheusHandle> {
    match PrometheusBuilder::new().install_recorder() {
        Ok(handle) => Some(handle),
        Err(e) => {
            warn!("Metrics recorder not installed: {}", e);
            None
        }
    }
}
