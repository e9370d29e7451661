//! Solar Irradiance Dashboard API Server
//!
//! Serves filtered dataset slices, normalized series with moving averages, and
//! PV power predictions to the dashboard.

use axum::{
    extract::State,
    response::IntoResponse,
    routing::{get, post},
    Json, Router,
};
use dataset::{CityTable, Dataset, FilterService};
use feature_engine::FEATURE_SCHEMA_VERSION;
use inference_engine::{MockPredictor, Predictor, SubprocessPredictor};
use metrics_exporter_prometheus::PrometheusHandle;
use serde::Serialize;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Instant;
use tower::ServiceBuilder;
use tower_governor::GovernorLayer;
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing::info;

pub mod config;
pub mod error;
pub mod forecast;
pub mod rate_limit;
pub mod routes;
pub mod telemetry;

pub use crate::config::AppConfig;
pub use telemetry::init_logging;

use crate::config::PredictorMode;
use error::ApiError;
use forecast::ForecastClient;
use rate_limit::{create_governor_config, RateLimitConfig};

/// Application state shared across handlers; read-only after startup
pub struct AppState {
    /// Dataset snapshot and slice queries
    pub filter: FilterService,
    /// PV power model
    pub predictor: Arc<dyn Predictor>,
    /// Forecast source for forecast-driven predictions
    pub forecast: ForecastClient,
    /// Moving average window
    pub series_window: usize,
    /// Forecast hours returned per prediction
    pub forecast_hours: usize,
    /// Prometheus handle, when this process owns the recorder
    pub metrics: Option<PrometheusHandle>,
    /// Version string
    pub version: String,
    /// Start time
    pub start_time: Instant,
}

impl AppState {
    /// Create state with default window and forecast horizon
    pub fn new(filter: FilterService, predictor: Arc<dyn Predictor>, forecast: ForecastClient) -> Self {
        Self {
            filter,
            predictor,
            forecast,
            series_window: series_normalizer::DEFAULT_WINDOW,
            forecast_hours: 24,
            metrics: None,
            version: env!("CARGO_PKG_VERSION").to_string(),
            start_time: Instant::now(),
        }
    }

    /// Assemble state from configuration and a loaded dataset
    pub fn from_config(config: &AppConfig, dataset: Dataset) -> anyhow::Result<Self> {
        let cities = CityTable::new(config.dataset.cities.iter().map(|(name, id)| (name, id.clone())));
        let filter = FilterService::new(Arc::new(dataset), cities);

        let predictor: Arc<dyn Predictor> = match config.predictor.mode {
            PredictorMode::Subprocess => {
                Arc::new(SubprocessPredictor::new(config.predictor.subprocess.clone()))
            }
            PredictorMode::Mock => Arc::new(MockPredictor::default()),
        };

        let mut state = Self::new(filter, predictor, ForecastClient::new(&config.forecast)?);
        state.series_window = config.dataset.window;
        state.forecast_hours = config.forecast.hours;
        Ok(state)
    }
}

/// Health response
#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
    pub uptime_seconds: u64,
    pub dataset: DatasetHealth,
    pub predictor: String,
    /// Feature row layout sent to the predictor
    pub feature_schema_version: u32,
}

#[derive(Debug, Serialize)]
pub struct DatasetHealth {
    pub records: usize,
    pub source: Option<String>,
}

/// Create the application router.
///
/// When `rate_limit` is given, the prediction routes are limited per peer IP
/// and the router must be served with connect info.
pub fn create_router(state: Arc<AppState>, rate_limit: Option<&RateLimitConfig>) -> Router {
    let mut prediction_routes = Router::new()
        .route("/api/predict", post(routes::predictions::predict))
        .route("/api/forecast/predict", get(routes::predictions::predict_forecast));

    if let Some(config) = rate_limit.and_then(create_governor_config) {
        prediction_routes = prediction_routes.layer(GovernorLayer { config });
    }

    Router::new()
        .route("/api/v1/health", get(health_handler))
        .route("/api/irradiance", get(routes::irradiance::get_irradiance))
        .route(
            "/api/series",
            get(routes::irradiance::get_series).post(routes::irradiance::post_series),
        )
        .route("/metrics", get(metrics_handler))
        .merge(prediction_routes)
        .with_state(state)
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(CorsLayer::permissive()),
        )
}

/// Health check handler
async fn health_handler(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    let dataset = state.filter.dataset();
    Json(HealthResponse {
        status: "healthy".to_string(),
        version: state.version.clone(),
        uptime_seconds: state.start_time.elapsed().as_secs(),
        dataset: DatasetHealth {
            records: dataset.len(),
            source: dataset.source().map(|p| p.display().to_string()),
        },
        predictor: state.predictor.name().to_string(),
        feature_schema_version: FEATURE_SCHEMA_VERSION,
    })
}

/// Prometheus exposition
async fn metrics_handler(State(state): State<Arc<AppState>>) -> Result<String, ApiError> {
    state
        .metrics
        .as_ref()
        .map(|handle| handle.render())
        .ok_or_else(|| ApiError::NotFound("metrics recorder not installed".to_string()))
}

async fn shutdown_signal() {
    if tokio::signal::ctrl_c().await.is_ok() {
        info!("Shutdown signal received");
    }
}

/// Load the dataset and run the server until ctrl-c.
///
/// The dataset is loaded before the listener is bound; a load failure is fatal.
pub async fn run_server(config: AppConfig) -> anyhow::Result<()> {
    let dataset = Dataset::load(&config.dataset.path)?;

    let mut state = AppState::from_config(&config, dataset)?;
    state.metrics = telemetry::install_metrics_recorder();
    info!(
        "Predictor backend: {}, moving average window: {}",
        state.predictor.name(),
        state.series_window
    );

    let rate_limit = config.rate_limit.enabled.then_some(&config.rate_limit);
    let app = create_router(Arc::new(state), rate_limit);

    info!("Starting API server on {}", config.server.bind);
    let listener = tokio::net::TcpListener::bind(&config.server.bind).await?;
    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .with_graceful_shutdown(shutdown_signal())
    .await?;

    info!("API server stopped");
    Ok(())
}
