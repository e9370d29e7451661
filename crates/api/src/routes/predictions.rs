//! Prediction Routes

use axum::{
    extract::{rejection::JsonRejection, Query, State},
    Json,
};
use feature_engine::{shape_forecast, FeatureRow};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, info};

use crate::error::{ApiError, INVALID_PREDICT_INPUT};
use crate::telemetry::{PREDICTIONS, PREDICTION_FAILURES, PREDICTOR_LATENCY};
use crate::AppState;

async fn run_predictor(state: &AppState, rows: &[FeatureRow]) -> Result<Vec<f64>, ApiError> {
    let start = Instant::now();
    let result = state.predictor.predict(rows).await;
    metrics::histogram!(PREDICTOR_LATENCY).record(start.elapsed().as_secs_f64());

    match result {
        Ok(powers) => {
            metrics::counter!(PREDICTIONS).increment(1);
            Ok(powers)
        }
        Err(e) => {
            metrics::counter!(PREDICTION_FAILURES).increment(1);
            Err(e.into())
        }
    }
}

/// Forward feature rows to the predictor; responds with watts per row
pub async fn predict(
    State(state): State<Arc<AppState>>,
    body: Result<Json<Vec<FeatureRow>>, JsonRejection>,
) -> Result<Json<Vec<f64>>, ApiError> {
    let Json(rows) = body.map_err(|e| {
        debug!("Rejected prediction body: {}", e.body_text());
        ApiError::BadRequest(INVALID_PREDICT_INPUT.to_string())
    })?;
    if rows.is_empty() {
        return Err(ApiError::BadRequest(INVALID_PREDICT_INPUT.to_string()));
    }

    let powers = run_predictor(&state, &rows).await?;
    Ok(Json(powers))
}

/// Location for a forecast-driven prediction
#[derive(Debug, Deserialize)]
pub struct ForecastQuery {
    pub latitude: f64,
    pub longitude: f64,
}

/// One forecast hour with predicted power
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PowerPoint {
    pub time: String,
    pub power_kw: f64,
    pub temperature: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ForecastPrediction {
    pub points: Vec<PowerPoint>,
    /// Forecast hours skipped for missing inputs
    pub dropped_hours: usize,
}

/// Fetch the forecast, shape it and predict the next hours of PV power
pub async fn predict_forecast(
    State(state): State<Arc<AppState>>,
    Query(location): Query<ForecastQuery>,
) -> Result<Json<ForecastPrediction>, ApiError> {
    if !(-90.0..=90.0).contains(&location.latitude) || !(-180.0..=180.0).contains(&location.longitude) {
        return Err(ApiError::BadRequest(format!(
            "Invalid location ({}, {})",
            location.latitude, location.longitude
        )));
    }

    let hourly = state.forecast.hourly(location.latitude, location.longitude).await?;
    let batch = shape_forecast(&hourly);
    if batch.is_empty() {
        return Err(ApiError::Forecast("no complete forecast hours".to_string()));
    }

    let powers = run_predictor(&state, &batch.rows).await?;
    let points: Vec<PowerPoint> = batch
        .source_indices
        .iter()
        .zip(powers)
        .take(state.forecast_hours)
        .map(|(&index, watts)| PowerPoint {
            time: hourly.time[index].clone(),
            power_kw: watts / 1000.0,
            temperature: hourly.temperature(index),
        })
        .collect();

    info!(
        "Forecast prediction for ({}, {}): {} points",
        location.latitude,
        location.longitude,
        points.len()
    );

    Ok(Json(ForecastPrediction {
        points,
        dropped_hours: hourly.len() - batch.len(),
    }))
}
