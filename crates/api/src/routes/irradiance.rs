//! Irradiance Routes

use axum::{
    extract::{rejection::JsonRejection, Query, State},
    Json,
};
use dataset::IrradianceQuery;
use serde::Deserialize;
use series_normalizer::{Bucketing, RawPair, SeriesWithMovingAverage, VariableKind};
use std::sync::Arc;

use crate::error::ApiError;
use crate::telemetry::{IRRADIANCE_QUERIES, SERIES_RECORDS_DROPPED};
use crate::AppState;

/// Raw filtered rows, in dataset order
pub async fn get_irradiance(
    State(state): State<Arc<AppState>>,
    Query(params): Query<IrradianceQuery>,
) -> Result<Json<Vec<RawPair>>, ApiError> {
    metrics::counter!(IRRADIANCE_QUERIES).increment(1);
    let rows = state.filter.query(&params)?;
    Ok(Json(rows))
}

/// Query parameters for the normalized series endpoint
#[derive(Debug, Default, Deserialize)]
pub struct SeriesQuery {
    pub city: Option<String>,
    pub year: Option<String>,
    pub month: Option<String>,
    pub target: Option<String>,
    /// Average sub-daily rows per calendar day (`true`/`1`)
    pub daily: Option<String>,
}

impl SeriesQuery {
    fn slice(&self) -> IrradianceQuery {
        IrradianceQuery {
            city: self.city.clone(),
            year: self.year.clone(),
            month: self.month.clone(),
            target: self.target.clone(),
        }
    }

    fn bucketing(&self) -> Bucketing {
        let daily = matches!(
            self.daily.as_deref().map(str::trim),
            Some("true") | Some("1") | Some("yes")
        );
        Bucketing::from_already_daily(!daily)
    }
}

fn build(state: &AppState, rows: &[RawPair], kind: VariableKind, bucketing: Bucketing) -> SeriesWithMovingAverage {
    let series = SeriesWithMovingAverage::build(rows, kind, bucketing, state.series_window);
    metrics::counter!(SERIES_RECORDS_DROPPED).increment(series.dropped as u64);
    series
}

/// Filtered rows normalized into a sorted series plus moving average
pub async fn get_series(
    State(state): State<Arc<AppState>>,
    Query(params): Query<SeriesQuery>,
) -> Result<Json<SeriesWithMovingAverage>, ApiError> {
    metrics::counter!(IRRADIANCE_QUERIES).increment(1);
    let slice = params.slice().resolve(state.filter.cities())?;
    let rows = state.filter.slice(&slice);
    Ok(Json(build(&state, &rows, slice.target, params.bucketing())))
}

/// Client-supplied raw pairs (e.g. parsed from a local CSV)
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NormalizeRequest {
    pub target: String,
    pub pairs: Vec<RawPair>,
    #[serde(default, alias = "already_daily")]
    pub already_daily: bool,
}

/// Normalize posted raw pairs
pub async fn post_series(
    State(state): State<Arc<AppState>>,
    body: Result<Json<NormalizeRequest>, JsonRejection>,
) -> Result<Json<SeriesWithMovingAverage>, ApiError> {
    let Json(request) = body.map_err(|e| ApiError::BadRequest(e.body_text()))?;
    let kind = request
        .target
        .parse::<VariableKind>()
        .map_err(|e| ApiError::BadRequest(e.to_string()))?;
    let bucketing = Bucketing::from_already_daily(request.already_daily);
    Ok(Json(build(&state, &request.pairs, kind, bucketing)))
}
