//! Open-Meteo forecast client

use crate::config::ForecastConfig;
use crate::error::ApiError;
use feature_engine::{ForecastResponse, HourlyForecast, HOURLY_VARIABLES};
use std::time::Duration;
use tracing::debug;

/// Fetches hourly forecasts for a location
#[derive(Debug, Clone)]
pub struct ForecastClient {
    http: reqwest::Client,
    base_url: String,
}

impl ForecastClient {
    pub fn new(config: &ForecastConfig) -> Result<Self, reqwest::Error> {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_millis(config.timeout_ms))
            .build()?;
        Ok(Self {
            http,
            base_url: config.base_url.clone(),
        })
    }

    /// Fetch the hourly block for `(latitude, longitude)`
    pub async fn hourly(&self, latitude: f64, longitude: f64) -> Result<HourlyForecast, ApiError> {
        debug!("Fetching forecast for ({}, {})", latitude, longitude);

        let response = self
            .http
            .get(&self.base_url)
            .query(&[
                ("latitude", latitude.to_string()),
                ("longitude", longitude.to_string()),
                ("hourly", HOURLY_VARIABLES.to_string()),
                ("timezone", "auto".to_string()),
            ])
            .send()
            .await
            .map_err(|e| ApiError::Forecast(e.to_string()))?
            .error_for_status()
            .map_err(|e| ApiError::Forecast(e.to_string()))?;

        let forecast: ForecastResponse = response
            .json()
            .await
            .map_err(|e| ApiError::Forecast(format!("invalid forecast body: {e}")))?;

        Ok(forecast.hourly)
    }
}
