//! Hourly forecast model (Open-Meteo `hourly` block)

use serde::{Deserialize, Serialize};

/// Hourly variables requested from the forecast API
pub const HOURLY_VARIABLES: &str =
    "temperature_2m,shortwave_radiation,direct_normal_irradiance,diffuse_radiation";

/// Parallel hourly series; any entry may be null
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct HourlyForecast {
    /// Local timestamps, e.g. `2024-01-01T13:00`
    #[serde(default)]
    pub time: Vec<String>,
    /// Air temperature at 2 m (°C)
    #[serde(default)]
    pub temperature_2m: Vec<Option<f64>>,
    /// DHI (W/m²)
    #[serde(default)]
    pub diffuse_radiation: Vec<Option<f64>>,
    /// DNI (W/m²)
    #[serde(default)]
    pub direct_normal_irradiance: Vec<Option<f64>>,
    /// GHI (W/m²)
    #[serde(default)]
    pub shortwave_radiation: Vec<Option<f64>>,
}

impl HourlyForecast {
    /// Number of forecast hours
    pub fn len(&self) -> usize {
        self.time.len()
    }

    pub fn is_empty(&self) -> bool {
        self.time.is_empty()
    }

    /// Temperature at `index`, if present
    pub fn temperature(&self, index: usize) -> Option<f64> {
        self.temperature_2m.get(index).copied().flatten()
    }
}

/// Top-level forecast response; only the hourly block is used
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ForecastResponse {
    #[serde(default)]
    pub latitude: Option<f64>,
    #[serde(default)]
    pub longitude: Option<f64>,
    #[serde(default)]
    pub timezone: Option<String>,
    pub hourly: HourlyForecast,
}
