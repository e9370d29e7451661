//! Feature row assembly for the PV power predictor

use crate::cyclical::CyclicalTime;
use crate::forecast::HourlyForecast;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

/// Version of the positional feature schema below
pub const FEATURE_SCHEMA_VERSION: u32 = 1;

/// Field order the predictor expects; do not reorder without bumping the version
pub const FEATURE_ORDER: [&str; 8] = [
    "Hour_Sin",
    "Hour_Cos",
    "Month_Sin",
    "Month_Cos",
    "Temperature",
    "DHI",
    "DNI",
    "GHI",
];

/// One predictor input row.
///
/// Field declaration order is the serialized key order.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct FeatureRow {
    #[serde(rename = "Hour_Sin")]
    pub hour_sin: f64,
    #[serde(rename = "Hour_Cos")]
    pub hour_cos: f64,
    #[serde(rename = "Month_Sin")]
    pub month_sin: f64,
    #[serde(rename = "Month_Cos")]
    pub month_cos: f64,
    #[serde(rename = "Temperature")]
    pub temperature: f64,
    #[serde(rename = "DHI")]
    pub dhi: f64,
    #[serde(rename = "DNI")]
    pub dni: f64,
    #[serde(rename = "GHI")]
    pub ghi: f64,
}

impl FeatureRow {
    /// Values in [`FEATURE_ORDER`]
    pub fn values(&self) -> [f64; 8] {
        [
            self.hour_sin,
            self.hour_cos,
            self.month_sin,
            self.month_cos,
            self.temperature,
            self.dhi,
            self.dni,
            self.ghi,
        ]
    }

    /// Every field is a finite number
    pub fn is_finite(&self) -> bool {
        self.values().iter().all(|v| v.is_finite())
    }
}

fn at(series: &[Option<f64>], index: usize) -> Option<f64> {
    series.get(index).copied().flatten().filter(|v| v.is_finite())
}

/// Build the feature row for forecast hour `index`.
///
/// Returns `None` when the timestamp does not parse or any input is missing;
/// such rows must not be sent to the predictor.
pub fn to_feature_vector(hourly: &HourlyForecast, index: usize) -> Option<FeatureRow> {
    let raw_time = hourly.time.get(index)?;
    let Some(time) = CyclicalTime::from_raw(raw_time) else {
        warn!("Invalid forecast timestamp at {}: {:?}", index, raw_time);
        return None;
    };

    Some(FeatureRow {
        hour_sin: time.hour_sin,
        hour_cos: time.hour_cos,
        month_sin: time.month_sin,
        month_cos: time.month_cos,
        temperature: at(&hourly.temperature_2m, index)?,
        dhi: at(&hourly.diffuse_radiation, index)?,
        dni: at(&hourly.direct_normal_irradiance, index)?,
        ghi: at(&hourly.shortwave_radiation, index)?,
    })
}

/// Complete feature rows plus the forecast hour each came from
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ShapedBatch {
    pub rows: Vec<FeatureRow>,
    pub source_indices: Vec<usize>,
}

impl ShapedBatch {
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}

/// Shape every forecast hour, dropping incomplete rows
pub fn shape_forecast(hourly: &HourlyForecast) -> ShapedBatch {
    let mut batch = ShapedBatch::default();
    for index in 0..hourly.len() {
        if let Some(row) = to_feature_vector(hourly, index) {
            batch.rows.push(row);
            batch.source_indices.push(index);
        }
    }

    let dropped = hourly.len() - batch.len();
    if dropped > 0 {
        debug!("Dropped {} incomplete forecast hours of {}", dropped, hourly.len());
    }
    batch
}

#[cfg(test)]
mod tests {
    use super::*;

    fn forecast() -> HourlyForecast {
        HourlyForecast {
            time: vec![
                "2023-12-31T18:30".into(),
                "bad".into(),
                "2024-01-01T06:30".into(),
                "2024-01-01T07:30".into(),
            ],
            temperature_2m: vec![Some(20.0), Some(21.0), Some(24.5), None],
            diffuse_radiation: vec![Some(0.0), Some(0.0), Some(80.0), Some(90.0)],
            direct_normal_irradiance: vec![Some(0.0), Some(0.0), Some(600.0), Some(650.0)],
            shortwave_radiation: vec![Some(0.0), Some(0.0), Some(450.0), Some(500.0)],
        }
    }

    #[test]
    fn test_feature_vector_for_shifted_midnight() {
        let row = to_feature_vector(&forecast(), 0).unwrap();
        assert!(row.hour_sin.abs() < 1e-12);
        assert!((row.hour_cos - 1.0).abs() < 1e-12);
        assert_eq!(row.temperature, 20.0);
    }

    #[test]
    fn test_incomplete_rows_are_none() {
        let hourly = forecast();
        assert!(to_feature_vector(&hourly, 1).is_none());
        assert!(to_feature_vector(&hourly, 3).is_none());
        assert!(to_feature_vector(&hourly, 99).is_none());
    }

    #[test]
    fn test_shape_forecast_tracks_source_indices() {
        let batch = shape_forecast(&forecast());
        assert_eq!(batch.len(), 2);
        assert_eq!(batch.source_indices, vec![0, 2]);
        assert_eq!(batch.rows[1].ghi, 450.0);
        assert_eq!(batch.rows[1].dni, 600.0);
        assert_eq!(batch.rows[1].dhi, 80.0);
        assert!(batch.rows.iter().all(FeatureRow::is_finite));
    }

    #[test]
    fn test_serialized_key_order_matches_schema() {
        let row = to_feature_vector(&forecast(), 2).unwrap();
        let json = serde_json::to_string(&row).unwrap();

        let mut last = 0;
        for key in FEATURE_ORDER {
            let pos = json.find(&format!("\"{key}\"")).unwrap();
            assert!(pos >= last, "{key} out of order in {json}");
            last = pos;
        }

        let back: FeatureRow = serde_json::from_str(&json).unwrap();
        assert_eq!(back, row);
    }
}
