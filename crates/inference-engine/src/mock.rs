//! Rule-based mock predictor

use crate::{ensure_non_empty, InferenceError, Predictor};
use async_trait::async_trait;
use feature_engine::FeatureRow;
use tracing::debug;

/// Estimates PV output from GHI with a linear temperature derate
#[derive(Debug, Clone)]
pub struct MockPredictor {
    /// Panel area (m²)
    pub area_m2: f64,
    /// Module efficiency at 25 °C
    pub efficiency: f64,
    /// Fractional power loss per °C above 25 °C
    pub temp_coefficient: f64,
}

impl Default for MockPredictor {
    fn default() -> Self {
        Self {
            area_m2: 10.0,
            efficiency: 0.2,
            temp_coefficient: 0.004,
        }
    }
}

impl MockPredictor {
    /// Power (W) for one row
    pub fn estimate(&self, row: &FeatureRow) -> f64 {
        let derate = 1.0 - self.temp_coefficient * (row.temperature - 25.0).max(0.0);
        (row.ghi * self.area_m2 * self.efficiency * derate).max(0.0)
    }
}

#[async_trait]
impl Predictor for MockPredictor {
    fn name(&self) -> &'static str {
        "mock"
    }

    async fn predict(&self, features: &[FeatureRow]) -> Result<Vec<f64>, InferenceError> {
        ensure_non_empty(features)?;
        debug!("Mock prediction for {} rows", features.len());
        Ok(features.iter().map(|row| self.estimate(row)).collect())
    }
}
