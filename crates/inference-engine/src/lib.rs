//! PV Power Inference
//!
//! Narrow `predict(features) -> powers` interface. The production backend
//! shells out to an external model process; a rule-based mock backs tests and
//! local development.

mod mock;
mod subprocess;

pub use mock::MockPredictor;
pub use subprocess::{SubprocessConfig, SubprocessPredictor};

use async_trait::async_trait;
use feature_engine::FeatureRow;
use thiserror::Error;

/// Errors during prediction
#[derive(Debug, Error)]
pub enum InferenceError {
    #[error("Invalid input: {0}")]
    InvalidInput(String),
    #[error("Failed to start predictor {program}: {source}")]
    Spawn {
        program: String,
        #[source]
        source: std::io::Error,
    },
    #[error("Predictor I/O failed: {0}")]
    Io(#[from] std::io::Error),
    #[error("Predictor exited with {code:?}: {stderr}")]
    ProcessFailed { code: Option<i32>, stderr: String },
    #[error("Invalid JSON from predictor: {0}")]
    MalformedOutput(String),
    #[error("Predictor returned {actual} values for {expected} rows")]
    OutputLength { expected: usize, actual: usize },
    #[error("Predictor timeout after {0}ms")]
    Timeout(u64),
}

/// A PV power model: one output in watts per input row, same order
#[async_trait]
pub trait Predictor: Send + Sync {
    /// Backend name for logs and health output
    fn name(&self) -> &'static str;

    /// Predict power (W) for each feature row
    async fn predict(&self, features: &[FeatureRow]) -> Result<Vec<f64>, InferenceError>;
}

/// Reject empty batches before any backend work
pub(crate) fn ensure_non_empty(features: &[FeatureRow]) -> Result<(), InferenceError> {
    if features.is_empty() {
        Err(InferenceError::InvalidInput(
            "expected a non-empty array of feature sets".to_string(),
        ))
    } else {
        Ok(())
    }
}
