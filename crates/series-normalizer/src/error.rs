//! Series Error Types

use crate::kind::VariableKind;
use thiserror::Error;

/// Per-record failures while normalizing a series.
///
/// None of these abort a batch: the offending record is dropped and the
/// remaining records are still processed.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum SeriesError {
    /// Timestamp did not match any accepted shape
    #[error("Invalid timestamp: {0:?}")]
    InvalidTimestamp(String),

    /// Value could not be coerced to a number
    #[error("Invalid numeric value: {0:?}")]
    InvalidNumber(String),

    /// Value absent or null
    #[error("Missing value")]
    MissingValue,

    /// Value is NaN or infinite after coercion/rescale
    #[error("Non-finite value for {kind}")]
    NonFinite { kind: VariableKind },

    /// Value still outside the expected range after the single rescale attempt
    #[error("{kind} value {value} is out of range [{min}, {max}]")]
    OutOfRange {
        kind: VariableKind,
        value: f64,
        min: f64,
        max: f64,
    },

    /// Unknown variable kind tag
    #[error("Unknown target variable: {0:?} (expected one of dni, ghi, dhi, pv)")]
    UnknownKind(String),
}
