//! Series Normalization and Aggregation
//!
//! Turns raw `(date, value)` pairs into a clean, chronologically ordered
//! irradiance series plus its trailing moving average. The same pipeline runs
//! over server-filtered dataset rows and over client-parsed CSV samples.

mod error;
mod kind;
mod moving_average;
mod normalizer;
mod series;
mod timestamp;

pub use error::SeriesError;
pub use kind::{ValueRange, VariableKind};
pub use moving_average::{moving_average, TrailingMean, DEFAULT_WINDOW};
pub use normalizer::{normalize_value, RawPair, RawValue, RESCALE_DIVISOR};
pub use series::{build_series, Bucketing, ObservationPoint, SeriesWithMovingAverage};
pub use timestamp::parse_timestamp;
