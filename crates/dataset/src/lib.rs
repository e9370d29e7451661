//! Irradiance Dataset
//!
//! Loads the flat time-series CSV once into an immutable snapshot and answers
//! `(city, year, month, target)` slice queries by linear filter + projection.

mod city;
mod query;
mod snapshot;

pub use city::CityTable;
pub use query::{FilterService, IrradianceQuery, SliceParams};
pub use snapshot::{Dataset, IndexedRecord, RawRecord};

use std::path::PathBuf;
use thiserror::Error;

/// Dataset load errors; all of them are fatal at startup
#[derive(Debug, Error)]
pub enum DatasetError {
    #[error("Dataset source unavailable at {path}: {source}")]
    SourceUnavailable {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("Invalid dataset format: {0}")]
    InvalidFormat(String),
    #[error("CSV read error: {0}")]
    Csv(#[from] csv::Error),
}

/// Query parameter errors, surfaced to the caller as bad requests
#[derive(Debug, Clone, PartialEq, Error)]
pub enum QueryError {
    #[error("Missing required parameter: {0} (year and target are required)")]
    MissingParameter(&'static str),
    #[error("Invalid parameter {name}={value:?}: {reason}")]
    InvalidParameter {
        name: &'static str,
        value: String,
        reason: String,
    },
}
