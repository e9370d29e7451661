//! Feature Engineering Engine
//!
//! Turns an hourly weather forecast into the fixed feature rows consumed by
//! the external PV power predictor.

mod cyclical;
mod features;
mod forecast;

pub use cyclical::{CyclicalTime, DEPLOYMENT_UTC_OFFSET_MINUTES};
pub use features::{
    shape_forecast, to_feature_vector, FeatureRow, ShapedBatch, FEATURE_ORDER,
    FEATURE_SCHEMA_VERSION,
};
pub use forecast::{ForecastResponse, HourlyForecast, HOURLY_VARIABLES};
