//! Route handlers

pub mod irradiance;
pub mod predictions;
