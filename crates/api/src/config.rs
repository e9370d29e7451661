//! Application configuration
//!
//! Layered with the `config` crate: built-in defaults, then an optional
//! `solar-dashboard.toml`, then `SOLAR_*` environment variables
//! (`SOLAR_SERVER__BIND=0.0.0.0:5000`).

use crate::rate_limit::RateLimitConfig;
use config::{Config, ConfigError, Environment, File};
use inference_engine::SubprocessConfig;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

/// Config file looked up in the working directory when no path is given
pub const DEFAULT_CONFIG_FILE: &str = "solar-dashboard";

/// Environment variable prefix
pub const ENV_PREFIX: &str = "SOLAR";

/// Top-level configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AppConfig {
    pub server: ServerConfig,
    pub dataset: DatasetConfig,
    pub predictor: PredictorConfig,
    pub forecast: ForecastConfig,
    pub rate_limit: RateLimitConfig,
    pub logging: LoggingConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    /// Listen address
    pub bind: String,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind: "0.0.0.0:5000".to_string(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatasetConfig {
    /// CSV file read once at startup
    pub path: PathBuf,
    /// City display name -> dataset city id
    pub cities: BTreeMap<String, String>,
    /// Trailing moving average window (points)
    pub window: usize,
}

impl Default for DatasetConfig {
    fn default() -> Self {
        Self {
            path: PathBuf::from("merged_preprocessed_datas1.csv"),
            cities: [("Indore", "1"), ("Delhi", "2"), ("Assam", "3")]
                .into_iter()
                .map(|(name, id)| (name.to_string(), id.to_string()))
                .collect(),
            window: series_normalizer::DEFAULT_WINDOW,
        }
    }
}

/// Which predictor backend serves `/api/predict`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PredictorMode {
    #[default]
    Subprocess,
    Mock,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PredictorConfig {
    pub mode: PredictorMode,
    pub subprocess: SubprocessConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ForecastConfig {
    /// Open-Meteo forecast endpoint
    pub base_url: String,
    /// HTTP timeout (ms)
    pub timeout_ms: u64,
    /// Forecast hours returned to the dashboard
    pub hours: usize,
}

impl Default for ForecastConfig {
    fn default() -> Self {
        Self {
            base_url: "https://api.open-meteo.com/v1/forecast".to_string(),
            timeout_ms: 10_000,
            hours: 24,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Default filter when `RUST_LOG` is unset
    pub level: String,
    /// Emit JSON lines instead of human-readable output
    pub json: bool,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            json: false,
        }
    }
}

impl AppConfig {
    /// Load configuration.
    ///
    /// An explicit `path` must exist; otherwise `solar-dashboard.{toml,yaml,json}`
    /// is used when present.
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        let file = match path {
            Some(path) => File::from(path).required(true),
            None => File::with_name(DEFAULT_CONFIG_FILE).required(false),
        };

        Config::builder()
            .add_source(Config::try_from(&AppConfig::default())?)
            .add_source(file)
            .add_source(
                Environment::with_prefix(ENV_PREFIX)
                    .prefix_separator("_")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?
            .try_deserialize()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_defaults() {
        let config = AppConfig::default();
        assert_eq!(config.server.bind, "0.0.0.0:5000");
        assert_eq!(config.dataset.window, 7);
        assert_eq!(config.dataset.cities.len(), 3);
        assert_eq!(config.predictor.mode, PredictorMode::Subprocess);
        assert_eq!(config.predictor.subprocess.program, "python");
        assert_eq!(config.forecast.hours, 24);
        assert!(config.rate_limit.enabled);
    }

    #[test]
    fn test_file_overrides_defaults() {
        let mut file = tempfile::Builder::new().suffix(".toml").tempfile().unwrap();
        writeln!(
            file,
            r#"
[server]
bind = "127.0.0.1:8088"

[predictor]
mode = "mock"

[predictor.subprocess]
program = "python3"
args = ["model/predict.py"]
timeout_ms = 1500
"#
        )
        .unwrap();

        let config = AppConfig::load(Some(file.path())).unwrap();
        assert_eq!(config.server.bind, "127.0.0.1:8088");
        assert_eq!(config.predictor.mode, PredictorMode::Mock);
        assert_eq!(config.predictor.subprocess.program, "python3");
        assert_eq!(config.predictor.subprocess.timeout_ms, 1500);
        // untouched sections keep their defaults
        assert_eq!(config.forecast.timeout_ms, 10_000);
        assert_eq!(config.dataset.window, 7);
    }

    #[test]
    fn test_environment_overrides() {
        std::env::set_var("SOLAR_LOGGING__LEVEL", "debug");
        std::env::set_var("SOLAR_FORECAST__HOURS", "12");
        let config = AppConfig::load(None);
        std::env::remove_var("SOLAR_LOGGING__LEVEL");
        std::env::remove_var("SOLAR_FORECAST__HOURS");

        let config = config.unwrap();
        assert_eq!(config.logging.level, "debug");
        assert_eq!(config.forecast.hours, 12);
        assert_eq!(config.forecast.timeout_ms, 10_000);
    }

    #[test]
    fn test_missing_explicit_file_is_error() {
        assert!(AppConfig::load(Some(Path::new("/nonexistent/solar-dashboard.toml"))).is_err());
    }
}
