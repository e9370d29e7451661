//! Solar Irradiance Dashboard - Main Entry Point

use api::{init_logging, run_server, AppConfig};
use std::path::PathBuf;
use tracing::info;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config_path = std::env::var_os("SOLAR_CONFIG").map(PathBuf::from);
    let config = AppConfig::load(config_path.as_deref())?;

    init_logging(&config.logging).map_err(|e| anyhow::anyhow!(e))?;

    info!("=== Solar Dashboard API v{} ===", env!("CARGO_PKG_VERSION"));
    info!("Dataset: {}", config.dataset.path.display());

    run_server(config).await
}
