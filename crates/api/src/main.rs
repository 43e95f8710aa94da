//! Gamer Spend Estimator - Main Entry Point

use anyhow::Context;
use api::{init_logging, run_server, Settings};
use tracing::{error, info};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let settings = Settings::load().context("Failed to load configuration")?;
    init_logging(&settings.logging);

    info!("=== Gamer Spend Estimator v{} ===", env!("CARGO_PKG_VERSION"));
    info!(artifact = %settings.artifact.path, "Loading models...");

    if let Err(e) = run_server(&settings).await {
        error!("Startup failed: {:#}", e);
        return Err(e);
    }

    Ok(())
}
