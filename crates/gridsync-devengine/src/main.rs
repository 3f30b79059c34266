//! Development engine entry point.
//!
//! Loads configuration from the environment, starts the `WebSocket`
//! server and tick loop, and runs until `Ctrl-C`.

use gridsync_devengine::{EngineConfig, start};
use tracing::info;
use tracing_subscriber::EnvFilter;

/// Application entry point.
///
/// # Errors
///
/// Returns an error if configuration is invalid or the server cannot bind.
#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_target(true)
        .init();

    info!("gridsync-devengine starting");

    let config = EngineConfig::from_env()?;
    info!(
        host = config.host,
        port = config.port,
        range = config.range,
        flips_per_tick = config.flips_per_tick,
        seed = config.seed,
        "configuration loaded"
    );

    let engine = start(&config).await?;
    info!(url = engine.url(), "waiting for viewers");

    tokio::signal::ctrl_c().await?;
    info!("shutdown requested");
    engine.shutdown();
    Ok(())
}
