use anyhow::Result;
use tokio_util::sync::CancellationToken;
use weatherlog::Supervisor;
use weatherlog_core::Config;

#[tokio::main]
async fn main() -> Result<()> {
    weatherlog_core::init()?;

    let (config, _warnings) = Config::load_validated()?;
    tracing::info!("Loaded configuration from {}", Config::config_path().display());

    let shutdown = CancellationToken::new();
    let running = Supervisor::from_config(config)?.start(shutdown.clone())?;

    tokio::spawn(cancel_on_ctrl_c(shutdown));

    running.wait().await?;
    tracing::info!("weatherlog stopped");
    Ok(())
}

async fn cancel_on_ctrl_c(shutdown: CancellationToken) {
    match tokio::signal::ctrl_c().await {
        Ok(()) => {
            tracing::info!("Shutdown requested");
            shutdown.cancel();
        }
        Err(e) => tracing::error!("Failed to listen for Ctrl-C: {}", e),
    }
}
