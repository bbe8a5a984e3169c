pub mod config;
pub mod error;

pub use config::{
    Config, DatabaseConfig, IngestConfig, ProvidersConfig, ServerConfig, ValidationResult,
};
pub use error::{AppError, ConfigError, INTERNAL_ERROR_MESSAGE, NO_DATA_MESSAGE};

use anyhow::Result;

/// Install the global tracing subscriber
pub fn init() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .try_init()
        .map_err(|e| anyhow::anyhow!("Failed to install tracing subscriber: {}", e))?;

    tracing::info!("weatherlog core initialized");
    Ok(())
}
