pub mod config;
pub mod error;

pub use config::{ArchiveConfig, Config, ServerConfig, UpstreamConfig, ValidationResult};
pub use error::{AppError, ConfigError};

use anyhow::Result;

/// Load `.env` and install the tracing subscriber.
pub fn init() -> Result<()> {
    // Loaded first so RUST_LOG from .env is honoured
    let dotenv = dotenvy::dotenv();

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    match dotenv {
        Ok(path) => tracing::info!("Loaded environment from {}", path.display()),
        Err(e) if e.not_found() => tracing::debug!("No .env file found"),
        Err(e) => tracing::warn!("Failed to load .env file: {}", e),
    }

    tracing::info!("SkyCast core initialized");
    Ok(())
}
