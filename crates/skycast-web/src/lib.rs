//! HTTP front end for SkyCast
//!
//! Serves the search form, forecast results, saved query history, and
//! archive downloads over warp.

pub mod routes;
pub mod session;
pub mod views;

pub use routes::{routes, AppState, LOCATION_PARAM};
pub use session::{Session, SessionStore, SESSION_COOKIE};

use std::net::SocketAddr;
use std::sync::Arc;

use skycast_core::{AppError, Config, ConfigError};

/// Bind the configured address and serve until Ctrl+C.
pub async fn serve(config: &Config) -> Result<(), AppError> {
    let addr: SocketAddr = config.server.bind_address.parse().map_err(|e| {
        ConfigError::Invalid(format!(
            "bind_address '{}': {}",
            config.server.bind_address, e
        ))
    })?;

    let state = Arc::new(AppState::from_config(config)?);
    tracing::info!("Archive directory: {}", state.service.archive().dir().display());

    let (bound, server) = warp::serve(routes(state))
        .try_bind_with_graceful_shutdown(addr, shutdown_signal())
        .map_err(|e| AppError::Server(format!("Failed to bind {}: {}", addr, e)))?;

    tracing::info!("Listening on http://{}", bound);
    server.await;
    tracing::info!("Server stopped");

    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("Failed to listen for shutdown signal: {}", e);
        // Keep serving rather than exiting immediately
        std::future::pending::<()>().await;
    }
    tracing::info!("Shutdown requested");
}
