//! booking-engine server entry point.
//!
//! Loads configuration, opens the registration store, and serves the REST
//! API until the process receives Ctrl-C.

use anyhow::Context;
use tracing_subscriber::EnvFilter;

use booking_engine::config::{BookingConfig, LogFormat};
use booking_engine::server::{build_app, build_state};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = BookingConfig::from_env().context("loading configuration")?;

    // Initialize tracing
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    match config.log_format {
        LogFormat::Pretty => tracing_subscriber::fmt().with_env_filter(filter).init(),
        LogFormat::Json => tracing_subscriber::fmt()
            .json()
            .with_env_filter(filter)
            .init(),
    }

    tracing::info!(
        addr = %config.listen_addr,
        backend = ?config.storage_backend,
        "starting booking-engine"
    );

    let state = build_state(&config)
        .await
        .context("initializing registration store")?;
    let app = build_app(state, config.request_timeout());

    let listener = tokio::net::TcpListener::bind(config.listen_addr)
        .await
        .with_context(|| format!("binding {}", config.listen_addr))?;
    tracing::info!(addr = %config.listen_addr, "server listening");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    tracing::info!("server stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %e, "failed to listen for shutdown signal");
    }
}
