//! Cephas Server - Main entry point
//!
//! Space-time event recording and query service.

use clap::Parser;
use std::path::PathBuf;

use cephas_core::{
    api::{self, AppState},
    config::Config,
    db::EventStore,
    telemetry,
};

/// Cephas - space-time event service
#[derive(Parser)]
#[command(name = "cephas-server", version, about)]
struct Cli {
    /// Configuration file, overlaid by `CEPHAS__*` environment variables
    #[arg(short, long, env = "CEPHAS_CONFIG")]
    config: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load environment variables
    dotenvy::dotenv().ok();

    let cli = Cli::parse();
    let config = match &cli.config {
        Some(path) => Config::from_file(&path.to_string_lossy())?,
        None => Config::load()?,
    };

    let telemetry = telemetry::init_telemetry(&config.logging, &config.metrics)?;

    tracing::info!(
        version = env!("CARGO_PKG_VERSION"),
        backend = ?config.storage.backend,
        "Starting Cephas Server"
    );

    let store = EventStore::connect(&config.storage).await?;
    tracing::info!(backend = store.backend(), "Event store ready");

    let app = api::build_router(AppState::new(store, telemetry.metrics));

    let addr = config.server.bind_address();
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    tracing::info!(address = %addr, "Starting HTTP server");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    tracing::info!("Server shutdown complete");
    Ok(())
}

/// Wait for shutdown signal.
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!(error = %e, "Failed to install Ctrl+C handler");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                tracing::error!(error = %e, "Failed to install signal handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }

    tracing::info!("Shutdown signal received");
}
