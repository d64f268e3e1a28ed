//! GitLab relay server.
//!
//! Listens for GitLab webhooks and forwards reports on issue and merge
//! request activity to the configured sink.

use anyhow::Result;
use tokio::signal;
use tracing::info;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use gitlab_relay::web::is_auth_enabled;
use gitlab_relay::{build_sink, Config, RelayServer};

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize structured JSON logging
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().json().flatten_event(true))
        .init();

    info!("relay_starting");

    let config = Config::from_env();
    info!(
        port = config.port,
        auth_enabled = is_auth_enabled(&config.secret),
        signature_mode = ?config.signature_mode,
        destinations = ?config.destinations,
        events = %config.events.describe(),
        sink = ?config.sink,
        sink_timeout_ms = config.sink_timeout_ms,
        "config_loaded"
    );

    let sink = build_sink(&config)?;
    let server = RelayServer::start(config, sink).await?;

    shutdown_signal().await;

    server.stop().await
}

/// Create a future that completes when a shutdown signal is received.
async fn shutdown_signal() {
    let ctrl_c = async {
        signal::ctrl_c()
            .await
            .expect("Failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        signal::unix::signal(signal::unix::SignalKind::terminate())
            .expect("Failed to install SIGTERM handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => info!("Received SIGINT"),
        _ = terminate => info!("Received SIGTERM"),
    }
}
