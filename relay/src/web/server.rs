//! HTTP listener lifecycle.
//!
//! `start` binds the socket and serves in a background task; `stop` stops
//! accepting connections, waits for in-flight requests, then closes the sink.

use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::{Context, Result};
use axum::{
    routing::{get, post},
    Router,
};
use tokio::{net::TcpListener, sync::oneshot, task::JoinHandle};
use tower_http::trace::TraceLayer;
use tracing::{error, info};

use crate::sink::Sink;
use crate::web::handlers::{gitlab_webhook, health, AppState};
use crate::Config;

/// Build the relay's routes.
pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/", post(gitlab_webhook))
        .route("/webhooks/gitlab", post(gitlab_webhook))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// A running relay listener.
pub struct RelayServer {
    addr: SocketAddr,
    sink: Arc<dyn Sink>,
    shutdown: oneshot::Sender<()>,
    task: JoinHandle<std::io::Result<()>>,
}

impl RelayServer {
    /// Bind `0.0.0.0:{config.port}` and start serving.
    ///
    /// Failing to bind is the only fatal error the relay has.
    pub async fn start(config: Config, sink: Arc<dyn Sink>) -> Result<Self> {
        let addr = SocketAddr::from(([0, 0, 0, 0], config.port));
        let listener = TcpListener::bind(addr)
            .await
            .with_context(|| format!("Failed to bind to {}", addr))?;
        let addr = listener
            .local_addr()
            .context("Failed to read bound address")?;

        let app = router(AppState::new(config, sink.clone()));
        let (shutdown, shutdown_rx) = oneshot::channel::<()>();

        let task = tokio::spawn(async move {
            axum::serve(listener, app)
                .with_graceful_shutdown(async {
                    // A dropped sender also stops the server.
                    let _ = shutdown_rx.await;
                })
                .await
        });

        info!(address = %addr, "relay_listening");

        Ok(Self {
            addr,
            sink,
            shutdown,
            task,
        })
    }

    pub fn local_addr(&self) -> SocketAddr {
        self.addr
    }

    /// Stop accepting connections and wait for in-flight requests to finish.
    pub async fn stop(self) -> Result<()> {
        info!("relay_shutting_down");

        let _ = self.shutdown.send(());
        let served = self.task.await.context("Server task panicked")?;

        self.sink.close().await;

        if let Err(e) = &served {
            error!(error = %e, "relay_server_error");
        }
        served.context("Server error")?;

        info!("relay_shutdown_complete");
        Ok(())
    }
}
