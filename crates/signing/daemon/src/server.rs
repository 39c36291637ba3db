//! Signing daemon server

use crate::api::rest::{create_router, AppState};
use crate::config::DaemonConfig;
use crate::error::{DaemonError, DaemonResult};
use crate::sweeper::ExpirySweeper;
use signing_engine::SigningEngine;
use signing_storage::memory::InMemorySigningStorage;
use std::sync::Arc;
use tokio::net::TcpListener;
use tokio::sync::watch;

/// Signing daemon server
pub struct Server {
    config: DaemonConfig,
    engine: Arc<SigningEngine>,
}

impl Server {
    /// Create a server backed by in-memory storage
    pub fn new(config: DaemonConfig) -> Self {
        let storage = Arc::new(InMemorySigningStorage::new());
        let engine = Arc::new(SigningEngine::new(storage, config.engine.clone()));
        Self { config, engine }
    }

    pub fn engine(&self) -> Arc<SigningEngine> {
        self.engine.clone()
    }

    /// Serve until a shutdown signal arrives
    pub async fn run(self) -> DaemonResult<()> {
        let addr = self.config.server.listen_addr;

        let state = AppState::new(self.engine.clone());
        let app = create_router(state, &self.config.server);

        let listener = TcpListener::bind(addr).await?;
        tracing::info!("Signing daemon listening on {}", addr);

        let (shutdown_tx, shutdown_rx) = watch::channel(false);
        let sweeper = if self.config.sweeper.enabled {
            let sweeper = ExpirySweeper::new(self.engine.clone(), &self.config.sweeper);
            Some(tokio::spawn(sweeper.run(shutdown_rx)))
        } else {
            tracing::info!("Expiry sweeper disabled");
            None
        };

        axum::serve(listener, app)
            .with_graceful_shutdown(shutdown_signal())
            .await
            .map_err(|e| DaemonError::Server(e.to_string()))?;

        tracing::info!("Signing daemon shutting down");

        let _ = shutdown_tx.send(true);
        if let Some(handle) = sweeper {
            if let Err(e) = handle.await {
                tracing::warn!(error = %e, "Expiry sweeper task ended abnormally");
            }
        }

        Ok(())
    }
}

/// Graceful shutdown signal handler
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
                tracing::error!(error = %e, "Failed to install terminate handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            tracing::info!("Received Ctrl+C, initiating graceful shutdown");
        }
        _ = terminate => {
            tracing::info!("Received terminate signal, initiating graceful shutdown");
        }
    }
}
