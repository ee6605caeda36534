//! Sandbox server
//!
//! Owns the orchestrator and context store, serves the HTTP API and closes
//! the store on shutdown.

use sandbox_core::{ContextStore, FlowOrchestrator};
use std::sync::Arc;
use tokio::net::TcpListener;
use tokio::signal;
use tracing::{error, info, warn};

use crate::config::ServerConfig;
use crate::error::ServerResult;

/// HTTP responder
#[derive(Clone)]
pub struct SandboxServer {
    /// Configuration
    pub config: ServerConfig,

    /// Request orchestrator
    orchestrator: Arc<FlowOrchestrator>,

    /// Context store shared with the orchestrator
    store: Arc<dyn ContextStore>,
}

impl std::fmt::Debug for SandboxServer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SandboxServer")
            .field("config", &self.config)
            .field("orchestrator", &self.orchestrator)
            .finish()
    }
}

impl SandboxServer {
    /// Create a server
    pub fn new(config: ServerConfig, orchestrator: Arc<FlowOrchestrator>, store: Arc<dyn ContextStore>) -> Self {
        Self {
            config,
            orchestrator,
            store,
        }
    }

    /// Request orchestrator
    pub fn orchestrator(&self) -> &FlowOrchestrator {
        &self.orchestrator
    }

    /// Context store
    pub fn store(&self) -> &Arc<dyn ContextStore> {
        &self.store
    }

    /// Context store health: `UP`, `DEGRADED` or `DOWN`
    pub async fn check_context_store_health(&self) -> &'static str {
        match self.store.health_check().await {
            Ok(true) => "UP",
            Ok(false) => "DEGRADED",
            Err(err) => {
                warn!(error = %err, "Context store health check failed");
                "DOWN"
            }
        }
    }

    /// Run until Ctrl-C or SIGTERM
    pub async fn run(self) -> ServerResult<()> {
        info!("Starting BPP sandbox server");

        let store = self.store.clone();
        let addr = format!("{}:{}", self.config.bind_address, self.config.port);
        let app = crate::api::build_router(Arc::new(self));

        let listener = TcpListener::bind(&addr).await?;
        let bound = listener.local_addr()?;
        info!("Listening on {}", bound);

        axum::serve(listener, app)
            .with_graceful_shutdown(shutdown_signal())
            .await?;

        info!("Server shutting down");
        if let Err(err) = store.close().await {
            warn!(error = %err, "Failed to close context store");
        }
        Ok(())
    }
}

/// Resolves on Ctrl-C or SIGTERM
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(err) = signal::ctrl_c().await {
            error!(error = %err, "Failed to install Ctrl+C handler");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(err) => {
                error!(error = %err, "Failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            info!("Received Ctrl+C signal");
        },
        _ = terminate => {
            info!("Received SIGTERM signal");
        },
    }
}
