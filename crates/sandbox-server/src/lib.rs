//!
//! Sandbox Server - seller-side protocol responder
//!
//! This module exports all the components of the sandbox server.

// External dependencies
use std::sync::Arc;
use std::time::Duration;

use sandbox_core::{ContextStore, DomainRegistry, FlowOrchestrator, FlowSettings};
use tracing::info;

/// Downstream adapter client module
pub mod adapter;

/// API module
pub mod api;

/// Configuration module
pub mod config;

/// Context store module
pub mod context_store;

/// Discovery service client module
pub mod discovery;

/// Error module
pub mod error;

/// Server module
pub mod server;

// Re-export key types
pub use adapter::HttpAdapterForwarder;
pub use config::{LogFormat, RedisSettings, ServerConfig};
pub use context_store::{create_context_store, InMemoryContextStore};
pub use discovery::HttpDiscoveryClient;
pub use error::{ServerError, ServerResult};
pub use server::SandboxServer;

/// Run function
pub async fn run(config: ServerConfig) -> ServerResult<()> {
    // Initialize logging, then report what loading found
    init_logging(&config);
    config.log_loaded();

    // Create dependencies
    let store = create_context_store(&config).await?;
    let orchestrator = build_orchestrator(&config, store.clone())?;

    // Create server
    let server = SandboxServer::new(config, Arc::new(orchestrator), store);

    // Run server
    server.run().await
}

/// Wire the registry, discovery client and optional adapter forwarder
/// around `store`
pub fn build_orchestrator(config: &ServerConfig, store: Arc<dyn ContextStore>) -> ServerResult<FlowOrchestrator> {
    let mut builder = DomainRegistry::builder();
    sandbox_domains::register_builtin_domains(&mut builder);
    let registry = Arc::new(builder.build());
    info!(domains = ?registry.domains(), "Domain registry loaded");

    let discovery = Arc::new(HttpDiscoveryClient::new(
        config.cds_endpoint.clone(),
        Duration::from_millis(config.cds_timeout_ms),
    )?);

    let mut orchestrator = FlowOrchestrator::new(registry, store, discovery).with_settings(FlowSettings {
        default_domain: config.default_domain.clone(),
        forward_action_responses: config.forward_action_responses,
    });

    if let Some(adapter_url) = &config.adapter_url {
        info!(adapter_url = %adapter_url, "Adapter forwarding enabled");
        let forwarder = HttpAdapterForwarder::new(
            adapter_url.clone(),
            Duration::from_millis(config.adapter_timeout_ms),
        )?;
        orchestrator = orchestrator.with_forwarder(Arc::new(forwarder));
    }

    Ok(orchestrator)
}

/// Initialize logging
fn init_logging(config: &ServerConfig) {
    use tracing_subscriber::{fmt, EnvFilter};

    // Create filter based on config
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&config.log_level));

    // Initialize subscriber; a subscriber installed earlier wins
    let result = match config.log_format {
        LogFormat::Json => fmt().json().with_env_filter(filter).with_target(true).try_init(),
        LogFormat::Pretty => fmt().with_env_filter(filter).with_target(true).try_init(),
    };
    if result.is_err() {
        tracing::debug!("Global tracing subscriber already installed");
    }
}
