//! API module for the sandbox server
//!
//! This module contains the API routes and handlers.

use axum::{
    extract::DefaultBodyLimit,
    routing::{delete, get, post},
    Router,
};
use std::sync::Arc;
use tower::ServiceBuilder;
use tower_http::trace::TraceLayer;

pub mod bap_webhook;
pub mod context;
pub mod errors;
pub mod health;
pub mod webhook;

use crate::server::SandboxServer;

/// Largest accepted request body
pub const MAX_BODY_BYTES: usize = 5 * 1024 * 1024;

/// Build the router for API endpoints
pub fn build_router(server: Arc<SandboxServer>) -> Router {
    Router::new()
        // Seller-side protocol actions
        .route("/api/webhook/:action", post(webhook::handle_webhook))
        // Buyer-side callbacks
        .route("/api/bap-webhook/:action", post(bap_webhook::handle_callback))
        // Transaction context cleanup
        .route("/api/context/:transaction_id", delete(context::delete_context))
        // Health check
        .route("/api/health", get(health::health_check))
        .layer(DefaultBodyLimit::max(MAX_BODY_BYTES))
        .layer(ServiceBuilder::new().layer(TraceLayer::new_for_http()))
        .with_state(server)
}

pub use errors::ApiError;
