use axum::{extract::State, http::StatusCode, Json};
use serde_json::{json, Value};
use std::sync::Arc;

use crate::server::SandboxServer;

/// Health check endpoint
pub async fn health_check(State(server): State<Arc<SandboxServer>>) -> (StatusCode, Json<Value>) {
    let store_status = server.check_context_store_health().await;

    let overall_status = if store_status == "UP" { "UP" } else { "DEGRADED" };

    let response = json!({
        "message": "OK!",
        "status": overall_status,
        "version": env!("CARGO_PKG_VERSION"),
        "dependencies": {
            "contextStore": {
                "status": store_status
            }
        }
    });

    (StatusCode::OK, Json(response))
}
