//! Explicit transaction cleanup

use axum::{
    extract::{Path, State},
    Json,
};
use serde_json::{json, Value};
use std::sync::Arc;
use tracing::info;

use crate::api::errors::ApiError;
use crate::server::SandboxServer;

/// Handle `DELETE /api/context/:transaction_id`
pub async fn delete_context(
    State(server): State<Arc<SandboxServer>>,
    Path(transaction_id): Path<String>,
) -> Result<Json<Value>, ApiError> {
    if transaction_id.trim().is_empty() {
        return Err(ApiError::BadRequest("transaction_id must not be empty".to_string()));
    }

    let deleted = server.store().delete_all(&transaction_id).await?;
    info!(transaction_id = %transaction_id, deleted, "Transaction context deleted");

    Ok(Json(json!({ "deleted": deleted })))
}
