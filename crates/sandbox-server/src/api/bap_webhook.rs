//! Buyer-side callback receiver

use axum::{extract::Path, Json};
use sandbox_core::{ProtocolResponse, ResponseAction};
use serde_json::Value;
use tracing::{debug, info};

use crate::api::errors::ApiError;

/// Handle `POST /api/bap-webhook/:action`
pub async fn handle_callback(Path(action): Path<String>, Json(payload): Json<Value>) -> Result<Json<Value>, ApiError> {
    let action: ResponseAction = action
        .parse()
        .map_err(|_| ApiError::NotFound(format!("Unknown callback: {}", action)))?;

    let transaction_id = payload
        .pointer("/context/transaction_id")
        .and_then(Value::as_str)
        .unwrap_or_default();
    info!(action = %action, transaction_id = %transaction_id, "Callback received");
    debug!(action = %action, payload = %payload, "Callback payload");

    Ok(Json(ProtocolResponse::ack()))
}
