//! Seller-side protocol action handlers

use axum::{
    extract::{Path, State},
    Json,
};
use sandbox_core::{InboundRequest, ResponseAction};
use serde_json::Value;
use std::sync::Arc;
use tracing::{error, info_span, Instrument};

use crate::api::errors::ApiError;
use crate::server::SandboxServer;

/// Request action name for discovery
const DISCOVER_ACTION: &str = "discover";

/// Handle `POST /api/webhook/:action`
pub async fn handle_webhook(
    State(server): State<Arc<SandboxServer>>,
    Path(action): Path<String>,
    Json(payload): Json<Value>,
) -> Result<Json<Value>, ApiError> {
    let transaction_id = payload
        .pointer("/context/transaction_id")
        .and_then(Value::as_str)
        .unwrap_or_default()
        .to_string();
    let span = info_span!("webhook", action = %action, transaction_id = %transaction_id);

    if action == DISCOVER_ACTION {
        return handle_discover(&server, payload).instrument(span).await;
    }

    let response_action = request_action(&action)
        .ok_or_else(|| ApiError::NotFound(format!("Unknown action: {}", action)))?;

    let mut request: InboundRequest = serde_json::from_value(payload)
        .map_err(|e| ApiError::BadRequest(format!("Invalid request body: {}", e)))?;
    if let Some(context) = request.context.as_mut() {
        if context.action.as_deref().map_or(true, str::is_empty) {
            context.action = Some(response_action.request_name().to_string());
        }
    }

    let outcome = server
        .orchestrator()
        .handle_action(request)
        .instrument(span)
        .await?;
    Ok(Json(outcome.into_response().to_value()))
}

async fn handle_discover(server: &SandboxServer, payload: Value) -> Result<Json<Value>, ApiError> {
    let context = payload.get("context").cloned().unwrap_or(Value::Null);
    match server.orchestrator().discover(payload).await {
        Ok(response) => Ok(Json(response)),
        Err(err) => {
            error!(error = %err, "Discover failed, returning NACK");
            Err(ApiError::Nack(context))
        }
    }
}

/// Response action answering a request action name, excluding discovery
fn request_action(action: &str) -> Option<ResponseAction> {
    ResponseAction::ALL
        .into_iter()
        .filter(|candidate| *candidate != ResponseAction::OnDiscover)
        .find(|candidate| candidate.request_name() == action)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_request_action() {
        assert_eq!(request_action("select"), Some(ResponseAction::OnSelect));
        assert_eq!(request_action("track"), Some(ResponseAction::OnTrack));
        assert_eq!(request_action("discover"), None);
        assert_eq!(request_action("on_select"), None);
        assert_eq!(request_action("search"), None);
    }
}
