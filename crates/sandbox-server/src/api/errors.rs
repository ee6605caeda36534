//! Error handling for the sandbox API
//!
//! This module contains standardized error responses for the API.

use axum::{http::StatusCode, response::IntoResponse, Json};
use sandbox_core::{CoreError, ProtocolResponse};
use serde_json::{json, Value};

use crate::error::ServerError;

/// Message returned for failures whose detail stays in the logs
const INTERNAL_ERROR_MESSAGE: &str = "Internal server error";

/// API Error type for returning standard error responses
#[derive(Debug)]
pub enum ApiError {
    /// Bad request (400)
    BadRequest(String),
    /// Not found (404)
    NotFound(String),
    /// Internal server error (500)
    InternalServerError(String),
    /// Service unavailable (503)
    ServiceUnavailable(String),
    /// Negative acknowledgement echoing the caller's envelope (500)
    Nack(Value),
    /// Error raised by the orchestration core
    Core(CoreError),
}

impl From<CoreError> for ApiError {
    fn from(err: CoreError) -> Self {
        ApiError::Core(err)
    }
}

impl From<ServerError> for ApiError {
    fn from(err: ServerError) -> Self {
        match err {
            ServerError::Core(err) => ApiError::Core(err),
            ServerError::ValidationError(msg) => ApiError::BadRequest(msg),
            ServerError::ContextStoreError(msg) => ApiError::ServiceUnavailable(msg),
            other => ApiError::InternalServerError(other.to_string()),
        }
    }
}

impl std::fmt::Display for ApiError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ApiError::BadRequest(msg) => write!(f, "Bad Request: {}", msg),
            ApiError::NotFound(msg) => write!(f, "Not Found: {}", msg),
            ApiError::InternalServerError(msg) => write!(f, "Internal Server Error: {}", msg),
            ApiError::ServiceUnavailable(msg) => write!(f, "Service Unavailable: {}", msg),
            ApiError::Nack(_) => write!(f, "NACK"),
            ApiError::Core(err) => write!(f, "Core Error: {}", err),
        }
    }
}

fn error_body(message: &str, error_code: &str) -> Json<Value> {
    Json(json!({
        "error": message,
        "errorDetails": {
            "errorCode": error_code,
            "errorMessage": message,
        }
    }))
}

impl IntoResponse for ApiError {
    fn into_response(self) -> axum::response::Response {
        let (status, error_code, message) = match self {
            ApiError::BadRequest(msg) => (StatusCode::BAD_REQUEST, "ERR_BAD_REQUEST", msg),
            ApiError::NotFound(msg) => (StatusCode::NOT_FOUND, "ERR_NOT_FOUND", msg),
            ApiError::InternalServerError(_) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                "ERR_INTERNAL_SERVER_ERROR",
                INTERNAL_ERROR_MESSAGE.to_string(),
            ),
            ApiError::ServiceUnavailable(msg) => (StatusCode::SERVICE_UNAVAILABLE, "ERR_SERVICE_UNAVAILABLE", msg),
            ApiError::Nack(context) => {
                return (StatusCode::INTERNAL_SERVER_ERROR, Json(ProtocolResponse::nack(context))).into_response();
            }
            ApiError::Core(err) => match err {
                CoreError::MalformedRequest(msg) => (StatusCode::BAD_REQUEST, "ERR_MALFORMED_REQUEST", msg),
                CoreError::GeneratorFailure { .. } => (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "ERR_GENERATOR_FAILURE",
                    INTERNAL_ERROR_MESSAGE.to_string(),
                ),
                err if err.is_store_error() => (
                    StatusCode::SERVICE_UNAVAILABLE,
                    "ERR_CONTEXT_STORE_UNAVAILABLE",
                    err.to_string(),
                ),
                _ => (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "ERR_INTERNAL_SERVER_ERROR",
                    INTERNAL_ERROR_MESSAGE.to_string(),
                ),
            },
        };

        (status, error_body(&message, error_code)).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_mapping() {
        let cases = vec![
            (ApiError::BadRequest("x".into()), StatusCode::BAD_REQUEST),
            (ApiError::NotFound("x".into()), StatusCode::NOT_FOUND),
            (ApiError::Core(CoreError::MalformedRequest("Missing context".into())), StatusCode::BAD_REQUEST),
            (
                ApiError::Core(CoreError::GeneratorFailure { action: "on_init".into(), reason: "boom".into() }),
                StatusCode::INTERNAL_SERVER_ERROR,
            ),
            (ApiError::Core(CoreError::StoreUnavailable("down".into())), StatusCode::SERVICE_UNAVAILABLE),
            (ApiError::Nack(json!({})), StatusCode::INTERNAL_SERVER_ERROR),
        ];
        for (error, expected) in cases {
            assert_eq!(error.into_response().status(), expected);
        }
    }

    #[test]
    fn test_server_error_conversion() {
        assert!(matches!(
            ApiError::from(ServerError::ValidationError("bad".into())),
            ApiError::BadRequest(_)
        ));
        assert!(matches!(
            ApiError::from(ServerError::Core(CoreError::MalformedRequest("x".into()))),
            ApiError::Core(CoreError::MalformedRequest(_))
        ));
    }
}
