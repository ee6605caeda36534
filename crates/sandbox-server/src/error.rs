//! Error types for the sandbox server
//!
//! This module contains the error types used throughout the server.

use sandbox_core::CoreError;
use thiserror::Error;

/// Server error types
#[derive(Error, Debug)]
pub enum ServerError {
    /// Configuration error
    #[error("Configuration error: {0}")]
    ConfigError(String),

    /// Context store error
    #[error("Context store error: {0}")]
    ContextStoreError(String),

    /// Discovery or adapter client error
    #[error("Discovery error: {0}")]
    DiscoveryError(String),

    /// Validation error
    #[error("Validation error: {0}")]
    ValidationError(String),

    /// Internal server error
    #[error("Internal server error: {0}")]
    InternalError(String),

    /// Error raised by the orchestration core
    #[error(transparent)]
    Core(#[from] CoreError),
}

/// Result type for server operations
pub type ServerResult<T> = Result<T, ServerError>;

impl From<serde_json::Error> for ServerError {
    fn from(err: serde_json::Error) -> Self {
        ServerError::ValidationError(format!("JSON error: {}", err))
    }
}

impl From<reqwest::Error> for ServerError {
    fn from(err: reqwest::Error) -> Self {
        ServerError::DiscoveryError(format!("HTTP request error: {}", err))
    }
}

impl From<std::io::Error> for ServerError {
    fn from(err: std::io::Error) -> Self {
        ServerError::InternalError(format!("IO error: {}", err))
    }
}

impl From<anyhow::Error> for ServerError {
    fn from(err: anyhow::Error) -> Self {
        ServerError::InternalError(format!("Error: {}", err))
    }
}

impl ServerError {
    /// Check if the error came from the context store
    pub fn is_store_error(&self) -> bool {
        match self {
            ServerError::ContextStoreError(_) => true,
            ServerError::Core(err) => err.is_store_error(),
            _ => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        assert_eq!(
            ServerError::ConfigError("bad ttl".to_string()).to_string(),
            "Configuration error: bad ttl"
        );
        assert_eq!(
            ServerError::Core(CoreError::UnresolvedDomain("retail".to_string())).to_string(),
            "Unresolved domain: retail"
        );
    }

    #[test]
    fn test_conversions() {
        let json_err = serde_json::from_str::<serde_json::Value>("{").unwrap_err();
        assert!(matches!(ServerError::from(json_err), ServerError::ValidationError(_)));

        let io_err = std::io::Error::new(std::io::ErrorKind::AddrInUse, "port taken");
        assert!(matches!(ServerError::from(io_err), ServerError::InternalError(_)));

        let core: ServerError = CoreError::StoreUnavailable("down".to_string()).into();
        assert!(core.is_store_error());
        assert!(!ServerError::ConfigError("x".to_string()).is_store_error());
    }
}
