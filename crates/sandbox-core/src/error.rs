use thiserror::Error;

/// Core error type for the sandbox responder
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CoreError {
    /// Request is missing its context, transaction id or action
    #[error("Malformed request: {0}")]
    MalformedRequest(String),

    /// Requested domain matches no registered configuration
    #[error("Unresolved domain: {0}")]
    UnresolvedDomain(String),

    /// Domain resolved but has no generator for the action
    #[error("No generator for action {action} in domain {domain}")]
    MissingGenerator {
        /// Canonical domain identifier
        domain: String,
        /// Response action name
        action: String,
    },

    /// A domain generator returned an error
    #[error("Generator failed for {action}: {reason}")]
    GeneratorFailure {
        /// Response action name
        action: String,
        /// Reason reported by the generator
        reason: String,
    },

    /// Context store cannot be reached
    #[error("Context store unavailable: {0}")]
    StoreUnavailable(String),

    /// Context store operation failed
    #[error("Context store error: {0}")]
    StoreFailure(String),

    /// Serialization error
    #[error("Serialization error: {0}")]
    SerializationError(String),

    /// Upstream discovery call failed
    #[error("Upstream discovery failure: {0}")]
    UpstreamDiscoveryFailure(String),

    /// Downstream adapter forward failed
    #[error("Adapter forward failure: {0}")]
    AdapterFailure(String),

    /// Configuration error
    #[error("Configuration error: {0}")]
    ConfigurationError(String),

    /// Generic error
    #[error("{0}")]
    Other(String),
}

impl CoreError {
    /// True for errors caused by the caller's input
    pub fn is_client_error(&self) -> bool {
        matches!(self, CoreError::MalformedRequest(_))
    }

    /// True for errors raised at the context store boundary
    pub fn is_store_error(&self) -> bool {
        matches!(
            self,
            CoreError::StoreUnavailable(_) | CoreError::StoreFailure(_) | CoreError::SerializationError(_)
        )
    }
}

impl From<serde_json::Error> for CoreError {
    fn from(err: serde_json::Error) -> Self {
        CoreError::SerializationError(err.to_string())
    }
}

impl From<String> for CoreError {
    fn from(err: String) -> Self {
        CoreError::Other(err)
    }
}

impl From<&str> for CoreError {
    fn from(err: &str) -> Self {
        CoreError::Other(err.to_string())
    }
}
