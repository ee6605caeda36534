//! Outbound collaborator contracts

use async_trait::async_trait;
use serde_json::Value;

use crate::domain::envelope::ResponseAction;
use crate::error::CoreError;

/// Upstream discovery service that answers the bootstrap `discover` action
#[async_trait]
pub trait DiscoveryClient: Send + Sync {
    /// Forward the inbound discover body verbatim and return the service's
    /// response document
    async fn discover(&self, payload: &Value) -> Result<Value, CoreError>;

    /// Health check
    async fn health_check(&self) -> Result<bool, CoreError> {
        Ok(true)
    }
}

/// Optional downstream adapter that receives copies of generated responses.
///
/// Calls are best-effort; the orchestrator runs them on detached tasks and
/// only logs failures.
#[async_trait]
pub trait AdapterForwarder: Send + Sync {
    /// Forward a discovery result to the buyer-side receiver
    async fn forward_discovery(&self, response: &Value) -> Result<(), CoreError>;

    /// Forward a generated action response to the seller-side caller
    async fn forward_response(&self, action: ResponseAction, response: &Value) -> Result<(), CoreError>;
}
