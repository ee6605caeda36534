//! HTTP client for the upstream discovery service

use async_trait::async_trait;
use reqwest::Client;
use sandbox_core::{CoreError, DiscoveryClient};
use serde_json::Value;
use std::time::Duration;
use tracing::{debug, error};

use crate::error::ServerResult;

/// Path appended to the discovery service base URL
pub const DISCOVER_PATH: &str = "/beckn/discover";

/// Posts discover requests to `{endpoint}/beckn/discover`
#[derive(Debug, Clone)]
pub struct HttpDiscoveryClient {
    client: Client,
    endpoint: Option<String>,
}

impl HttpDiscoveryClient {
    /// Create a client; with no endpoint every discover call fails
    pub fn new(endpoint: Option<String>, timeout: Duration) -> ServerResult<Self> {
        let client = Client::builder().timeout(timeout).build()?;
        Ok(Self {
            client,
            endpoint: endpoint.map(|url| url.trim_end_matches('/').to_string()),
        })
    }

    /// Full discover URL, if configured
    pub fn discover_url(&self) -> Option<String> {
        self.endpoint.as_ref().map(|base| format!("{}{}", base, DISCOVER_PATH))
    }
}

#[async_trait]
impl DiscoveryClient for HttpDiscoveryClient {
    async fn discover(&self, payload: &Value) -> Result<Value, CoreError> {
        let url = self
            .discover_url()
            .ok_or_else(|| CoreError::UpstreamDiscoveryFailure("Discovery endpoint not configured".to_string()))?;
        debug!(url = %url, "Forwarding discover request");

        let response = self.client.post(&url).json(payload).send().await.map_err(|e| {
            error!(url = %url, error = %e, "Discovery request failed");
            CoreError::UpstreamDiscoveryFailure(format!("Request to {} failed: {}", url, e))
        })?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            error!(url = %url, status = %status, "Discovery service returned an error");
            return Err(CoreError::UpstreamDiscoveryFailure(format!(
                "Discovery service returned {}: {}",
                status, body
            )));
        }

        response
            .json::<Value>()
            .await
            .map_err(|e| CoreError::UpstreamDiscoveryFailure(format!("Invalid discovery response: {}", e)))
    }

    async fn health_check(&self) -> Result<bool, CoreError> {
        Ok(self.endpoint.is_some())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_discover_url_trims_trailing_slash() {
        let client = HttpDiscoveryClient::new(Some("http://cds.local/".to_string()), Duration::from_secs(1)).unwrap();
        assert_eq!(client.discover_url().as_deref(), Some("http://cds.local/beckn/discover"));

        let unset = HttpDiscoveryClient::new(None, Duration::from_secs(1)).unwrap();
        assert!(unset.discover_url().is_none());
    }
}
