//! HTTP forwarder to the downstream protocol adapter

use async_trait::async_trait;
use reqwest::Client;
use sandbox_core::{AdapterForwarder, CoreError, ResponseAction};
use serde_json::Value;
use std::time::Duration;
use tracing::debug;

use crate::error::ServerResult;

/// Posts copies of generated responses to the adapter
#[derive(Debug, Clone)]
pub struct HttpAdapterForwarder {
    client: Client,
    base_url: String,
}

impl HttpAdapterForwarder {
    /// Create a forwarder for `base_url`
    pub fn new(base_url: impl Into<String>, timeout: Duration) -> ServerResult<Self> {
        let client = Client::builder().timeout(timeout).build()?;
        Ok(Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
        })
    }

    /// Receiver URL for discovery results
    pub fn discovery_url(&self) -> String {
        format!("{}/bap/receiver/on_discover", self.base_url)
    }

    /// Caller URL for an action response
    pub fn response_url(&self, action: ResponseAction) -> String {
        format!("{}/bpp/caller/{}", self.base_url, action)
    }

    async fn post(&self, url: &str, body: &Value) -> Result<(), CoreError> {
        let response = self
            .client
            .post(url)
            .json(body)
            .send()
            .await
            .map_err(|e| CoreError::AdapterFailure(format!("Request to {} failed: {}", url, e)))?;
        let status = response.status();
        if !status.is_success() {
            return Err(CoreError::AdapterFailure(format!("{} returned {}", url, status)));
        }
        debug!(url = %url, status = %status, "Forwarded to adapter");
        Ok(())
    }
}

#[async_trait]
impl AdapterForwarder for HttpAdapterForwarder {
    async fn forward_discovery(&self, response: &Value) -> Result<(), CoreError> {
        self.post(&self.discovery_url(), response).await
    }

    async fn forward_response(&self, action: ResponseAction, response: &Value) -> Result<(), CoreError> {
        self.post(&self.response_url(action), response).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_urls() {
        let forwarder = HttpAdapterForwarder::new("http://adapter.local/", Duration::from_secs(1)).unwrap();
        assert_eq!(forwarder.discovery_url(), "http://adapter.local/bap/receiver/on_discover");
        assert_eq!(
            forwarder.response_url(ResponseAction::OnConfirm),
            "http://adapter.local/bpp/caller/on_confirm"
        );
    }
}
