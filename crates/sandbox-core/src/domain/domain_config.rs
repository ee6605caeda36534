//! Domain configuration

use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use std::fmt;
use std::sync::Arc;

use crate::domain::envelope::ResponseAction;
use crate::domain::generator::ResponseGenerator;

/// How a domain's generated bodies are placed in the outbound `message`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum MessageStructure {
    /// Wrap bodies as `{"order": body}`
    #[default]
    Order,
    /// Bodies are tracking objects, returned bare
    Tracking,
    /// Bodies are feedback objects, returned bare
    Feedback,
    /// Bodies are support objects, returned bare
    Support,
    /// Bodies are returned bare
    Custom,
}

impl MessageStructure {
    /// Shape a generated body into the outbound `message`.
    ///
    /// Tracking, rating and support responses are always bare.
    pub fn shape(&self, action: ResponseAction, body: Value) -> Value {
        if action.is_always_bare() {
            return body;
        }
        match self {
            MessageStructure::Order => json!({ "order": body }),
            _ => body,
        }
    }
}

/// One protocol domain: identifier, match patterns and generators
#[derive(Clone)]
pub struct DomainConfig {
    /// Canonical domain identifier
    pub domain: String,
    /// Alternate strings used to resolve incoming domain strings
    pub match_patterns: Vec<String>,
    /// Message structure policy
    pub message_structure: MessageStructure,
    /// Response generators for this domain
    pub generators: Arc<dyn ResponseGenerator>,
}

impl DomainConfig {
    /// Create a configuration with the `order` message structure
    pub fn new(domain: impl Into<String>, generators: Arc<dyn ResponseGenerator>) -> Self {
        Self {
            domain: domain.into(),
            match_patterns: Vec::new(),
            message_structure: MessageStructure::Order,
            generators,
        }
    }

    /// Add match patterns
    pub fn with_patterns<I, S>(mut self, patterns: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.match_patterns.extend(patterns.into_iter().map(Into::into));
        self
    }

    /// Set the message structure policy
    pub fn with_message_structure(mut self, structure: MessageStructure) -> Self {
        self.message_structure = structure;
        self
    }
}

impl fmt::Debug for DomainConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DomainConfig")
            .field("domain", &self.domain)
            .field("match_patterns", &self.match_patterns)
            .field("message_structure", &self.message_structure)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_order_structure_wraps_order_actions() {
        let shaped = MessageStructure::Order.shape(ResponseAction::OnSelect, json!({"price": 10}));
        assert_eq!(shaped, json!({"order": {"price": 10}}));
    }

    #[test]
    fn test_bare_actions_ignore_policy() {
        for action in [ResponseAction::OnTrack, ResponseAction::OnRating, ResponseAction::OnSupport] {
            let shaped = MessageStructure::Order.shape(action, json!({"x": 1}));
            assert_eq!(shaped, json!({"x": 1}), "{} should be bare", action);
        }
    }

    #[test]
    fn test_custom_structure_is_bare() {
        let shaped = MessageStructure::Custom.shape(ResponseAction::OnConfirm, json!({"y": 2}));
        assert_eq!(shaped, json!({"y": 2}));
    }
}
