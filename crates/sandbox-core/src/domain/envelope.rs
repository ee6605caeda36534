//! Protocol envelope types
//!
//! Every message exchanged with a buyer platform carries a `context` object
//! (the envelope) next to its `message` body.

use chrono::{SecondsFormat, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{json, Map, Value};
use std::fmt;
use std::str::FromStr;

/// Protocol version used when the inbound envelope carries none
pub const DEFAULT_PROTOCOL_VERSION: &str = "2.0.0";

/// Time-to-live hint used when the inbound envelope carries none
pub const DEFAULT_TTL: &str = "PT30S";

/// Prefix that marks a response action
pub const RESPONSE_MARKER: &str = "on_";

/// Protocol envelope (`context` object)
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ProtocolContext {
    /// Protocol version
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub version: Option<String>,

    /// Action name
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub action: Option<String>,

    /// Domain identifier as sent by the caller
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub domain: Option<String>,

    /// RFC 3339 timestamp
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timestamp: Option<String>,

    /// Message identifier
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message_id: Option<String>,

    /// Transaction identifier shared by every step of one conversation
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub transaction_id: Option<String>,

    /// Buyer platform id
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bap_id: Option<String>,

    /// Buyer platform callback URI
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bap_uri: Option<String>,

    /// Seller platform id
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bpp_id: Option<String>,

    /// Seller platform URI
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bpp_uri: Option<String>,

    /// Time-to-live hint
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ttl: Option<String>,

    /// Any other inbound fields, kept so stored requests stay verbatim
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl ProtocolContext {
    /// Non-empty transaction id, if any
    pub fn transaction_id(&self) -> Option<&str> {
        self.transaction_id.as_deref().filter(|id| !id.is_empty())
    }

    /// Compose the outbound envelope for `action`.
    ///
    /// The transaction id and the four endpoint identifiers are echoed
    /// unchanged; the timestamp is fresh.
    pub fn reply(&self, action: &str, domain: Option<&str>) -> ProtocolContext {
        ProtocolContext {
            version: Some(
                self.version
                    .clone()
                    .unwrap_or_else(|| DEFAULT_PROTOCOL_VERSION.to_string()),
            ),
            action: Some(action.to_string()),
            domain: domain.map(str::to_string),
            timestamp: Some(now_rfc3339()),
            message_id: self.message_id.clone(),
            transaction_id: self.transaction_id.clone(),
            bap_id: self.bap_id.clone(),
            bap_uri: self.bap_uri.clone(),
            bpp_id: self.bpp_id.clone(),
            bpp_uri: self.bpp_uri.clone(),
            ttl: Some(self.ttl.clone().unwrap_or_else(|| DEFAULT_TTL.to_string())),
            extra: Map::new(),
        }
    }
}

/// Inbound action request: envelope plus message body
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct InboundRequest {
    /// Envelope; absent envelopes are rejected by the orchestrator
    #[serde(default)]
    pub context: Option<ProtocolContext>,

    /// Action-specific payload
    #[serde(default)]
    pub message: Value,
}

impl InboundRequest {
    /// Build a request from an envelope and a message body
    pub fn new(context: ProtocolContext, message: Value) -> Self {
        Self {
            context: Some(context),
            message,
        }
    }

    /// The request as plain JSON, as persisted under `currentRequest`
    pub fn to_value(&self) -> Value {
        json!({
            "context": self.context,
            "message": self.message,
        })
    }
}

/// Outbound response: envelope plus message body
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProtocolResponse {
    /// Outbound envelope
    pub context: ProtocolContext,
    /// Shaped message body
    pub message: Value,
}

impl ProtocolResponse {
    /// Negative acknowledgement that echoes the caller's envelope
    pub fn nack(context: Value) -> Value {
        json!({
            "context": context,
            "message": { "ack": { "status": "NACK" } }
        })
    }

    /// Positive acknowledgement body
    pub fn ack() -> Value {
        json!({ "message": { "ack": { "status": "ACK" } } })
    }

    /// Response as plain JSON
    pub fn to_value(&self) -> Value {
        json!({
            "context": self.context,
            "message": self.message,
        })
    }
}

/// Normalize an action name to its response form
///
/// `select` becomes `on_select`; `on_select` is returned unchanged.
pub fn to_response_action(action: &str) -> String {
    if action.starts_with(RESPONSE_MARKER) {
        action.to_string()
    } else {
        format!("{}{}", RESPONSE_MARKER, action)
    }
}

/// Current UTC time in RFC 3339 with millisecond precision
pub fn now_rfc3339() -> String {
    Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true)
}

/// Response actions this responder knows how to produce
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ResponseAction {
    /// Catalog returned by the discovery service
    OnDiscover,
    /// Quote for the selected item
    OnSelect,
    /// Order initialized with buyer and payment terms
    OnInit,
    /// Order confirmed
    OnConfirm,
    /// Order status
    OnStatus,
    /// Order cancelled
    OnCancel,
    /// Order updated
    OnUpdate,
    /// Rating acknowledged
    OnRating,
    /// Support details
    OnSupport,
    /// Tracking details
    OnTrack,
}

impl ResponseAction {
    /// All response actions in protocol order
    pub const ALL: [ResponseAction; 10] = [
        ResponseAction::OnDiscover,
        ResponseAction::OnSelect,
        ResponseAction::OnInit,
        ResponseAction::OnConfirm,
        ResponseAction::OnStatus,
        ResponseAction::OnCancel,
        ResponseAction::OnUpdate,
        ResponseAction::OnRating,
        ResponseAction::OnSupport,
        ResponseAction::OnTrack,
    ];

    /// Wire name, e.g. `on_select`
    pub fn as_str(&self) -> &'static str {
        match self {
            ResponseAction::OnDiscover => "on_discover",
            ResponseAction::OnSelect => "on_select",
            ResponseAction::OnInit => "on_init",
            ResponseAction::OnConfirm => "on_confirm",
            ResponseAction::OnStatus => "on_status",
            ResponseAction::OnCancel => "on_cancel",
            ResponseAction::OnUpdate => "on_update",
            ResponseAction::OnRating => "on_rating",
            ResponseAction::OnSupport => "on_support",
            ResponseAction::OnTrack => "on_track",
        }
    }

    /// Request action this response answers, e.g. `select`
    pub fn request_name(&self) -> &'static str {
        &self.as_str()[RESPONSE_MARKER.len()..]
    }

    /// Actions whose body is never wrapped, whatever the domain policy
    pub fn is_always_bare(&self) -> bool {
        matches!(
            self,
            ResponseAction::OnTrack | ResponseAction::OnRating | ResponseAction::OnSupport
        )
    }
}

impl fmt::Display for ResponseAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ResponseAction {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized = to_response_action(s);
        ResponseAction::ALL
            .iter()
            .copied()
            .find(|action| action.as_str() == normalized)
            .ok_or_else(|| format!("Unknown action: {}", s))
    }
}
