//! Transaction context records

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// One persisted step of a transaction.
///
/// Records are written once under their own `(transaction, action)` key and
/// read by later steps; they are never rewritten in place.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ContextRecord {
    /// Domain string the step was handled under
    pub domain: String,

    /// Response action name, e.g. `on_select`
    pub action: String,

    /// Full outbound response (or discovery service body for `on_discover`)
    pub previous_response: Value,

    /// Inbound request captured for audit/debugging
    #[serde(default)]
    pub current_request: Value,

    /// Creation time
    pub timestamp: DateTime<Utc>,
}

impl ContextRecord {
    /// Create a record stamped with the current time
    pub fn new(
        domain: impl Into<String>,
        action: impl Into<String>,
        previous_response: Value,
        current_request: Value,
    ) -> Self {
        Self {
            domain: domain.into(),
            action: action.into(),
            previous_response,
            current_request,
            timestamp: Utc::now(),
        }
    }

    /// `previousResponse.message`, if present
    pub fn message(&self) -> Option<&Value> {
        self.previous_response.get("message")
    }

    /// `previousResponse.message.order`, if present
    pub fn order(&self) -> Option<&Value> {
        self.message().and_then(|message| message.get("order"))
    }

    /// First catalog of a stored discovery response
    pub fn first_catalog(&self) -> Option<&Value> {
        self.message()
            .and_then(|message| message.get("catalogs"))
            .and_then(|catalogs| catalogs.get(0))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_record_json_layout() {
        let record = ContextRecord::new(
            "ev-charging",
            "on_select",
            json!({"message": {"order": {"beckn:id": "o-1"}}}),
            json!({"context": {"transaction_id": "t1"}, "message": {}}),
        );

        let value = serde_json::to_value(&record).unwrap();
        assert_eq!(value["previousResponse"]["message"]["order"]["beckn:id"], "o-1");
        assert_eq!(value["currentRequest"]["context"]["transaction_id"], "t1");
        assert!(value["timestamp"].is_string());

        let back: ContextRecord = serde_json::from_value(value).unwrap();
        assert_eq!(back, record);
    }

    #[test]
    fn test_accessors() {
        let record = ContextRecord::new(
            "d",
            "on_discover",
            json!({"message": {"catalogs": [{"beckn:id": "cat-1"}]}}),
            Value::Null,
        );
        assert_eq!(record.first_catalog().unwrap()["beckn:id"], "cat-1");
        assert!(record.order().is_none());
    }
}
