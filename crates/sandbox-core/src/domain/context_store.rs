//! Context store contract
//!
//! The store is a time-boxed key/value service holding one
//! [`ContextRecord`] per `(transaction, action)`. Implementations live in the
//! server crate; this module owns the contract and the key layout.

use async_trait::async_trait;

use crate::domain::context_record::ContextRecord;
use crate::domain::envelope::ResponseAction;
use crate::error::CoreError;

/// Default key namespace
pub const DEFAULT_KEY_PREFIX: &str = "bpp_sandbox_";

/// Default record lifetime: 15 days
pub const DEFAULT_TTL_SECONDS: u64 = 15 * 24 * 3600;

/// Key a record is stored under: `<prefix><transactionId>_<actionName>`
pub fn context_key(prefix: &str, transaction_id: &str, action: &str) -> String {
    format!("{}{}_{}", prefix, transaction_id, action)
}

/// Every key a transaction can own, one per response action.
///
/// Exact keys only: `t1` never covers `t1_retry`, and `*` is a literal id.
pub fn transaction_keys(prefix: &str, transaction_id: &str) -> Vec<String> {
    ResponseAction::ALL
        .iter()
        .map(|action| context_key(prefix, transaction_id, action.as_str()))
        .collect()
}

/// Time-boxed store of transaction context records.
///
/// Every method reports failures as `Err`; callers on the request path
/// decide to degrade (treat as "no context" or "not persisted") rather than
/// fail the request.
#[async_trait]
pub trait ContextStore: Send + Sync {
    /// Write `record` under `(transaction_id, action)` with the store's TTL,
    /// replacing any existing value for that key
    async fn put(&self, transaction_id: &str, action: &str, record: &ContextRecord) -> Result<(), CoreError>;

    /// Read the record under `(transaction_id, action)`; `Ok(None)` when the
    /// key is absent or expired
    async fn get(&self, transaction_id: &str, action: &str) -> Result<Option<ContextRecord>, CoreError>;

    /// Remove every record of the transaction, returning how many were removed
    async fn delete_all(&self, transaction_id: &str) -> Result<usize, CoreError>;

    /// Health check
    async fn health_check(&self) -> Result<bool, CoreError> {
        Ok(true)
    }

    /// Release the underlying connection
    async fn close(&self) -> Result<(), CoreError> {
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_key_layout() {
        assert_eq!(context_key("bpp_sandbox_", "t1", "on_select"), "bpp_sandbox_t1_on_select");
        let keys = transaction_keys("bpp_sandbox_", "t1");
        assert_eq!(keys.len(), ResponseAction::ALL.len());
        assert!(keys.contains(&"bpp_sandbox_t1_on_discover".to_string()));
        assert!(keys.contains(&"bpp_sandbox_t1_on_track".to_string()));
    }

    #[test]
    fn test_default_ttl_is_fifteen_days() {
        assert_eq!(DEFAULT_TTL_SECONDS, 1_296_000);
    }
}
