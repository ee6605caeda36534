//! Context store implementations
//!
//! An in-memory store for development and tests, and a Redis store behind
//! the `redis` feature. [`create_context_store`] picks one from the
//! configured URL.

use async_trait::async_trait;
use sandbox_core::{context_key, transaction_keys, ContextRecord, ContextStore, CoreError};
use std::collections::HashMap;
use std::sync::{Arc, Mutex, Weak};
use std::time::{Duration, Instant};
use tokio::sync::RwLock;
use tokio::time;
use tracing::{debug, info};

use crate::config::ServerConfig;
use crate::error::{ServerError, ServerResult};

/// Interval between sweeps of expired in-memory entries
const CLEANUP_INTERVAL: Duration = Duration::from_secs(30);

/// Source of the current instant
pub trait Clock: Send + Sync {
    /// Current instant
    fn now(&self) -> Instant;
}

/// Wall clock
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> Instant {
        Instant::now()
    }
}

/// Clock that only moves when told to
#[derive(Debug)]
pub struct ManualClock {
    start: Instant,
    offset: Mutex<Duration>,
}

impl ManualClock {
    /// Clock frozen at the current instant
    pub fn new() -> Self {
        Self {
            start: Instant::now(),
            offset: Mutex::new(Duration::ZERO),
        }
    }

    /// Move the clock forward
    pub fn advance(&self, by: Duration) {
        if let Ok(mut offset) = self.offset.lock() {
            *offset += by;
        }
    }
}

impl Default for ManualClock {
    fn default() -> Self {
        Self::new()
    }
}

impl Clock for ManualClock {
    fn now(&self) -> Instant {
        let offset = self.offset.lock().map(|offset| *offset).unwrap_or_default();
        self.start + offset
    }
}

/// Serialized record with its expiry
struct Entry {
    value: String,
    expires_at: Instant,
}

type Entries = Arc<RwLock<HashMap<String, Entry>>>;

/// In-memory context store.
///
/// Records are kept serialized, exactly as the Redis store keeps them.
/// Expired entries read as absent and are swept in the background.
pub struct InMemoryContextStore {
    entries: Entries,
    clock: Arc<dyn Clock>,
    prefix: String,
    ttl: Duration,
}

impl std::fmt::Debug for InMemoryContextStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("InMemoryContextStore")
            .field("prefix", &self.prefix)
            .field("ttl", &self.ttl)
            .finish()
    }
}

impl InMemoryContextStore {
    /// Store on the wall clock. Must be called within a Tokio runtime.
    pub fn new(prefix: impl Into<String>, ttl: Duration) -> Self {
        Self::with_clock(prefix, ttl, Arc::new(SystemClock))
    }

    /// Store on `clock`. Must be called within a Tokio runtime.
    pub fn with_clock(prefix: impl Into<String>, ttl: Duration, clock: Arc<dyn Clock>) -> Self {
        info!("Creating new InMemoryContextStore");
        let entries: Entries = Arc::new(RwLock::new(HashMap::new()));
        tokio::spawn(Self::cleanup_task(Arc::downgrade(&entries), clock.clone()));
        Self {
            entries,
            clock,
            prefix: prefix.into(),
            ttl,
        }
    }

    /// Number of stored entries, expired or not
    pub async fn len(&self) -> usize {
        self.entries.read().await.len()
    }

    /// Whether nothing is stored
    pub async fn is_empty(&self) -> bool {
        self.entries.read().await.is_empty()
    }

    /// Remove every expired entry, returning how many were removed
    pub async fn purge_expired(&self) -> usize {
        Self::purge(&self.entries, self.clock.now()).await
    }

    async fn purge(entries: &RwLock<HashMap<String, Entry>>, now: Instant) -> usize {
        let mut entries = entries.write().await;
        let before = entries.len();
        entries.retain(|_, entry| entry.expires_at > now);
        before - entries.len()
    }

    /// Periodic sweep; stops once the store is dropped
    async fn cleanup_task(entries: Weak<RwLock<HashMap<String, Entry>>>, clock: Arc<dyn Clock>) {
        let mut interval = time::interval(CLEANUP_INTERVAL);
        interval.tick().await;
        loop {
            interval.tick().await;
            let Some(entries) = entries.upgrade() else {
                break;
            };
            let removed = Self::purge(&entries, clock.now()).await;
            if removed > 0 {
                info!("Context store cleanup removed {} expired records", removed);
            }
        }
    }
}

#[async_trait]
impl ContextStore for InMemoryContextStore {
    async fn put(&self, transaction_id: &str, action: &str, record: &ContextRecord) -> Result<(), CoreError> {
        let key = context_key(&self.prefix, transaction_id, action);
        let value = serde_json::to_string(record)?;
        let expires_at = self.clock.now() + self.ttl;
        self.entries.write().await.insert(key.clone(), Entry { value, expires_at });
        debug!(key = %key, "Stored context record");
        Ok(())
    }

    async fn get(&self, transaction_id: &str, action: &str) -> Result<Option<ContextRecord>, CoreError> {
        let key = context_key(&self.prefix, transaction_id, action);
        let entries = self.entries.read().await;
        match entries.get(&key) {
            Some(entry) if entry.expires_at > self.clock.now() => Ok(Some(serde_json::from_str(&entry.value)?)),
            _ => Ok(None),
        }
    }

    async fn delete_all(&self, transaction_id: &str) -> Result<usize, CoreError> {
        let mut entries = self.entries.write().await;
        let removed = transaction_keys(&self.prefix, transaction_id)
            .iter()
            .filter(|key| entries.remove(*key).is_some())
            .count();
        debug!(transaction_id = %transaction_id, removed, "Deleted transaction context");
        Ok(removed)
    }
}

// Redis implementation if the redis feature is enabled
#[cfg(feature = "redis")]
pub mod redis {
    use super::*;
    use ::redis::aio::ConnectionManager;
    use ::redis::{AsyncCommands, Client, RedisResult};
    use std::future::Future;
    use tracing::{error, warn};

    use crate::config::RedisSettings;

    /// Longest pause between retries
    const MAX_BACKOFF_MS: u64 = 500;

    /// Redis-backed context store.
    ///
    /// One connection manager is established up front. When that first
    /// connection fails the store stays unavailable for the life of the
    /// process and every call returns `StoreUnavailable`.
    pub struct RedisContextStore {
        connection: RwLock<Option<ConnectionManager>>,
        prefix: String,
        ttl_seconds: u64,
        max_retries: u32,
    }

    impl std::fmt::Debug for RedisContextStore {
        fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
            f.debug_struct("RedisContextStore")
                .field("prefix", &self.prefix)
                .field("ttl_seconds", &self.ttl_seconds)
                .field("max_retries", &self.max_retries)
                .finish()
        }
    }

    impl RedisContextStore {
        /// Connect to `url`. Never fails; an unreachable server yields an
        /// unavailable store.
        pub async fn connect(url: &str, settings: &RedisSettings) -> Self {
            info!("Creating new RedisContextStore with URL: {}", url);
            let connection = match Self::open(url, settings.connect_timeout_ms).await {
                Ok(manager) => {
                    info!("Connected to Redis");
                    Some(manager)
                }
                Err(e) => {
                    error!(error = %e, "Redis connection failed, context store disabled");
                    None
                }
            };
            Self {
                connection: RwLock::new(connection),
                prefix: settings.key_prefix.clone(),
                ttl_seconds: settings.ttl_seconds,
                max_retries: settings.max_retries.max(1),
            }
        }

        async fn open(url: &str, timeout_ms: u64) -> Result<ConnectionManager, CoreError> {
            let client = Client::open(url).map_err(|e| CoreError::StoreUnavailable(format!("Invalid Redis URL: {}", e)))?;
            match time::timeout(Duration::from_millis(timeout_ms), ConnectionManager::new(client)).await {
                Ok(Ok(manager)) => Ok(manager),
                Ok(Err(e)) => Err(CoreError::StoreUnavailable(format!("Redis connection error: {}", e))),
                Err(_) => Err(CoreError::StoreUnavailable(format!(
                    "Timed out connecting to Redis after {}ms",
                    timeout_ms
                ))),
            }
        }

        /// Whether the initial connection succeeded and the store is open
        pub async fn is_connected(&self) -> bool {
            self.connection.read().await.is_some()
        }

        async fn manager(&self) -> Result<ConnectionManager, CoreError> {
            self.connection
                .read()
                .await
                .clone()
                .ok_or_else(|| CoreError::StoreUnavailable("Redis connection not established".to_string()))
        }

        /// Run `op` with bounded retries
        async fn with_retry<T, F, Fut>(&self, name: &str, mut op: F) -> Result<T, CoreError>
        where
            F: FnMut(ConnectionManager) -> Fut,
            Fut: Future<Output = RedisResult<T>>,
        {
            let manager = self.manager().await?;
            let mut attempt = 0u32;
            loop {
                attempt += 1;
                match op(manager.clone()).await {
                    Ok(value) => return Ok(value),
                    Err(e) if attempt < self.max_retries => {
                        let backoff = backoff_ms(attempt);
                        warn!(operation = name, attempt, backoff_ms = backoff, error = %e, "Redis operation failed, retrying");
                        time::sleep(Duration::from_millis(backoff)).await;
                    }
                    Err(e) => return Err(CoreError::StoreFailure(format!("Redis {} error: {}", name, e))),
                }
            }
        }
    }

    /// Pause before retry `attempt`
    pub fn backoff_ms(attempt: u32) -> u64 {
        (u64::from(attempt) * 50).min(MAX_BACKOFF_MS)
    }

    #[async_trait]
    impl ContextStore for RedisContextStore {
        async fn put(&self, transaction_id: &str, action: &str, record: &ContextRecord) -> Result<(), CoreError> {
            let key = context_key(&self.prefix, transaction_id, action);
            let value = serde_json::to_string(record)?;
            let ttl = self.ttl_seconds as usize;
            self.with_retry("set", |mut conn| {
                let key = key.clone();
                let value = value.clone();
                async move { conn.set_ex::<_, _, ()>(key, value, ttl).await }
            })
            .await?;
            debug!(key = %key, ttl_seconds = self.ttl_seconds, "Stored context record");
            Ok(())
        }

        async fn get(&self, transaction_id: &str, action: &str) -> Result<Option<ContextRecord>, CoreError> {
            let key = context_key(&self.prefix, transaction_id, action);
            let raw: Option<String> = self
                .with_retry("get", |mut conn| {
                    let key = key.clone();
                    async move { conn.get(key).await }
                })
                .await?;
            match raw {
                Some(raw) => Ok(Some(serde_json::from_str(&raw)?)),
                None => Ok(None),
            }
        }

        async fn delete_all(&self, transaction_id: &str) -> Result<usize, CoreError> {
            let keys = transaction_keys(&self.prefix, transaction_id);
            let removed: usize = self
                .with_retry("del", |mut conn| {
                    let keys = keys.clone();
                    async move { conn.del(keys).await }
                })
                .await?;
            debug!(transaction_id = %transaction_id, removed, "Deleted transaction context");
            Ok(removed)
        }

        async fn health_check(&self) -> Result<bool, CoreError> {
            let pong: String = self
                .with_retry("ping", |mut conn| async move { ::redis::cmd("PING").query_async(&mut conn).await })
                .await?;
            Ok(pong == "PONG")
        }

        async fn close(&self) -> Result<(), CoreError> {
            if self.connection.write().await.take().is_some() {
                info!("Redis connection closed");
            }
            Ok(())
        }
    }

}

/// Factory function to create a context store based on the configured URL
pub async fn create_context_store(config: &ServerConfig) -> ServerResult<Arc<dyn ContextStore>> {
    let url = config.context_store_url.as_str();
    let ttl = Duration::from_secs(config.redis.ttl_seconds);

    if url.starts_with("memory://") || (url.starts_with("redis://") && !config.redis.enabled) {
        info!("Using in-memory context store");
        return Ok(Arc::new(InMemoryContextStore::new(config.redis.key_prefix.clone(), ttl)));
    }

    if url.starts_with("redis://") {
        #[cfg(feature = "redis")]
        {
            info!("Using Redis context store");
            let store = redis::RedisContextStore::connect(url, &config.redis).await;
            return Ok(Arc::new(store));
        }

        #[cfg(not(feature = "redis"))]
        {
            tracing::error!("Redis context store requested but 'redis' feature not enabled");
            return Err(ServerError::ContextStoreError(
                "Redis context store requested but 'redis' feature not enabled".to_string(),
            ));
        }
    }

    Err(ServerError::ConfigError(format!("Unsupported context store URL: {}", url)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn record(action: &str) -> ContextRecord {
        ContextRecord::new("d1", action, json!({ "message": { "order": { "beckn:id": "o-1" } } }), json!({}))
    }

    #[tokio::test]
    async fn test_put_get_roundtrip_keeps_record() {
        let store = InMemoryContextStore::new("test_", Duration::from_secs(60));
        let stored = record("on_select");
        store.put("t1", "on_select", &stored).await.unwrap();

        assert_eq!(store.get("t1", "on_select").await.unwrap(), Some(stored));
        assert_eq!(store.get("t1", "on_init").await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_expired_record_reads_as_absent() {
        let clock = Arc::new(ManualClock::new());
        let store = InMemoryContextStore::with_clock("test_", Duration::from_secs(60), clock.clone());
        store.put("t1", "on_select", &record("on_select")).await.unwrap();

        clock.advance(Duration::from_secs(59));
        assert!(store.get("t1", "on_select").await.unwrap().is_some());

        clock.advance(Duration::from_secs(1));
        assert!(store.get("t1", "on_select").await.unwrap().is_none());
        assert_eq!(store.purge_expired().await, 1);
        assert!(store.is_empty().await);
    }

    #[tokio::test]
    async fn test_delete_all_scopes_to_transaction() {
        let store = InMemoryContextStore::new("test_", Duration::from_secs(60));
        store.put("t1", "on_select", &record("on_select")).await.unwrap();
        store.put("t1", "on_init", &record("on_init")).await.unwrap();
        store.put("t10", "on_select", &record("on_select")).await.unwrap();

        assert_eq!(store.delete_all("t1").await.unwrap(), 2);
        assert_eq!(store.len().await, 1);
        assert!(store.get("t10", "on_select").await.unwrap().is_some());
    }

    #[tokio::test]
    async fn test_delete_all_leaves_transactions_sharing_a_prefix() {
        let store = InMemoryContextStore::new("test_", Duration::from_secs(60));
        store.put("t1", "on_select", &record("on_select")).await.unwrap();
        store.put("t1_retry", "on_select", &record("on_select")).await.unwrap();

        assert_eq!(store.delete_all("t1").await.unwrap(), 1);
        assert!(store.get("t1_retry", "on_select").await.unwrap().is_some());
    }

    #[tokio::test]
    async fn test_delete_all_treats_wildcard_literally() {
        let store = InMemoryContextStore::new("test_", Duration::from_secs(60));
        store.put("t1", "on_select", &record("on_select")).await.unwrap();
        store.put("t2", "on_init", &record("on_init")).await.unwrap();

        assert_eq!(store.delete_all("*").await.unwrap(), 0);
        assert_eq!(store.len().await, 2);
    }

    #[tokio::test]
    async fn test_factory_honours_redis_flag() {
        let mut config = ServerConfig::default();
        config.redis.enabled = false;
        let store = create_context_store(&config).await.unwrap();
        assert!(store.health_check().await.unwrap());

        config.context_store_url = "etcd://local".to_string();
        assert!(matches!(create_context_store(&config).await, Err(ServerError::ConfigError(_))));
    }
}
