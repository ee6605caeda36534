use std::sync::Arc;
use std::time::Duration;

use serde_json::json;

use sandbox_core::{ContextRecord, ContextStore};
use sandbox_server::context_store::{InMemoryContextStore, ManualClock};

fn record(action: &str, order_id: &str) -> ContextRecord {
    ContextRecord::new(
        "beckn.one:commerce:aviation:1.0",
        action,
        json!({ "message": { "order": { "beckn:id": order_id } } }),
        json!({ "context": { "action": action } }),
    )
}

#[tokio::test]
async fn test_last_write_wins() {
    let store = InMemoryContextStore::new("bpp_sandbox_", Duration::from_secs(60));

    store.put("txn-1", "on_select", &record("on_select", "first")).await.unwrap();
    store.put("txn-1", "on_select", &record("on_select", "second")).await.unwrap();

    let stored = store.get("txn-1", "on_select").await.unwrap().unwrap();
    assert_eq!(stored.previous_response["message"]["order"]["beckn:id"], "second");
    assert_eq!(store.len().await, 1);
}

#[tokio::test]
async fn test_overwrite_refreshes_ttl() {
    let clock = Arc::new(ManualClock::new());
    let store = InMemoryContextStore::with_clock("bpp_sandbox_", Duration::from_secs(60), clock.clone());

    store.put("txn-1", "on_init", &record("on_init", "first")).await.unwrap();
    clock.advance(Duration::from_secs(45));
    store.put("txn-1", "on_init", &record("on_init", "second")).await.unwrap();
    clock.advance(Duration::from_secs(45));

    let stored = store.get("txn-1", "on_init").await.unwrap().unwrap();
    assert_eq!(stored.previous_response["message"]["order"]["beckn:id"], "second");
}

#[tokio::test]
async fn test_concurrent_writers_on_distinct_transactions() {
    let store = Arc::new(InMemoryContextStore::new("bpp_sandbox_", Duration::from_secs(60)));

    let mut handles = Vec::new();
    for i in 0..20 {
        let store = store.clone();
        handles.push(tokio::spawn(async move {
            let transaction_id = format!("txn-{}", i);
            store
                .put(&transaction_id, "on_confirm", &record("on_confirm", &transaction_id))
                .await
        }));
    }
    for handle in handles {
        handle.await.unwrap().unwrap();
    }

    assert_eq!(store.len().await, 20);
    let stored = store.get("txn-7", "on_confirm").await.unwrap().unwrap();
    assert_eq!(stored.previous_response["message"]["order"]["beckn:id"], "txn-7");
}

#[tokio::test(start_paused = true)]
async fn test_background_sweep_removes_expired_records() {
    let clock = Arc::new(ManualClock::new());
    let store = InMemoryContextStore::with_clock("bpp_sandbox_", Duration::from_secs(10), clock.clone());
    store.put("txn-1", "on_status", &record("on_status", "o-1")).await.unwrap();
    store.put("txn-2", "on_status", &record("on_status", "o-2")).await.unwrap();

    clock.advance(Duration::from_secs(11));
    tokio::time::sleep(Duration::from_secs(31)).await;

    assert!(store.is_empty().await);
}

#[tokio::test]
async fn test_delete_all_on_unknown_transaction() {
    let store = InMemoryContextStore::new("bpp_sandbox_", Duration::from_secs(60));
    store.put("txn-1", "on_select", &record("on_select", "o-1")).await.unwrap();

    assert_eq!(store.delete_all("txn-unknown").await.unwrap(), 0);
    assert_eq!(store.len().await, 1);
}
