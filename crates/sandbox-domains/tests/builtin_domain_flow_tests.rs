use async_trait::async_trait;
use serde_json::{json, Value};
use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use sandbox_core::{
    ContextRecord, ContextStore, CoreError, DiscoveryClient, DomainRegistry, FlowOrchestrator, InboundRequest,
    ProtocolContext,
};
use sandbox_domains::{aviation, ev_charging, hospitality, register_builtin_domains, ride_hailing};

#[derive(Default)]
struct MemoryStore {
    records: Mutex<HashMap<(String, String), ContextRecord>>,
}

#[async_trait]
impl ContextStore for MemoryStore {
    async fn put(&self, transaction_id: &str, action: &str, record: &ContextRecord) -> Result<(), CoreError> {
        self.records
            .lock()
            .unwrap()
            .insert((transaction_id.to_string(), action.to_string()), record.clone());
        Ok(())
    }

    async fn get(&self, transaction_id: &str, action: &str) -> Result<Option<ContextRecord>, CoreError> {
        Ok(self
            .records
            .lock()
            .unwrap()
            .get(&(transaction_id.to_string(), action.to_string()))
            .cloned())
    }

    async fn delete_all(&self, transaction_id: &str) -> Result<usize, CoreError> {
        let mut records = self.records.lock().unwrap();
        let before = records.len();
        records.retain(|(txn, _), _| txn != transaction_id);
        Ok(before - records.len())
    }
}

/// Discovery service answering with a fixed catalog
struct CatalogDiscovery {
    catalog: Value,
}

#[async_trait]
impl DiscoveryClient for CatalogDiscovery {
    async fn discover(&self, _payload: &Value) -> Result<Value, CoreError> {
        Ok(json!({ "message": { "catalogs": [self.catalog.clone()] } }))
    }
}

fn registry() -> Arc<DomainRegistry> {
    let mut builder = DomainRegistry::builder();
    register_builtin_domains(&mut builder);
    Arc::new(builder.build())
}

fn orchestrator(catalog: Value) -> FlowOrchestrator {
    FlowOrchestrator::new(
        registry(),
        Arc::new(MemoryStore::default()),
        Arc::new(CatalogDiscovery { catalog }),
    )
}

fn request(action: &str, transaction_id: &str, domain: &str, message: Value) -> InboundRequest {
    let context: ProtocolContext = serde_json::from_value(json!({
        "action": action,
        "domain": domain,
        "transaction_id": transaction_id,
        "message_id": format!("msg-{}", action),
        "bap_id": "bap.example.com",
        "bpp_id": "bpp.example.com"
    }))
    .unwrap();
    InboundRequest::new(context, message)
}

async fn order_for(flow: &FlowOrchestrator, action: &str, transaction_id: &str, domain: &str, message: Value) -> Value {
    let outcome = flow
        .handle_action(request(action, transaction_id, domain, message))
        .await
        .unwrap();
    assert!(!outcome.is_fallback(), "{} fell back", action);
    outcome.into_response().message["order"].clone()
}

#[test]
fn test_builtin_domains_resolve_by_id_and_pattern() {
    let registry = registry();
    assert_eq!(registry.len(), 4);

    let cases = [
        (ev_charging::DOMAIN, ev_charging::DOMAIN),
        ("EV-CHARGING", ev_charging::DOMAIN),
        ("beckn.one:deg:ev-charging:2.0", ev_charging::DOMAIN),
        ("flight", aviation::DOMAIN),
        ("beckn.one:commerce:aviation:1.0", aviation::DOMAIN),
        ("TAXI", ride_hailing::DOMAIN),
        ("acme:mobility:ride-hailing:2.1", ride_hailing::DOMAIN),
        (hospitality::DOMAIN, hospitality::DOMAIN),
    ];
    for (requested, expected) in cases {
        let config = registry.resolve(requested).unwrap();
        assert_eq!(config.domain, expected, "resolving {}", requested);
    }
    assert!(registry.resolve("retail:groceries").is_none());
}

#[tokio::test]
async fn test_flight_booking_flow_carries_context() {
    let flow = orchestrator(json!({
        "beckn:items": [{
            "beckn:id": "item-dl145",
            "beckn:itemAttributes": { "flight:flightNumber": "DL145", "flight:cabinClass": "ECONOMY" }
        }],
        "beckn:offers": [{
            "beckn:id": "offer-dl145",
            "beckn:items": ["item-dl145"],
            "beckn:price": { "schema:price": 280.0, "schema:priceCurrency": "USD" }
        }]
    }));
    let domain = aviation::DOMAIN;

    let catalog = flow
        .discover(json!({ "context": { "transaction_id": "txn-fl", "domain": domain } }))
        .await
        .unwrap();
    assert_eq!(catalog["message"]["catalogs"][0]["beckn:offers"][0]["beckn:id"], "offer-dl145");

    let quoted = order_for(
        &flow,
        "select",
        "txn-fl",
        domain,
        json!({ "order": { "beckn:orderItems": [{ "beckn:orderedItem": "item-dl145" }] } }),
    )
    .await;
    assert_eq!(quoted["beckn:orderValue"]["schema:price"], 307.6);
    assert_eq!(quoted["beckn:orderItems"][0]["beckn:orderItemAttributes"]["flight:flightNumber"], "DL145");

    let initialized = order_for(
        &flow,
        "init",
        "txn-fl",
        domain,
        json!({ "order": { "beckn:orderItems": [{
            "beckn:orderedItem": "item-dl145",
            "beckn:acceptedOffer": { "beckn:addOnItems": [{ "@id": "addon-item-checked-baggage" }] }
        }]}}),
    )
    .await;
    assert_eq!(initialized["beckn:orderValue"]["schema:price"], 344.18);

    let confirmed = order_for(&flow, "confirm", "txn-fl", domain, json!({ "order": {} })).await;
    assert_eq!(confirmed["beckn:orderStatus"], "CONFIRMED");
    assert_eq!(confirmed["beckn:orderValue"]["schema:price"], 344.18);
    let pnr = confirmed["beckn:orderAttributes"]["pnr"].as_str().unwrap().to_string();

    let status = order_for(&flow, "status", "txn-fl", domain, json!({ "order": {} })).await;
    assert_eq!(status["beckn:orderAttributes"]["pnr"], pnr);

    let cancelled = order_for(&flow, "cancel", "txn-fl", domain, json!({ "order": {} })).await;
    assert_eq!(cancelled["beckn:orderValue"]["schema:price"], 309.18);
    assert_eq!(cancelled["beckn:orderAttributes"]["refundAmount"], 109.18);
    assert_eq!(cancelled["beckn:orderAttributes"]["pnr"], pnr);
}

#[tokio::test]
async fn test_ride_flow_by_pattern_domain() {
    let flow = orchestrator(json!({ "beckn:items": [], "beckn:offers": [] }));

    let confirmed = order_for(&flow, "confirm", "txn-ride", "taxi", json!({ "order": {} })).await;
    assert_eq!(confirmed["beckn:orderStatus"], "CONFIRMED");

    let outcome = flow
        .handle_action(request("track", "txn-ride", "taxi", json!({})))
        .await
        .unwrap();
    let response = outcome.into_response();
    assert_eq!(response.context.action.as_deref(), Some("on_track"));
    assert!(response.message.get("order").is_none());
}

#[tokio::test]
async fn test_hotel_track_falls_back() {
    let flow = orchestrator(json!({}));

    let outcome = flow
        .handle_action(request("track", "txn-hotel", "hotel", json!({})))
        .await
        .unwrap();

    assert!(outcome.is_fallback());
    assert_eq!(outcome.response().message, json!({ "order": {} }));
    assert!(flow.store().get("txn-hotel", "on_track").await.unwrap().is_none());
}
