use std::sync::Arc;
use std::time::Duration;

use serde_json::{json, Value};
use wiremock::matchers::{body_json, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use sandbox_core::{
    AdapterForwarder, ContextStore, CoreError, DiscoveryClient, DomainRegistry, FlowOrchestrator, ResponseAction,
};
use sandbox_server::{HttpAdapterForwarder, HttpDiscoveryClient, InMemoryContextStore};

const TIMEOUT: Duration = Duration::from_secs(2);

fn discover_payload(transaction_id: &str) -> Value {
    json!({
        "context": {
            "action": "discover",
            "domain": "beckn.one:energy:ev-charging",
            "transaction_id": transaction_id
        },
        "message": { "intent": { "descriptor": { "name": "charger" } } }
    })
}

fn catalog() -> Value {
    json!({ "message": { "catalogs": [{ "beckn:id": "catalog-ev", "beckn:items": [] }] } })
}

/// Wait until `server` has seen a request for `expected_path`
async fn wait_for_request(server: &MockServer, expected_path: &str) -> Value {
    for _ in 0..50 {
        if let Some(requests) = server.received_requests().await {
            if let Some(request) = requests.iter().find(|r| r.url.path() == expected_path) {
                return serde_json::from_slice(&request.body).unwrap();
            }
        }
        tokio::time::sleep(Duration::from_millis(20)).await;
    }
    panic!("no request received on {}", expected_path);
}

#[tokio::test]
async fn test_discover_posts_payload_to_discovery_service() {
    let server = MockServer::start().await;
    let payload = discover_payload("txn-d1");
    Mock::given(method("POST"))
        .and(path("/beckn/discover"))
        .and(body_json(&payload))
        .respond_with(ResponseTemplate::new(200).set_body_json(catalog()))
        .expect(1)
        .mount(&server)
        .await;

    let client = HttpDiscoveryClient::new(Some(server.uri()), TIMEOUT).unwrap();
    let response = client.discover(&payload).await.unwrap();

    assert_eq!(response, catalog());
    assert!(client.health_check().await.unwrap());
}

#[tokio::test]
async fn test_discover_error_status_is_upstream_failure() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/beckn/discover"))
        .respond_with(ResponseTemplate::new(502).set_body_string("bad gateway"))
        .mount(&server)
        .await;

    let client = HttpDiscoveryClient::new(Some(server.uri()), TIMEOUT).unwrap();
    let err = client.discover(&discover_payload("txn-d2")).await.unwrap_err();

    assert!(matches!(err, CoreError::UpstreamDiscoveryFailure(ref msg) if msg.contains("502")));
}

#[tokio::test]
async fn test_discover_invalid_json_is_upstream_failure() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/beckn/discover"))
        .respond_with(ResponseTemplate::new(200).set_body_string("<html>"))
        .mount(&server)
        .await;

    let client = HttpDiscoveryClient::new(Some(server.uri()), TIMEOUT).unwrap();
    let err = client.discover(&discover_payload("txn-d3")).await.unwrap_err();

    assert!(matches!(err, CoreError::UpstreamDiscoveryFailure(_)));
}

#[tokio::test]
async fn test_discover_without_endpoint_fails() {
    let client = HttpDiscoveryClient::new(None, TIMEOUT).unwrap();

    let err = client.discover(&discover_payload("txn-d4")).await.unwrap_err();

    assert!(matches!(err, CoreError::UpstreamDiscoveryFailure(_)));
    assert!(!client.health_check().await.unwrap());
}

#[tokio::test]
async fn test_adapter_receives_action_response() {
    let server = MockServer::start().await;
    let body = json!({ "context": { "action": "on_confirm" }, "message": { "order": {} } });
    Mock::given(method("POST"))
        .and(path("/bpp/caller/on_confirm"))
        .and(body_json(&body))
        .respond_with(ResponseTemplate::new(200))
        .expect(1)
        .mount(&server)
        .await;

    let forwarder = HttpAdapterForwarder::new(server.uri(), TIMEOUT).unwrap();

    forwarder.forward_response(ResponseAction::OnConfirm, &body).await.unwrap();
}

#[tokio::test]
async fn test_adapter_error_status_is_adapter_failure() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/bap/receiver/on_discover"))
        .respond_with(ResponseTemplate::new(500))
        .mount(&server)
        .await;

    let forwarder = HttpAdapterForwarder::new(server.uri(), TIMEOUT).unwrap();
    let err = forwarder.forward_discovery(&catalog()).await.unwrap_err();

    assert!(matches!(err, CoreError::AdapterFailure(_)));
}

#[tokio::test]
async fn test_orchestrated_discover_stores_and_forwards_catalog() {
    let discovery_server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/beckn/discover"))
        .respond_with(ResponseTemplate::new(200).set_body_json(catalog()))
        .mount(&discovery_server)
        .await;
    let adapter_server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/bap/receiver/on_discover"))
        .respond_with(ResponseTemplate::new(200))
        .mount(&adapter_server)
        .await;

    let mut builder = DomainRegistry::builder();
    sandbox_domains::register_builtin_domains(&mut builder);
    let store: Arc<dyn ContextStore> = Arc::new(InMemoryContextStore::new("test_", Duration::from_secs(60)));
    let orchestrator = FlowOrchestrator::new(
        Arc::new(builder.build()),
        store.clone(),
        Arc::new(HttpDiscoveryClient::new(Some(discovery_server.uri()), TIMEOUT).unwrap()),
    )
    .with_forwarder(Arc::new(HttpAdapterForwarder::new(adapter_server.uri(), TIMEOUT).unwrap()));

    let response = orchestrator.discover(discover_payload("txn-d5")).await.unwrap();
    assert_eq!(response, catalog());

    let stored = store.get("txn-d5", "on_discover").await.unwrap().unwrap();
    assert_eq!(stored.previous_response, catalog());
    assert_eq!(stored.domain, "beckn.one:energy:ev-charging");

    let forwarded = wait_for_request(&adapter_server, "/bap/receiver/on_discover").await;
    assert_eq!(forwarded, catalog());
}
