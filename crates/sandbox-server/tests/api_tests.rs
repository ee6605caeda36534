use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use axum::{
    body::{self, Body},
    http::{self, Request, StatusCode},
    Router,
};
use mockall::mock;
use serde_json::{json, Value};
use tower::ServiceExt;

use sandbox_core::{
    ContextRecord, ContextStore, CoreError, DiscoveryClient, DomainRegistry, FlowOrchestrator,
};
use sandbox_domains::{aviation, register_builtin_domains};
use sandbox_server::api::{build_router, MAX_BODY_BYTES};
use sandbox_server::{InMemoryContextStore, SandboxServer, ServerConfig};

// Mock the discovery service
mock! {
    pub Discovery {}

    #[async_trait]
    impl DiscoveryClient for Discovery {
        async fn discover(&self, payload: &Value) -> Result<Value, CoreError>;
        async fn health_check(&self) -> Result<bool, CoreError>;
    }
}

// Mock the context store
mock! {
    pub Store {}

    #[async_trait]
    impl ContextStore for Store {
        async fn put(&self, transaction_id: &str, action: &str, record: &ContextRecord) -> Result<(), CoreError>;
        async fn get(&self, transaction_id: &str, action: &str) -> Result<Option<ContextRecord>, CoreError>;
        async fn delete_all(&self, transaction_id: &str) -> Result<usize, CoreError>;
        async fn health_check(&self) -> Result<bool, CoreError>;
        async fn close(&self) -> Result<(), CoreError>;
    }
}

struct TestContext {
    app: Router,
    store: Arc<dyn ContextStore>,
}

fn setup_with(store: Arc<dyn ContextStore>, discovery: MockDiscovery) -> TestContext {
    let mut builder = DomainRegistry::builder();
    register_builtin_domains(&mut builder);
    let orchestrator = FlowOrchestrator::new(Arc::new(builder.build()), store.clone(), Arc::new(discovery));

    let server = SandboxServer::new(ServerConfig::default(), Arc::new(orchestrator), store.clone());
    TestContext {
        app: build_router(Arc::new(server)),
        store,
    }
}

fn setup(discovery: MockDiscovery) -> TestContext {
    let store: Arc<dyn ContextStore> = Arc::new(InMemoryContextStore::new("test_", Duration::from_secs(60)));
    setup_with(store, discovery)
}

fn unavailable_store() -> MockStore {
    let mut store = MockStore::new();
    store
        .expect_put()
        .returning(|_, _, _| Err(CoreError::StoreUnavailable("connection refused".to_string())));
    store
        .expect_get()
        .returning(|_, _| Err(CoreError::StoreUnavailable("connection refused".to_string())));
    store
        .expect_delete_all()
        .returning(|_| Err(CoreError::StoreUnavailable("connection refused".to_string())));
    store
        .expect_health_check()
        .returning(|| Err(CoreError::StoreUnavailable("connection refused".to_string())));
    store.expect_close().returning(|| Ok(()));
    store
}

async fn send(app: &Router, method: http::Method, uri: &str, body: Option<Value>) -> (StatusCode, Value) {
    let builder = Request::builder().method(method).uri(uri);
    let request = match body {
        Some(body) => builder
            .header(http::header::CONTENT_TYPE, "application/json")
            .body(Body::from(body.to_string()))
            .unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    };

    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
    let value = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap()
    };
    (status, value)
}

fn envelope(action: Option<&str>, transaction_id: &str, domain: &str, message: Value) -> Value {
    let mut context = json!({
        "domain": domain,
        "transaction_id": transaction_id,
        "message_id": "msg-1",
        "bap_id": "bap.example.com",
        "bap_uri": "https://bap.example.com",
        "bpp_id": "bpp.example.com",
        "bpp_uri": "https://bpp.example.com"
    });
    if let Some(action) = action {
        context["action"] = json!(action);
    }
    json!({ "context": context, "message": message })
}

#[tokio::test]
async fn test_health_check_reports_store_up() {
    let ctx = setup(MockDiscovery::new());

    let (status, body) = send(&ctx.app, http::Method::GET, "/api/health", None).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["message"], "OK!");
    assert_eq!(body["status"], "UP");
    assert_eq!(body["dependencies"]["contextStore"]["status"], "UP");
}

#[tokio::test]
async fn test_health_check_degraded_when_store_down() {
    let ctx = setup_with(Arc::new(unavailable_store()), MockDiscovery::new());

    let (status, body) = send(&ctx.app, http::Method::GET, "/api/health", None).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "DEGRADED");
    assert_eq!(body["dependencies"]["contextStore"]["status"], "DOWN");
}

#[tokio::test]
async fn test_select_defaults_action_from_path() {
    let ctx = setup(MockDiscovery::new());
    let payload = envelope(None, "txn-api-1", aviation::DOMAIN, json!({ "order": {} }));

    let (status, body) = send(&ctx.app, http::Method::POST, "/api/webhook/select", Some(payload)).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["context"]["action"], "on_select");
    assert_eq!(body["context"]["transaction_id"], "txn-api-1");
    assert_eq!(body["context"]["bpp_uri"], "https://bpp.example.com");
    assert_eq!(body["message"]["order"]["beckn:orderValue"]["schema:price"], 307.6);

    let stored = ctx.store.get("txn-api-1", "on_select").await.unwrap().unwrap();
    assert_eq!(stored.action, "on_select");
    assert_eq!(stored.domain, aviation::DOMAIN);
}

#[tokio::test]
async fn test_missing_context_is_bad_request() {
    let ctx = setup(MockDiscovery::new());

    let (status, body) = send(
        &ctx.app,
        http::Method::POST,
        "/api/webhook/init",
        Some(json!({ "message": { "order": {} } })),
    )
    .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "Missing context");
    assert_eq!(body["errorDetails"]["errorCode"], "ERR_MALFORMED_REQUEST");
}

#[tokio::test]
async fn test_missing_transaction_id_is_bad_request() {
    let ctx = setup(MockDiscovery::new());

    let (status, body) = send(
        &ctx.app,
        http::Method::POST,
        "/api/webhook/confirm",
        Some(json!({ "context": { "action": "confirm" }, "message": {} })),
    )
    .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "Missing transaction_id");
}

#[tokio::test]
async fn test_unknown_action_is_not_found() {
    let ctx = setup(MockDiscovery::new());
    let payload = envelope(None, "txn-api-2", aviation::DOMAIN, json!({}));

    let (status, _) = send(&ctx.app, http::Method::POST, "/api/webhook/refund", Some(payload)).await;

    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_unregistered_domain_falls_back() {
    let ctx = setup(MockDiscovery::new());
    let payload = envelope(Some("status"), "txn-api-3", "retail:groceries", json!({}));

    let (status, body) = send(&ctx.app, http::Method::POST, "/api/webhook/status", Some(payload)).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["context"]["action"], "on_status");
    assert_eq!(body["context"]["domain"], "retail:groceries");
    assert_eq!(body["message"], json!({ "order": {} }));
    assert!(ctx.store.get("txn-api-3", "on_status").await.unwrap().is_none());
}

#[tokio::test]
async fn test_store_outage_does_not_fail_actions() {
    let ctx = setup_with(Arc::new(unavailable_store()), MockDiscovery::new());
    let payload = envelope(Some("confirm"), "txn-api-4", aviation::DOMAIN, json!({ "order": {} }));

    let (status, body) = send(&ctx.app, http::Method::POST, "/api/webhook/confirm", Some(payload)).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["context"]["action"], "on_confirm");
    assert_eq!(body["message"]["order"]["beckn:orderStatus"], "CONFIRMED");
}

#[tokio::test]
async fn test_discover_returns_and_stores_catalog() {
    let mut discovery = MockDiscovery::new();
    discovery
        .expect_discover()
        .times(1)
        .returning(|_| Ok(json!({ "message": { "catalogs": [{ "beckn:id": "catalog-1" }] } })));
    let ctx = setup(discovery);
    let payload = envelope(Some("discover"), "txn-api-5", aviation::DOMAIN, json!({ "intent": {} }));

    let (status, body) = send(&ctx.app, http::Method::POST, "/api/webhook/discover", Some(payload)).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["message"]["catalogs"][0]["beckn:id"], "catalog-1");

    let stored = ctx.store.get("txn-api-5", "on_discover").await.unwrap().unwrap();
    assert_eq!(stored.previous_response, body);
}

#[tokio::test]
async fn test_discover_failure_returns_nack() {
    let mut discovery = MockDiscovery::new();
    discovery
        .expect_discover()
        .returning(|_| Err(CoreError::UpstreamDiscoveryFailure("connection refused".to_string())));
    let ctx = setup(discovery);
    let payload = envelope(Some("discover"), "txn-api-6", aviation::DOMAIN, json!({}));

    let (status, body) = send(&ctx.app, http::Method::POST, "/api/webhook/discover", Some(payload.clone())).await;

    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(body["message"]["ack"]["status"], "NACK");
    assert_eq!(body["context"], payload["context"]);
    assert!(ctx.store.get("txn-api-6", "on_discover").await.unwrap().is_none());
}

#[tokio::test]
async fn test_bap_callback_is_acknowledged() {
    let ctx = setup(MockDiscovery::new());
    let payload = envelope(Some("on_select"), "txn-api-7", aviation::DOMAIN, json!({ "order": {} }));

    let (status, body) = send(&ctx.app, http::Method::POST, "/api/bap-webhook/on_select", Some(payload.clone())).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!({ "message": { "ack": { "status": "ACK" } } }));

    let (status, _) = send(&ctx.app, http::Method::POST, "/api/bap-webhook/on_refund", Some(payload)).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_delete_context_removes_transaction() {
    let ctx = setup(MockDiscovery::new());
    for action in ["select", "init"] {
        let payload = envelope(Some(action), "txn-api-8", aviation::DOMAIN, json!({ "order": {} }));
        let uri = format!("/api/webhook/{}", action);
        let (status, _) = send(&ctx.app, http::Method::POST, &uri, Some(payload)).await;
        assert_eq!(status, StatusCode::OK);
    }

    let (status, body) = send(&ctx.app, http::Method::DELETE, "/api/context/txn-api-8", None).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["deleted"], 2);
    assert!(ctx.store.get("txn-api-8", "on_select").await.unwrap().is_none());
}

#[tokio::test]
async fn test_delete_context_store_outage_is_unavailable() {
    let ctx = setup_with(Arc::new(unavailable_store()), MockDiscovery::new());

    let (status, body) = send(&ctx.app, http::Method::DELETE, "/api/context/txn-api-9", None).await;

    assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
    assert_eq!(body["errorDetails"]["errorCode"], "ERR_CONTEXT_STORE_UNAVAILABLE");
}

#[tokio::test]
async fn test_delete_context_is_scoped_to_exact_transaction() {
    let ctx = setup(MockDiscovery::new());
    for transaction_id in ["txn-api-10", "txn-api-10_retry"] {
        let payload = envelope(Some("select"), transaction_id, aviation::DOMAIN, json!({ "order": {} }));
        let (status, _) = send(&ctx.app, http::Method::POST, "/api/webhook/select", Some(payload)).await;
        assert_eq!(status, StatusCode::OK);
    }

    let (status, body) = send(&ctx.app, http::Method::DELETE, "/api/context/%2A", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["deleted"], 0);

    let (_, body) = send(&ctx.app, http::Method::DELETE, "/api/context/txn-api-10", None).await;
    assert_eq!(body["deleted"], 1);
    assert!(ctx.store.get("txn-api-10_retry", "on_select").await.unwrap().is_some());
}

#[tokio::test]
async fn test_body_limit_is_five_mebibytes() {
    let ctx = setup(MockDiscovery::new());

    let padding = "x".repeat(3 * 1024 * 1024);
    let payload = envelope(Some("select"), "txn-api-11", aviation::DOMAIN, json!({ "order": {}, "padding": padding }));
    let (status, _) = send(&ctx.app, http::Method::POST, "/api/webhook/select", Some(payload)).await;
    assert_eq!(status, StatusCode::OK);

    let padding = "x".repeat(MAX_BODY_BYTES);
    let payload = envelope(Some("select"), "txn-api-12", aviation::DOMAIN, json!({ "order": {}, "padding": padding }));
    let (status, _) = send(&ctx.app, http::Method::POST, "/api/webhook/select", Some(payload)).await;
    assert_eq!(status, StatusCode::PAYLOAD_TOO_LARGE);
}
