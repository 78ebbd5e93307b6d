//! End-to-end scenarios from SPEC_FULL.md §8 (S1-S5), run against a live
//! loopback server the way `modules/api_ingress/tests/integration_router.rs`
//! in the teacher does.

use std::time::Duration;

use axum::body::Body;
use axum::response::{IntoResponse, Response};
use oas3_core::{Config, Document, Server};
use tokio::sync::oneshot;

const DOCUMENT: &str = r#"
openapi: "3.0.0"
info: { title: test, version: "1" }
paths:
  /items:
    get:
      operationId: list-items
      parameters:
        - name: limit
          in: query
          required: true
          schema: { type: integer }
      responses: { "200": { description: ok } }
  /oas3-model:
    get:
      operationId: oas3.model
      responses: { "200": { description: ok } }
  /assets/:
    get:
      operationId: serve-assets
      x-wildcard: true
      responses: { "200": { description: ok } }
"#;

async fn spawn(validate_request: bool) -> (String, tokio::task::JoinHandle<()>) {
    let mut config = Config::default();
    config.address = Some("127.0.0.1:0".to_string());
    config.validate.request = validate_request;
    config.model = Some(Document::from_yaml_str(DOCUMENT).unwrap());

    let server = Server::new(config).unwrap();
    server.bind_builtins();
    server
        .handle_func("list-items", |_req| async { "ok".into_response() })
        .unwrap();
    server
        .handle_func("serve-assets", |_req| async { "asset".into_response() })
        .unwrap();

    let (tx, rx) = oneshot::channel();
    let handle = tokio::spawn(async move {
        let _ = server.serve(Some(tx)).await;
    });
    let addr = rx.await.unwrap();
    tokio::time::sleep(Duration::from_millis(20)).await;
    (format!("http://{addr}"), handle)
}

#[tokio::test]
async fn s2_ephemeral_port_is_observable_and_reachable() {
    let (base, handle) = spawn(false).await;
    assert!(base.contains("127.0.0.1:"));
    let resp = reqwest::get(format!("{base}/items?limit=10")).await.unwrap();
    assert_eq!(resp.status(), 200);
    handle.abort();
}

#[tokio::test]
async fn s3_required_parameter_rejection() {
    let (base, handle) = spawn(true).await;

    let missing = reqwest::get(format!("{base}/items")).await.unwrap();
    assert_eq!(missing.status(), 400);

    let wrong_type = reqwest::get(format!("{base}/items?limit=not-a-number")).await.unwrap();
    assert_eq!(wrong_type.status(), 400);

    let ok = reqwest::get(format!("{base}/items?limit=10")).await.unwrap();
    assert_eq!(ok.status(), 200);

    handle.abort();
}

#[tokio::test]
async fn s1_model_negotiation() {
    let (base, handle) = spawn(false).await;

    let json = reqwest::Client::new()
        .get(format!("{base}/oas3-model"))
        .header("content-type", "application/json")
        .send()
        .await
        .unwrap();
    assert_eq!(json.status(), 200);
    assert!(json.headers()["content-type"].to_str().unwrap().contains("application/json"));

    let yaml = reqwest::Client::new()
        .get(format!("{base}/oas3-model"))
        .header("content-type", "application/yaml")
        .send()
        .await
        .unwrap();
    assert_eq!(yaml.status(), 200);

    let unsupported = reqwest::Client::new()
        .get(format!("{base}/oas3-model"))
        .header("content-type", "application/pdf")
        .send()
        .await
        .unwrap();
    assert_eq!(unsupported.status(), 415);

    handle.abort();
}

#[tokio::test]
async fn s4_wildcard_routing_matches_nested_paths() {
    let (base, handle) = spawn(false).await;
    let resp = reqwest::get(format!("{base}/assets/a/b/c")).await.unwrap();
    assert_eq!(resp.status(), 200);
    handle.abort();
}

#[tokio::test]
async fn s5_binding_unknown_operation_errors_binding_known_succeeds() {
    let mut config = Config::default();
    config.model = Some(Document::from_yaml_str(DOCUMENT).unwrap());
    let server = Server::new(config).unwrap();

    assert!(server.handle_func("does-not-exist", |_req: axum::extract::Request| async {
        Response::new(Body::empty())
    }).is_err());

    assert!(server
        .handle_func("list-items", |_req| async { "ok".into_response() })
        .is_ok());
}
