//! HTTP command surface driven against the in-memory engine.

mod common;

use axum::Router;
use axum::body::{Body, to_bytes};
use axum::http::{Request, StatusCode};
use common::*;
use mclaunchd::engine::EngineError;
use mclaunchd::router;
use mclaunchd::websocket::WebSocketState;
use serde_json::{Value, json};
use tower::ServiceExt;

fn app(h: &Harness) -> Router {
    router::app(
        h.lifecycle.clone(),
        WebSocketState {
            event_hub: h.hub.clone(),
        },
    )
}

async fn send(app: Router, method: &str, uri: &str, body: Option<Value>) -> (StatusCode, Value) {
    let request = Request::builder().method(method).uri(uri);
    let request = match body {
        Some(body) => request
            .header("content-type", "application/json")
            .body(Body::from(body.to_string()))
            .unwrap(),
        None => request.body(Body::empty()).unwrap(),
    };

    let response = app.oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    let json = serde_json::from_slice(&bytes).unwrap_or(Value::Null);
    (status, json)
}

fn start_body() -> Value {
    json!({
        "name": "S",
        "version": "1.20.1",
        "maxPlayers": 20,
        "difficulty": "easy",
        "motd": "hi"
    })
}

#[tokio::test]
async fn test_ping() {
    let h = harness(FakeEngine::new());
    let (status, body) = send(app(&h), "GET", "/api/v1/public/ping", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "ok");
    assert_eq!(body["version"], env!("CARGO_PKG_VERSION"));
    assert_eq!(body["console_subscribers"], 0);

    let _console = h.hub.subscribe();
    let (_, body) = send(app(&h), "GET", "/api/v1/public/ping", None).await;
    assert_eq!(body["console_subscribers"], 1);
}

#[tokio::test]
async fn test_status_not_created() {
    let h = harness(FakeEngine::new());
    let (status, body) = send(app(&h), "GET", "/api/v1/server/status", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!({"running": false, "status": "not-created"}));
}

#[tokio::test]
async fn test_start_then_status_then_stop() {
    let h = harness(FakeEngine::new().with_image());

    let (status, body) = send(app(&h), "POST", "/api/v1/server/start", Some(start_body())).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!({"started": true, "outcome": "created"}));

    let (status, body) = send(app(&h), "POST", "/api/v1/server/start", Some(start_body())).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["outcome"], "already-running");

    let (status, body) = send(app(&h), "GET", "/api/v1/server/status", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!({"running": true, "status": "running"}));

    let (status, body) = send(app(&h), "POST", "/api/v1/server/stop", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!({"outcome": {"kind": "removed"}, "confirmed_absent": true}));
}

#[tokio::test]
async fn test_start_with_partial_payload_uses_fallbacks() {
    let h = harness(FakeEngine::new().with_image());
    let payload = json!({"name": "S", "maxPlayers": 20, "motd": "hi"});

    let (status, body) = send(app(&h), "POST", "/api/v1/server/start", Some(payload)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["started"], true);

    let env = h.engine.container().unwrap().env;
    assert!(env.contains(&"VERSION=1.20.1".to_string()));
    assert!(env.contains(&"DIFFICULTY=normal".to_string()));
}

#[tokio::test]
async fn test_stop_reports_attempted_removal() {
    let engine = FakeEngine::new();
    engine.set_container(vec![], true);
    engine.state.lock().unwrap().remove_error = Some(EngineError::Api {
        status: 500,
        message: "driver failed".to_string(),
    });
    let h = harness(engine);

    let (status, body) = send(app(&h), "POST", "/api/v1/server/stop", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["confirmed_absent"], false);
    assert_eq!(body["outcome"]["kind"], "attempted");
    assert!(
        body["outcome"]["error"]
            .as_str()
            .unwrap()
            .contains("driver failed")
    );
}

#[tokio::test]
async fn test_pull_failure_is_bad_gateway() {
    let engine = FakeEngine::new();
    engine.state.lock().unwrap().pull_error = Some("manifest unknown".to_string());
    let h = harness(engine);

    let (status, body) = send(app(&h), "POST", "/api/v1/server/start", Some(start_body())).await;
    assert_eq!(status, StatusCode::BAD_GATEWAY);
    assert!(body["error"].as_str().unwrap().contains("manifest unknown"));
}

#[tokio::test]
async fn test_engine_rejection_is_bad_gateway() {
    let engine = FakeEngine::new();
    engine.state.lock().unwrap().inspect_error = Some(EngineError::Api {
        status: 500,
        message: "driver failed".to_string(),
    });
    let h = harness(engine);

    let (status, body) = send(app(&h), "GET", "/api/v1/server/status", None).await;
    assert_eq!(status, StatusCode::BAD_GATEWAY);
    assert!(!body["error"].as_str().unwrap().contains("Cannot reach"));
}

#[tokio::test]
async fn test_unreachable_engine_is_unavailable() {
    let engine = FakeEngine::new();
    engine.state.lock().unwrap().inspect_error =
        Some(EngineError::Connectivity("socket missing".to_string()));
    let h = harness(engine);

    let (status, _) = send(app(&h), "POST", "/api/v1/server/start", Some(start_body())).await;
    assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
}

#[tokio::test]
async fn test_commands_after_shutdown_are_unavailable() {
    let h = harness(FakeEngine::new());
    h.lifecycle.shutdown().await;

    let (status, body) = send(app(&h), "GET", "/api/v1/server/status", None).await;
    assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
    assert_eq!(body["error"], "Lifecycle manager is shut down");
}
