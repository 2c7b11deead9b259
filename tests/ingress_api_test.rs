mod common;

use std::sync::Arc;

use axum::Router;
use axum::body::Body;
use axum::http::{Request, StatusCode, header};
use http_body_util::BodyExt;
use serde_json::{Value, json};
use tower::ServiceExt;

use common::{RecordingActuator, at};
use selfheal_monitor::config::Config;
use selfheal_monitor::server::build_state;
use selfheal_monitor::services::ingress::{MonitorState, create_router};
use selfheal_monitor::services::registry::ServiceStatus;

fn test_state(config: Config) -> (MonitorState, Arc<RecordingActuator>) {
    let actuator = Arc::new(RecordingActuator::succeeding());
    let state = build_state(Arc::new(config), actuator.clone());
    (state, actuator)
}

fn post_json(uri: &str, body: Value) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri(uri)
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

fn get(uri: &str) -> Request<Body> {
    Request::builder().uri(uri).body(Body::empty()).unwrap()
}

async fn send(app: &Router, request: Request<Body>) -> (StatusCode, Value) {
    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    let body = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap()
    };
    (status, body)
}

#[tokio::test]
async fn test_register_and_list() {
    let (state, _) = test_state(Config::default());
    let app = create_router(state);

    let (status, body) = send(
        &app,
        post_json(
            "/monitor/register",
            json!({"serviceName": "svc-a", "host": "localhost", "port": 8081}),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "HEALTHY");
    assert_eq!(body["serviceName"], "svc-a");

    let (status, body) = send(&app, get("/monitor/services")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["totalServices"], 1);
    assert_eq!(body["services"][0]["serviceName"], "svc-a");
    assert_eq!(body["services"][0]["port"], 8081);
    assert_eq!(body["services"][0]["status"], "HEALTHY");
    assert!(body["timestamp"].is_u64());
}

#[tokio::test]
async fn test_heartbeat_auto_registers() {
    let (state, _) = test_state(Config::default());
    let registry = state.registry.clone();
    let app = create_router(state);

    let (status, body) = send(
        &app,
        post_json("/monitor/heartbeat", json!({"serviceName": "svc-b", "port": 8082})),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["message"], "Heartbeat received");
    assert_eq!(body["status"], "HEALTHY");
    assert!(body["timestamp"].is_u64());

    let record = registry.get("svc-b").unwrap();
    assert_eq!(record.host, "localhost");
    assert_eq!(record.port, 8082);
}

#[tokio::test]
async fn test_heartbeat_recovers_dead_service() {
    let (state, _) = test_state(Config::default());
    let registry = state.registry.clone();
    let app = create_router(state);

    registry.upsert_heartbeat("svc-a", "localhost", 8081, at(0));
    assert!(registry.mark_dead("svc-a", at(16)));

    let (_, body) = send(
        &app,
        post_json("/monitor/heartbeat", json!({"serviceName": "svc-a", "port": 8081})),
    )
    .await;
    assert_eq!(body["status"], "HEALTHY");
    assert_eq!(registry.get("svc-a").unwrap().status, ServiceStatus::Healthy);
}

#[tokio::test]
async fn test_empty_service_name_is_rejected() {
    let (state, _) = test_state(Config::default());
    let registry = state.registry.clone();
    let app = create_router(state);

    let (status, body) = send(&app, post_json("/monitor/heartbeat", json!({"serviceName": "  "}))).await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["error"].as_str().unwrap().contains("serviceName"));
    assert!(registry.is_empty());
}

#[tokio::test]
async fn test_service_name_is_not_normalized() {
    let (state, _) = test_state(Config::default());
    let registry = state.registry.clone();
    let app = create_router(state);

    for name in [" svc-a", "svc-a ", "\tsvc-a"] {
        let (status, body) = send(
            &app,
            post_json("/monitor/heartbeat", json!({"serviceName": name, "port": 8081})),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST, "name {name:?} should be rejected");
        assert!(body["error"].as_str().unwrap().contains("whitespace"));
    }
    assert!(registry.is_empty());

    // 大小写不同视为不同服务
    send(&app, post_json("/monitor/register", json!({"serviceName": "svc-a", "port": 8081}))).await;
    send(&app, post_json("/monitor/register", json!({"serviceName": "SVC-A", "port": 8082}))).await;
    assert_eq!(registry.len(), 2);

    let (status, _) = send(&app, get("/monitor/services/%20svc-a")).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    let (status, body) = send(&app, get("/monitor/services/SVC-A")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["port"], 8082);
}

#[tokio::test]
async fn test_get_single_service() {
    let (state, _) = test_state(Config::default());
    state.registry.upsert_heartbeat("svc-a", "localhost", 8081, at(100));
    let app = create_router(state);

    let (status, body) = send(&app, get("/monitor/services/svc-a")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["lastHeartbeat"], 100);
    assert_eq!(body["lastStatusChange"], 100);

    let (status, _) = send(&app, get("/monitor/services/unknown")).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_health_summary_counts() {
    let (state, _) = test_state(Config::default());
    for name in ["svc-a", "svc-b", "svc-c"] {
        state.registry.upsert_heartbeat(name, "localhost", 8080, at(0));
    }
    state.registry.mark_dead("svc-c", at(20));
    let app = create_router(state);

    let (status, body) = send(&app, get("/monitor/health")).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["totalServices"], 3);
    assert_eq!(body["healthyCount"], 2);
    assert_eq!(body["deadCount"], 1);
    assert_eq!(
        body["healthyCount"].as_u64().unwrap() + body["deadCount"].as_u64().unwrap(),
        body["totalServices"].as_u64().unwrap()
    );
    assert_eq!(body["detector"]["backend"], "recording");
    assert_eq!(body["detector"]["failureThresholdSecs"], 15);
    assert_eq!(body["detector"]["sweepIntervalSecs"], 10);
}

#[tokio::test]
async fn test_manual_restart_does_not_change_status() {
    let (state, actuator) = test_state(Config::default());
    let registry = state.registry.clone();
    registry.upsert_heartbeat("svc-a", "localhost", 8081, at(0));
    registry.mark_dead("svc-a", at(16));
    let app = create_router(state);

    let (status, body) = send(&app, post_json("/monitor/services/svc-a/restart", json!({}))).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["serviceName"], "svc-a");
    assert_eq!(body["started"], true);
    assert_eq!(body["verifiedRunning"], true);
    assert_eq!(actuator.restarts(), vec!["svc-a".to_string()]);
    assert_eq!(registry.get("svc-a").unwrap().status, ServiceStatus::Dead);
}

#[tokio::test]
async fn test_start_stop_and_runtime_status() {
    let (state, actuator) = test_state(Config::default());
    let app = create_router(state);

    let (_, body) = send(&app, post_json("/monitor/services/svc-a/start", json!({}))).await;
    assert_eq!(body["action"], "start");
    assert_eq!(body["success"], true);

    let (_, body) = send(&app, post_json("/monitor/services/svc-a/stop", json!({}))).await;
    assert_eq!(body["action"], "stop");

    let (_, body) = send(&app, get("/monitor/services/svc-a/runtime")).await;
    assert_eq!(body["runtimeStatus"], "running");

    let actions: Vec<String> = actuator.actions().into_iter().map(|(action, _)| action).collect();
    assert_eq!(actions, vec!["start", "stop", "status"]);
}

#[tokio::test]
async fn test_manual_sweep() {
    let (state, actuator) = test_state(Config::default());
    state.registry.upsert_heartbeat("svc-a", "localhost", 8081, at(0));
    let app = create_router(state);

    let (status, body) = send(&app, post_json("/monitor/sweep", json!({}))).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["checked"], 1);
    assert_eq!(body["newlyDead"], json!(["svc-a"]));
    assert_eq!(body["remediations"][0]["serviceName"], "svc-a");
    assert_eq!(actuator.restarts(), vec!["svc-a".to_string()]);

    // 边沿已经消费
    let (_, body) = send(&app, post_json("/monitor/sweep", json!({}))).await;
    assert_eq!(body["newlyDead"], json!([]));
    assert_eq!(actuator.restarts().len(), 1);
}

#[tokio::test]
async fn test_api_key_required_when_configured() {
    let mut config = Config::default();
    config.security.tokens = vec!["secret-token".to_string()];
    let (state, _) = test_state(config);
    let app = create_router(state);

    let (status, body) = send(&app, get("/monitor/services")).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert!(body["error"].is_string());

    let request = Request::builder()
        .uri("/monitor/services")
        .header("x-api-key", "wrong")
        .body(Body::empty())
        .unwrap();
    let (status, _) = send(&app, request).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let request = Request::builder()
        .uri("/monitor/services")
        .header("x-api-key", "secret-token")
        .body(Body::empty())
        .unwrap();
    let (status, _) = send(&app, request).await;
    assert_eq!(status, StatusCode::OK);
}
