//! Shared utilities for integration tests: an in-process mock callback service.

#![allow(dead_code)]

use std::collections::{HashMap, HashSet, VecDeque};
use std::net::SocketAddr;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use axum::extract::{Path, State};
use axum::http::{HeaderMap, StatusCode};
use axum::routing::{get, post};
use axum::{Json, Router};
use serde_json::{json, Value};
use tokio::net::TcpListener;
use uuid::Uuid;

use callback_client::flow::AppState;
use callback_client::{CallbackOrchestrator, ClientConfig};

pub const VALID_CODE: &str = "123456";

/// Scripted behaviour and recorded traffic of a mock service.
#[derive(Default)]
pub struct MockState {
    pub unhealthy: bool,
    pub health_delay: Option<Duration>,
    /// Body returned with 400 for every submission, when set.
    pub submit_rejection: Option<Value>,
    /// Statuses served in order; `completed` once drained.
    pub statuses: Mutex<VecDeque<&'static str>>,
    pub requests: Mutex<HashSet<String>>,
    pub verified: Mutex<HashSet<String>>,
    pub hits: Mutex<HashMap<&'static str, usize>>,
    pub request_ids: Mutex<Vec<String>>,
}

impl MockState {
    pub fn hits(&self, route: &str) -> usize {
        self.hits.lock().unwrap().get(route).copied().unwrap_or(0)
    }

    /// `x-request-id` header values seen so far.
    pub fn request_ids(&self) -> Vec<String> {
        self.request_ids.lock().unwrap().clone()
    }

    fn record(&self, route: &'static str, headers: &HeaderMap) {
        *self.hits.lock().unwrap().entry(route).or_insert(0) += 1;
        if let Some(id) = headers.get("x-request-id").and_then(|v| v.to_str().ok()) {
            self.request_ids.lock().unwrap().push(id.to_string());
        }
    }

    fn known(&self, request_id: &str) -> bool {
        self.requests.lock().unwrap().contains(request_id)
    }
}

pub struct MockService {
    pub addr: SocketAddr,
    pub state: Arc<MockState>,
}

impl MockService {
    pub fn location(&self) -> String {
        format!("http://{}", self.addr)
    }
}

type Reply = (StatusCode, Json<Value>);

fn reply(status: StatusCode, body: Value) -> Reply {
    (status, Json(body))
}

fn request_id(body: &Value) -> String {
    body["request_id"].as_str().unwrap_or_default().to_string()
}

async fn health(State(state): State<Arc<MockState>>, headers: HeaderMap) -> Reply {
    state.record("health", &headers);
    if let Some(delay) = state.health_delay {
        tokio::time::sleep(delay).await;
    }
    let status = if state.unhealthy { "unhealthy" } else { "healthy" };
    reply(
        StatusCode::OK,
        json!({ "status": status, "timestamp": "2026-10-19T09:00:00Z", "twilio_configured": true }),
    )
}

async fn request_callback(State(state): State<Arc<MockState>>, headers: HeaderMap, Json(body): Json<Value>) -> Reply {
    state.record("request_callback", &headers);
    if let Some(rejection) = &state.submit_rejection {
        return reply(StatusCode::BAD_REQUEST, rejection.clone());
    }
    if body["visitor_number"].as_str().unwrap_or_default().is_empty() {
        return reply(
            StatusCode::BAD_REQUEST,
            json!({ "success": false, "error": "Phone number is required" }),
        );
    }
    let id = Uuid::new_v4().to_string();
    state.requests.lock().unwrap().insert(id.clone());
    reply(
        StatusCode::OK,
        json!({ "success": true, "request_id": id, "message": "Callback request created" }),
    )
}

async fn send_verification(State(state): State<Arc<MockState>>, headers: HeaderMap, Json(body): Json<Value>) -> Reply {
    state.record("send_verification", &headers);
    if !state.known(&request_id(&body)) {
        return reply(
            StatusCode::NOT_FOUND,
            json!({ "success": false, "error": "Request not found" }),
        );
    }
    reply(
        StatusCode::OK,
        json!({ "success": true, "message": "Verification code sent" }),
    )
}

async fn verify_code(State(state): State<Arc<MockState>>, headers: HeaderMap, Json(body): Json<Value>) -> Reply {
    state.record("verify_code", &headers);
    let id = request_id(&body);
    if !state.known(&id) {
        return reply(
            StatusCode::NOT_FOUND,
            json!({ "success": false, "error": "Request not found" }),
        );
    }
    if body["code"] != VALID_CODE {
        return reply(
            StatusCode::BAD_REQUEST,
            json!({
                "success": false,
                "error": "Invalid verification code",
                "next_step": "Check the text message and try again"
            }),
        );
    }
    state.verified.lock().unwrap().insert(id);
    reply(StatusCode::OK, json!({ "success": true }))
}

async fn initiate_callback(State(state): State<Arc<MockState>>, headers: HeaderMap, Json(body): Json<Value>) -> Reply {
    state.record("initiate_callback", &headers);
    if !state.verified.lock().unwrap().contains(&request_id(&body)) {
        return reply(
            StatusCode::BAD_REQUEST,
            json!({ "success": false, "error": "Phone number not verified" }),
        );
    }
    reply(
        StatusCode::OK,
        json!({ "success": true, "message": "Calling you now" }),
    )
}

async fn status(State(state): State<Arc<MockState>>, headers: HeaderMap, Path(id): Path<String>) -> Reply {
    state.record("status", &headers);
    if !state.known(&id) {
        return reply(StatusCode::NOT_FOUND, json!({ "status": "failed", "message": "Unknown request" }));
    }
    let next = state.statuses.lock().unwrap().pop_front().unwrap_or("completed");
    let message = match next {
        "completed" => Some("Call completed successfully."),
        "sms_sent" => Some("SMS sent to business"),
        _ => None,
    };
    reply(
        StatusCode::OK,
        json!({ "status": next, "message": message, "updated_at": "2026-10-19T09:00:05Z" }),
    )
}

/// Start a mock callback service on an ephemeral port.
pub async fn start_mock_service(state: MockState) -> MockService {
    let state = Arc::new(state);
    let app = Router::new()
        .route("/health", get(health))
        .route("/request_callback", post(request_callback))
        .route("/send_verification", post(send_verification))
        .route("/verify_code", post(verify_code))
        .route("/initiate_callback", post(initiate_callback))
        .route("/status/{request_id}", get(status))
        .with_state(state.clone());
    MockService {
        addr: serve(app).await,
        state,
    }
}

/// Start a service that answers everything with a plain-text 503.
pub async fn start_broken_service() -> SocketAddr {
    let app = Router::new().fallback(|| async { (StatusCode::SERVICE_UNAVAILABLE, "Service Unavailable") });
    serve(app).await
}

async fn serve(app: Router) -> SocketAddr {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    addr
}

/// A loopback location with nothing listening on it.
pub fn closed_location() -> String {
    let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);
    format!("http://{}", addr)
}

/// Client configuration with timings scaled down for tests.
pub fn client_config(preferred: &str, fallback: &str) -> ClientConfig {
    let mut config = ClientConfig::default();
    config.discovery.preferred.location = preferred.to_string();
    config.discovery.preferred.timeout_ms = 300;
    config.discovery.fallback.location = fallback.to_string();
    config.discovery.fallback.timeout_ms = 500;
    config.workflow.request_timeout_ms = 2_000;
    config.polling.interval_ms = 50;
    config.polling.max_attempts = 20;
    config
}

/// Wait until the orchestrator reaches `target`, failing after five seconds.
pub async fn wait_for_state(orchestrator: &CallbackOrchestrator, target: AppState) {
    let reached = tokio::time::timeout(Duration::from_secs(5), async {
        while orchestrator.state() != target {
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
    })
    .await;
    assert!(
        reached.is_ok(),
        "expected {target}, still {} ({})",
        orchestrator.state(),
        orchestrator.last_message()
    );
}

/// Wait until `route` has been hit at least `count` times.
pub async fn wait_for_hits(state: &MockState, route: &str, count: usize) {
    let reached = tokio::time::timeout(Duration::from_secs(5), async {
        while state.hits(route) < count {
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
    })
    .await;
    assert!(reached.is_ok(), "{route} hit {} times, expected {count}", state.hits(route));
}
