//! Shared test helpers for API integration tests.
#![allow(dead_code)]

use std::sync::Arc;

use axum::Router;
use axum::body::Body;
use axum::http::{Request, StatusCode};
use chrono::{DateTime, TimeZone, Utc};
use http_body_util::BodyExt;
use tidewell_api::notifier::BroadcastNotifier;
use tidewell_api::state::AppState;
use tidewell_content::application::loader::default_catalog;
use tidewell_engine::application::command_handlers::ModeratorConsole;
use tidewell_engine::application::fresh_state::fresh_state;
use tidewell_engine::application::store::GameStore;
use tidewell_test_support::{FixedClock, InMemorySnapshotRepository};
use tokio::sync::broadcast;
use tower::ServiceExt;

/// Bearer token accepted by the test app.
pub const ADMIN_TOKEN: &str = "test-admin-token";

/// Number of players in the test game.
pub const PLAYER_COUNT: usize = 3;

/// Fixed timestamp used across all integration tests.
pub fn fixed_now() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2026, 3, 1, 18, 0, 0).unwrap()
}

/// A test app plus handles on its internals.
pub struct TestApp {
    pub router: Router,
    pub store: Arc<GameStore>,
    pub snapshots: Arc<InMemorySnapshotRepository>,
}

/// Build the full app router over a fresh game with a fixed clock and an
/// in-memory snapshot repository. Uses the same route structure as `main.rs`.
pub fn build_test_app() -> TestApp {
    let catalog = Arc::new(default_catalog().unwrap());
    let (notifications, _) = broadcast::channel(64);
    let store = Arc::new(GameStore::new(
        fresh_state(&catalog, PLAYER_COUNT, fixed_now()).unwrap(),
        catalog,
        Arc::new(FixedClock(fixed_now())),
        Arc::new(BroadcastNotifier::new(notifications.clone())),
    ));
    let snapshots = Arc::new(InMemorySnapshotRepository::new());
    let console = Arc::new(ModeratorConsole::new(
        Arc::clone(&store),
        snapshots.clone(),
        PLAYER_COUNT,
    ));
    let app_state = AppState::new(Arc::clone(&store), console, notifications, ADMIN_TOKEN);

    TestApp {
        router: tidewell_api::build_router(app_state),
        store,
        snapshots,
    }
}

async fn send(
    app: Router,
    method: &str,
    uri: &str,
    token: Option<&str>,
    body: Option<&serde_json::Value>,
) -> (StatusCode, serde_json::Value) {
    let mut builder = Request::builder().method(method).uri(uri);
    if let Some(token) = token {
        builder = builder.header("authorization", format!("Bearer {token}"));
    }
    let request = match body {
        Some(body) => builder
            .header("content-type", "application/json")
            .body(Body::from(serde_json::to_vec(body).unwrap()))
            .unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    };

    let response = app.oneshot(request).await.unwrap();
    let status = response.status();
    let body_bytes = response.into_body().collect().await.unwrap().to_bytes();
    let json = if body_bytes.is_empty() {
        serde_json::Value::Null
    } else {
        serde_json::from_slice(&body_bytes).unwrap()
    };

    (status, json)
}

/// Send a moderator command with the admin token and return the reply.
pub async fn run_command(app: Router, command: &str, args: &[&str]) -> (StatusCode, serde_json::Value) {
    let body = serde_json::json!({ "command": command, "args": args });
    send(app, "POST", "/api/v1/admin/commands", Some(ADMIN_TOKEN), Some(&body)).await
}

/// Send a POST request with a JSON body and an optional bearer token.
pub async fn post_json(
    app: Router,
    uri: &str,
    token: Option<&str>,
    body: &serde_json::Value,
) -> (StatusCode, serde_json::Value) {
    send(app, "POST", uri, token, Some(body)).await
}

/// Send a PUT request with a JSON body.
pub async fn put_json(app: Router, uri: &str, body: &serde_json::Value) -> (StatusCode, serde_json::Value) {
    send(app, "PUT", uri, None, Some(body)).await
}

/// Send a GET request and return the response.
pub async fn get_json(app: Router, uri: &str) -> (StatusCode, serde_json::Value) {
    send(app, "GET", uri, None, None).await
}
