//! Shared setup for the integration tests

#![allow(dead_code)]

use axum::{
    body::Body,
    http::{Request, StatusCode},
    Router,
};
use http_body_util::BodyExt;
use serde_json::{json, Value};
use std::sync::Arc;
use tempfile::TempDir;
use tower::ServiceExt;

use classifieds::config::Config;
use classifieds::database::{init_db, AppState};
use classifieds::route::create_app;

/// Page size used by every test app
pub const PAGE_SIZE: usize = 2;

pub struct TestApp {
    pub app: Router,
    pub state: AppState,
    pub dir: TempDir,
}

/// Builds the app on a temporary database and media directory
pub fn setup_test_app() -> TestApp {
    let dir = TempDir::new().expect("Failed to create temp dir");
    let db_path = dir.path().join("test.db");
    let db = init_db(db_path.to_str().unwrap()).expect("Failed to initialize test database");

    let config = Config {
        total_on_page: PAGE_SIZE,
        media_root: dir.path().join("media"),
        ..Config::default()
    };
    let state = AppState {
        db: Arc::new(db),
        config: Arc::new(config),
    };

    TestApp {
        app: create_app(state.clone()),
        state,
        dir,
    }
}

/// Helper function to parse response body as JSON
pub async fn response_json(body: Body) -> Value {
    let bytes = body
        .collect()
        .await
        .expect("Failed to read response body")
        .to_bytes();

    serde_json::from_slice(&bytes).expect("Failed to parse JSON")
}

/// Sends a request with an optional JSON body and returns status and raw response
pub async fn send_raw(
    app: &Router,
    method: &str,
    uri: &str,
    body: Option<Value>,
) -> axum::response::Response {
    let builder = Request::builder().method(method).uri(uri);
    let request = match body {
        Some(payload) => builder
            .header("content-type", "application/json")
            .body(Body::from(payload.to_string())),
        None => builder.body(Body::empty()),
    }
    .unwrap();

    app.clone().oneshot(request).await.unwrap()
}

/// Sends a request and parses the JSON response
pub async fn send(app: &Router, method: &str, uri: &str, body: Option<Value>) -> (StatusCode, Value) {
    let response = send_raw(app, method, uri, body).await;
    let status = response.status();
    (status, response_json(response.into_body()).await)
}

pub async fn create_user(app: &Router, username: &str) -> Value {
    create_user_in(app, username, &[]).await
}

pub async fn create_user_in(app: &Router, username: &str, locations: &[&str]) -> Value {
    let (status, body) = send(
        app,
        "POST",
        "/user/create/",
        Some(json!({
            "username": username,
            "first_name": "Test",
            "last_name": "User",
            "role": "member",
            "password": "secret",
            "age": 30,
            "locations": locations,
        })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED, "{body}");
    body
}

pub async fn create_category(app: &Router, name: &str) -> Value {
    let (status, body) = send(app, "POST", "/cat/create/", Some(json!({ "name": name }))).await;
    assert_eq!(status, StatusCode::CREATED, "{body}");
    body
}

pub async fn create_ad(
    app: &Router,
    name: &str,
    author: &str,
    category: &str,
    price: u32,
    is_published: bool,
) -> Value {
    let (status, body) = send(
        app,
        "POST",
        "/ad/create/",
        Some(json!({
            "name": name,
            "author": author,
            "category": category,
            "price": price,
            "description": format!("{name} for sale"),
            "is_published": is_published,
        })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED, "{body}");
    body
}
