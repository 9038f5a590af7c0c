// Common test utilities and helpers for all test modules

#![allow(dead_code)]

use axum::{
    body::Body,
    http::{header, Method, Request, StatusCode},
    Router,
};
use events_api::api::{create_router, AppState};
use events_api::auth::audit_logger::AuditLogger;
use events_api::config::Config;
use events_api::state::memory_store::MemoryStore;
use secrecy::Secret;
use serde_json::{json, Value};
use std::sync::Arc;
use tower::ServiceExt;

/// App state on a fresh in-memory store with cheap password hashing
pub fn test_app_state() -> AppState {
    AppState::new(
        Arc::new(MemoryStore::new()),
        Config::test_config(),
        AuditLogger::new(None),
    )
    .unwrap()
}

/// Same as `test_app_state` but tokens are signed with `secret`
pub fn test_app_state_with_secret(secret: &str) -> AppState {
    let mut config = Config::test_config();
    config.jwt_secret = Secret::new(secret.to_string());
    AppState::new(Arc::new(MemoryStore::new()), config, AuditLogger::new(None)).unwrap()
}

pub fn app(state: &AppState) -> Router {
    create_router(state).with_state(state.clone())
}

/// Build a request; `body` is sent as JSON when present
pub fn request(method: Method, uri: &str, token: Option<&str>, body: Option<Value>) -> Request<Body> {
    let mut builder = Request::builder().method(method).uri(uri);
    if let Some(token) = token {
        builder = builder.header(header::AUTHORIZATION, format!("Bearer {}", token));
    }
    match body {
        Some(body) => builder
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(body.to_string()))
            .unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    }
}

/// Send one request through a fresh router clone and decode the JSON body
pub async fn send(state: &AppState, req: Request<Body>) -> (StatusCode, Value) {
    let response = app(state).oneshot(req).await.unwrap();
    let status = response.status();
    (status, body_json(response.into_body()).await)
}

pub async fn body_json(body: Body) -> Value {
    let bytes = axum::body::to_bytes(body, usize::MAX).await.unwrap();
    if bytes.is_empty() {
        return Value::Null;
    }
    serde_json::from_slice(&bytes).unwrap()
}

pub fn registration(first_name: &str, email: &str) -> Value {
    json!({
        "firstName": first_name,
        "lastName": "Tester",
        "email": email,
        "password": "secret123",
        "confirmPassword": "secret123",
    })
}

/// Register a user and return (token, user id)
pub async fn register(state: &AppState, first_name: &str, email: &str) -> (String, String) {
    let (status, body) = send(
        state,
        request(Method::POST, "/api/auth/register", None, Some(registration(first_name, email))),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED, "registration failed: {}", body);
    (
        body["token"].as_str().unwrap().to_string(),
        body["user"]["id"].as_str().unwrap().to_string(),
    )
}

pub fn event_payload(title: &str, area: &str, category: &str) -> Value {
    json!({
        "title": title,
        "description": format!("{} description", title),
        "category": category,
        "date": "2026-11-20",
        "time": "19:30",
        "location": "Community Hall",
        "area": area,
        "familyName": "Smith",
    })
}

/// Create an event as the token's owner and return its id
pub async fn create_event(state: &AppState, token: &str, title: &str, area: &str, category: &str) -> String {
    let (status, body) = send(
        state,
        request(Method::POST, "/api/events", Some(token), Some(event_payload(title, area, category))),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED, "event creation failed: {}", body);
    body["event"]["id"].as_str().unwrap().to_string()
}

/// True if any string anywhere in the value contains `needle`, or any key equals it
pub fn json_mentions(value: &Value, needle: &str) -> bool {
    match value {
        Value::String(s) => s.contains(needle),
        Value::Array(items) => items.iter().any(|v| json_mentions(v, needle)),
        Value::Object(map) => map.iter().any(|(k, v)| k == needle || json_mentions(v, needle)),
        _ => false,
    }
}
