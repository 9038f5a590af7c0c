// Every failure renders as { success: false, message }

use axum::{
    body::Body,
    http::{header, Method, Request, StatusCode},
};
use tower::ServiceExt;

use super::common::*;

#[tokio::test]
async fn test_health_is_public() {
    let state = test_app_state();
    let (status, body) = send(&state, request(Method::GET, "/api/health", None, None)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["success"], true);
    assert_eq!(body["message"], "Server is running");
}

#[tokio::test]
async fn test_malformed_json_is_bad_request() {
    let state = test_app_state();
    let req = Request::builder()
        .method(Method::POST)
        .uri("/api/auth/register")
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from("{\"firstName\": "))
        .unwrap();

    let (status, body) = send(&state, req).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["success"], false);
    assert!(body["message"].as_str().unwrap().starts_with("Invalid JSON body"));
}

#[tokio::test]
async fn test_missing_content_type_is_bad_request() {
    let state = test_app_state();
    let req = Request::builder()
        .method(Method::POST)
        .uri("/api/auth/login")
        .body(Body::from("{}"))
        .unwrap();

    let (status, body) = send(&state, req).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["success"], false);
}

#[tokio::test]
async fn test_malformed_event_id_is_not_found() {
    let state = test_app_state();
    let (status, body) = send(&state, request(Method::GET, "/api/events/12345", None, None)).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["message"], "Event not found");
}

#[tokio::test]
async fn test_unmatched_route_has_envelope() {
    let state = test_app_state();
    let (status, body) = send(&state, request(Method::GET, "/api/nowhere", None, None)).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["success"], false);
    assert_eq!(body["message"], "Route not found");
}

#[tokio::test]
async fn test_oversized_body_is_413() {
    let mut config = events_api::config::Config::test_config();
    config.body_size_limit_bytes = 64;
    let state = events_api::api::AppState::new(
        std::sync::Arc::new(events_api::state::memory_store::MemoryStore::new()),
        config,
        events_api::auth::audit_logger::AuditLogger::new(None),
    )
    .unwrap();

    let big = format!("{{\"email\": \"{}@example.com\", \"password\": \"x\"}}", "a".repeat(200));
    let req = Request::builder()
        .method(Method::POST)
        .uri("/api/auth/login")
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(big))
        .unwrap();

    let response = app(&state).oneshot(req).await.unwrap();
    assert_eq!(response.status(), StatusCode::PAYLOAD_TOO_LARGE);
    let body = body_json(response.into_body()).await;
    assert_eq!(body["success"], false);
    assert_eq!(body["message"], "Request body too large");
}

#[tokio::test]
async fn test_cors_preflight_allowed() {
    let state = test_app_state();
    let req = Request::builder()
        .method(Method::OPTIONS)
        .uri("/api/events")
        .header(header::ORIGIN, "http://localhost:3000")
        .header(header::ACCESS_CONTROL_REQUEST_METHOD, "POST")
        .body(Body::empty())
        .unwrap();

    let response = app(&state).oneshot(req).await.unwrap();
    assert!(response.headers().contains_key(header::ACCESS_CONTROL_ALLOW_ORIGIN));
}
