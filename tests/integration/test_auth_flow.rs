// Registration, login and the authorization guard

use axum::http::{Method, StatusCode};
use events_api::core::models::UserId;
use serde_json::json;

use super::common::*;

#[tokio::test]
async fn test_register_returns_token_and_user() {
    let state = test_app_state();
    let (status, body) = send(
        &state,
        request(Method::POST, "/api/auth/register", None, Some(registration("Ada", "Ada@Example.com"))),
    )
    .await;

    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["success"], true);
    assert!(body["token"].as_str().is_some_and(|t| !t.is_empty()));
    assert_eq!(body["user"]["firstName"], "Ada");
    assert_eq!(body["user"]["email"], "ada@example.com");
}

#[tokio::test]
async fn test_duplicate_email_rejected_in_any_case() {
    let state = test_app_state();
    register(&state, "Ada", "ada@example.com").await;

    let (status, body) = send(
        &state,
        request(Method::POST, "/api/auth/register", None, Some(registration("Eve", "ADA@example.COM"))),
    )
    .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["success"], false);
    assert_eq!(body["message"], "User already exists");
}

#[tokio::test]
async fn test_register_validation() {
    let state = test_app_state();

    let missing = json!({ "firstName": "Ada", "email": "ada@example.com" });
    let (status, body) =
        send(&state, request(Method::POST, "/api/auth/register", None, Some(missing))).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["message"], "Please provide all required fields");

    let mut mismatch = registration("Ada", "ada@example.com");
    mismatch["confirmPassword"] = json!("different");
    let (status, body) =
        send(&state, request(Method::POST, "/api/auth/register", None, Some(mismatch))).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["message"], "Passwords do not match");

    let (status, _) = send(
        &state,
        request(Method::POST, "/api/auth/register", None, Some(registration("Ada", "not-an-email"))),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, body) = send(
        &state,
        request(Method::POST, "/api/auth/register", None, Some(registration("Ada", "ada@example.museum"))),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["message"], "Please provide a valid email");
}

#[tokio::test]
async fn test_login_then_me() {
    let state = test_app_state();
    register(&state, "Ada", "ada@example.com").await;

    let (status, body) = send(
        &state,
        request(
            Method::POST,
            "/api/auth/login",
            None,
            Some(json!({ "email": "ADA@example.com", "password": "secret123" })),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    let token = body["token"].as_str().unwrap().to_string();

    let (status, body) = send(&state, request(Method::GET, "/api/auth/me", Some(&token), None)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["user"]["email"], "ada@example.com");
    assert_eq!(body["user"]["savedEvents"], json!([]));
}

#[tokio::test]
async fn test_login_failures_are_indistinguishable() {
    let state = test_app_state();
    register(&state, "Ada", "ada@example.com").await;

    let (wrong_status, wrong_body) = send(
        &state,
        request(
            Method::POST,
            "/api/auth/login",
            None,
            Some(json!({ "email": "ada@example.com", "password": "nope-nope" })),
        ),
    )
    .await;
    let (unknown_status, unknown_body) = send(
        &state,
        request(
            Method::POST,
            "/api/auth/login",
            None,
            Some(json!({ "email": "nobody@example.com", "password": "secret123" })),
        ),
    )
    .await;

    assert_eq!(wrong_status, StatusCode::UNAUTHORIZED);
    assert_eq!(unknown_status, StatusCode::UNAUTHORIZED);
    assert_eq!(wrong_body, unknown_body);
    assert_eq!(wrong_body["message"], "Invalid credentials");
}

#[tokio::test]
async fn test_login_requires_both_fields() {
    let state = test_app_state();
    let (status, body) = send(
        &state,
        request(Method::POST, "/api/auth/login", None, Some(json!({ "email": "ada@example.com" }))),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["message"], "Please provide email and password");
}

#[tokio::test]
async fn test_protected_route_without_token() {
    let state = test_app_state();
    let (status, body) = send(&state, request(Method::GET, "/api/auth/me", None, None)).await;

    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["success"], false);
    assert_eq!(body["message"], "Not authorized to access this route");
}

#[tokio::test]
async fn test_protected_route_with_garbage_token() {
    let state = test_app_state();
    let (status, _) =
        send(&state, request(Method::GET, "/api/calendar", Some("not.a.jwt"), None)).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_token_signed_with_other_secret_rejected() {
    let state = test_app_state();
    let other = test_app_state_with_secret("a-different-secret");
    let (token, _) = register(&other, "Ada", "ada@example.com").await;

    let (status, _) = send(&state, request(Method::GET, "/api/auth/me", Some(&token), None)).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_token_for_missing_user_is_not_found() {
    let state = test_app_state();
    let token = state.tokens.issue_token(UserId::generate()).unwrap();

    let (status, body) = send(&state, request(Method::GET, "/api/auth/me", Some(&token), None)).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["message"], "User not found");
}

#[tokio::test]
async fn test_password_hash_never_serialized() {
    let state = test_app_state();
    let (token, user_id) = register(&state, "Ada", "ada@example.com").await;

    let responses = vec![
        send(&state, request(Method::GET, "/api/auth/me", Some(&token), None)).await.1,
        send(&state, request(Method::GET, "/api/users", None, None)).await.1,
        send(&state, request(Method::GET, &format!("/api/users/{}", user_id), None, None)).await.1,
    ];

    for body in responses {
        assert!(!json_mentions(&body, "password"), "leaked: {}", body);
        assert!(!json_mentions(&body, "passwordHash"), "leaked: {}", body);
        assert!(!json_mentions(&body, "$argon2"), "leaked: {}", body);
    }
}

#[tokio::test]
async fn test_token_with_swapped_payload_rejected() {
    let state = test_app_state();
    let (ada_token, _) = register(&state, "Ada", "ada@example.com").await;
    let (eve_token, _) = register(&state, "Eve", "eve@example.com").await;

    // Ada's header and signature around Eve's claims
    let ada: Vec<&str> = ada_token.split('.').collect();
    let eve: Vec<&str> = eve_token.split('.').collect();
    let spliced = format!("{}.{}.{}", ada[0], eve[1], ada[2]);

    let (status, body) = send(&state, request(Method::GET, "/api/auth/me", Some(&spliced), None)).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["message"], "Not authorized to access this route");
}
