// Event CRUD, listing filters and ownership

use axum::http::{Method, StatusCode};
use serde_json::json;

use super::common::*;

#[tokio::test]
async fn test_create_event_embeds_author() {
    let state = test_app_state();
    let (token, user_id) = register(&state, "Ada", "ada@example.com").await;

    let (status, body) = send(
        &state,
        request(Method::POST, "/api/events", Some(&token), Some(event_payload("Jazz Night", "Downtown", "Music"))),
    )
    .await;

    assert_eq!(status, StatusCode::CREATED);
    let event = &body["event"];
    assert_eq!(event["title"], "Jazz Night");
    assert_eq!(event["category"], "Music");
    assert_eq!(event["date"], "2026-11-20");
    assert_eq!(event["time"], "19:30");
    assert_eq!(event["familyName"], "Smith");
    assert_eq!(event["createdBy"]["id"], user_id.as_str());
    assert_eq!(event["createdBy"]["firstName"], "Ada");
    assert_eq!(event["likes"], json!([]));
}

#[tokio::test]
async fn test_create_event_requires_auth_and_fields() {
    let state = test_app_state();
    let (status, _) = send(
        &state,
        request(Method::POST, "/api/events", None, Some(event_payload("Jazz Night", "Downtown", "Music"))),
    )
    .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let (token, _) = register(&state, "Ada", "ada@example.com").await;
    let (status, body) = send(
        &state,
        request(Method::POST, "/api/events", Some(&token), Some(json!({ "title": "Half an event" }))),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["message"], "Please provide all required fields");

    let (status, body) = send(
        &state,
        request(Method::POST, "/api/events", Some(&token), Some(event_payload("Bake Off", "Downtown", "Cooking"))),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["message"].as_str().unwrap().contains("Invalid category"));
}

#[tokio::test]
async fn test_get_event_is_public_with_author_email() {
    let state = test_app_state();
    let (token, _) = register(&state, "Ada", "ada@example.com").await;
    let event_id = create_event(&state, &token, "Jazz Night", "Downtown", "Music").await;

    let (status, body) =
        send(&state, request(Method::GET, &format!("/api/events/{}", event_id), None, None)).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["event"]["id"], event_id.as_str());
    assert_eq!(body["event"]["createdBy"]["email"], "ada@example.com");
}

#[tokio::test]
async fn test_get_missing_event() {
    let state = test_app_state();
    let missing = events_api::core::models::EventId::generate();

    let (status, body) =
        send(&state, request(Method::GET, &format!("/api/events/{}", missing), None, None)).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["message"], "Event not found");
}

#[tokio::test]
async fn test_list_filters_by_area_and_search() {
    let state = test_app_state();
    let (token, _) = register(&state, "Ada", "ada@example.com").await;
    create_event(&state, &token, "Jazz Night", "Downtown", "Music").await;
    create_event(&state, &token, "Jazz Brunch", "Uptown", "Music").await;
    create_event(&state, &token, "Chess Club", "Downtown", "Social").await;

    let (status, body) =
        send(&state, request(Method::GET, "/api/events?area=Downtown&search=JAZZ", None, None)).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["count"], 1);
    assert_eq!(body["total"], 1);
    assert_eq!(body["events"][0]["title"], "Jazz Night");

    let (_, body) = send(&state, request(Method::GET, "/api/events?category=Social", None, None)).await;
    assert_eq!(body["count"], 1);
    assert_eq!(body["events"][0]["title"], "Chess Club");
}

#[tokio::test]
async fn test_list_unknown_category_is_empty() {
    let state = test_app_state();
    let (token, _) = register(&state, "Ada", "ada@example.com").await;
    create_event(&state, &token, "Jazz Night", "Downtown", "Music").await;

    let (status, body) =
        send(&state, request(Method::GET, "/api/events?category=Cooking", None, None)).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["count"], 0);
    assert_eq!(body["total"], 0);
    assert_eq!(body["events"], json!([]));
}

#[tokio::test]
async fn test_list_paginates_newest_first() {
    let state = test_app_state();
    let (token, _) = register(&state, "Ada", "ada@example.com").await;
    for title in ["First", "Second", "Third"] {
        create_event(&state, &token, title, "Downtown", "Music").await;
    }

    let (_, page_one) = send(&state, request(Method::GET, "/api/events?page=1&limit=2", None, None)).await;
    assert_eq!(page_one["count"], 2);
    assert_eq!(page_one["total"], 3);
    assert_eq!(page_one["pages"], 2);
    assert_eq!(page_one["events"][0]["title"], "Third");
    assert_eq!(page_one["events"][1]["title"], "Second");

    let (_, page_two) = send(&state, request(Method::GET, "/api/events?page=2&limit=2", None, None)).await;
    assert_eq!(page_two["count"], 1);
    assert_eq!(page_two["events"][0]["title"], "First");

    // Garbage paging falls back to defaults
    let (status, fallback) =
        send(&state, request(Method::GET, "/api/events?page=zero&limit=-4", None, None)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(fallback["count"], 3);
    assert_eq!(fallback["pages"], 1);
}

#[tokio::test]
async fn test_only_owner_can_update() {
    let state = test_app_state();
    let (owner, _) = register(&state, "Ada", "ada@example.com").await;
    let (other, _) = register(&state, "Eve", "eve@example.com").await;
    let event_id = create_event(&state, &owner, "Jazz Night", "Downtown", "Music").await;
    let uri = format!("/api/events/{}", event_id);

    let (status, body) = send(
        &state,
        request(Method::PUT, &uri, Some(&other), Some(json!({ "title": "Hijacked" }))),
    )
    .await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(body["message"], "Not authorized to update this event");

    let (status, body) = send(
        &state,
        request(Method::PUT, &uri, Some(&owner), Some(json!({ "title": "Late Jazz", "time": "21:00" }))),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["event"]["title"], "Late Jazz");
    assert_eq!(body["event"]["time"], "21:00");
    assert_eq!(body["event"]["area"], "Downtown");

    let (_, body) = send(&state, request(Method::GET, &uri, None, None)).await;
    assert_eq!(body["event"]["title"], "Late Jazz");
}

#[tokio::test]
async fn test_update_with_nothing_to_change() {
    let state = test_app_state();
    let (owner, _) = register(&state, "Ada", "ada@example.com").await;
    let event_id = create_event(&state, &owner, "Jazz Night", "Downtown", "Music").await;

    let (status, body) = send(
        &state,
        request(Method::PUT, &format!("/api/events/{}", event_id), Some(&owner), Some(json!({}))),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["message"], "No fields to update");
}

#[tokio::test]
async fn test_only_owner_can_delete() {
    let state = test_app_state();
    let (owner, _) = register(&state, "Ada", "ada@example.com").await;
    let (other, _) = register(&state, "Eve", "eve@example.com").await;
    let event_id = create_event(&state, &owner, "Jazz Night", "Downtown", "Music").await;
    let uri = format!("/api/events/{}", event_id);

    let (status, _) = send(&state, request(Method::DELETE, &uri, Some(&other), None)).await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (status, body) = send(&state, request(Method::DELETE, &uri, Some(&owner), None)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["message"], "Event deleted successfully");

    let (status, _) = send(&state, request(Method::GET, &uri, None, None)).await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (status, _) = send(&state, request(Method::DELETE, &uri, Some(&owner), None)).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_owner_can_set_and_clear_image() {
    let state = test_app_state();
    let (owner, _) = register(&state, "Ada", "ada@example.com").await;
    let event_id = create_event(&state, &owner, "Jazz Night", "Downtown", "Music").await;
    let uri = format!("/api/events/{}", event_id);

    let (status, body) = send(
        &state,
        request(Method::PUT, &uri, Some(&owner), Some(json!({ "image": "/img/jazz.png" }))),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["event"]["image"], "/img/jazz.png");

    let (status, body) = send(
        &state,
        request(Method::PUT, &uri, Some(&owner), Some(json!({ "image": "" }))),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert!(body["event"]["image"].is_null());
    assert_eq!(body["event"]["title"], "Jazz Night");
}
