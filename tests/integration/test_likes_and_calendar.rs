// Like toggling and the personal calendar

use axum::http::{Method, StatusCode};
use events_api::core::models::EventId;
use serde_json::json;

use super::common::*;

#[tokio::test]
async fn test_like_toggles_twice() {
    let state = test_app_state();
    let (owner, _) = register(&state, "Ada", "ada@example.com").await;
    let (fan, fan_id) = register(&state, "Eve", "eve@example.com").await;
    let event_id = create_event(&state, &owner, "Jazz Night", "Downtown", "Music").await;
    let uri = format!("/api/events/{}/like", event_id);

    let (status, body) = send(&state, request(Method::POST, &uri, Some(&fan), None)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["message"], "Event liked");
    assert_eq!(body["event"]["likes"], json!([fan_id]));

    let (status, body) = send(&state, request(Method::POST, &uri, Some(&fan), None)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["message"], "Event unliked");
    assert_eq!(body["event"]["likes"], json!([]));
}

#[tokio::test]
async fn test_likes_from_two_users_accumulate() {
    let state = test_app_state();
    let (owner, owner_id) = register(&state, "Ada", "ada@example.com").await;
    let (fan, fan_id) = register(&state, "Eve", "eve@example.com").await;
    let event_id = create_event(&state, &owner, "Jazz Night", "Downtown", "Music").await;
    let uri = format!("/api/events/{}/like", event_id);

    send(&state, request(Method::POST, &uri, Some(&owner), None)).await;
    send(&state, request(Method::POST, &uri, Some(&fan), None)).await;

    let (_, body) =
        send(&state, request(Method::GET, &format!("/api/events/{}", event_id), None, None)).await;
    let likes = body["event"]["likes"].as_array().unwrap();
    assert_eq!(likes.len(), 2);

    // Single-event fetch resolves likers to user summaries
    let liker_ids: Vec<&str> = likes.iter().map(|l| l["id"].as_str().unwrap()).collect();
    assert!(liker_ids.contains(&owner_id.as_str()));
    assert!(liker_ids.contains(&fan_id.as_str()));
}

#[tokio::test]
async fn test_like_missing_event() {
    let state = test_app_state();
    let (token, _) = register(&state, "Ada", "ada@example.com").await;

    let (status, body) = send(
        &state,
        request(Method::POST, &format!("/api/events/{}/like", EventId::generate()), Some(&token), None),
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["message"], "Event not found");
}

#[tokio::test]
async fn test_calendar_save_twice_conflicts() {
    let state = test_app_state();
    let (token, user_id) = register(&state, "Ada", "ada@example.com").await;
    let event_id = create_event(&state, &token, "Jazz Night", "Downtown", "Music").await;
    let uri = format!("/api/calendar/{}", event_id);

    let (status, body) = send(&state, request(Method::POST, &uri, Some(&token), None)).await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["message"], "Event saved to calendar");
    assert_eq!(body["calendarEvent"]["user"], user_id.as_str());
    assert_eq!(body["calendarEvent"]["event"]["id"], event_id.as_str());

    let (status, body) = send(&state, request(Method::POST, &uri, Some(&token), None)).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["message"], "Event already saved to calendar");
}

#[tokio::test]
async fn test_calendar_save_missing_event() {
    let state = test_app_state();
    let (token, _) = register(&state, "Ada", "ada@example.com").await;

    let (status, body) = send(
        &state,
        request(Method::POST, &format!("/api/calendar/{}", EventId::generate()), Some(&token), None),
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["message"], "Event not found");
}

#[tokio::test]
async fn test_calendar_remove_not_saved() {
    let state = test_app_state();
    let (token, _) = register(&state, "Ada", "ada@example.com").await;
    let event_id = create_event(&state, &token, "Jazz Night", "Downtown", "Music").await;

    let (status, body) = send(
        &state,
        request(Method::DELETE, &format!("/api/calendar/{}", event_id), Some(&token), None),
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["message"], "Event not found in calendar");
}

#[tokio::test]
async fn test_calendar_is_per_user() {
    let state = test_app_state();
    let (ada, _) = register(&state, "Ada", "ada@example.com").await;
    let (eve, _) = register(&state, "Eve", "eve@example.com").await;
    let event_id = create_event(&state, &ada, "Jazz Night", "Downtown", "Music").await;
    let uri = format!("/api/calendar/{}", event_id);

    send(&state, request(Method::POST, &uri, Some(&ada), None)).await;

    // Eve's save is independent of Ada's
    let (status, _) = send(&state, request(Method::POST, &uri, Some(&eve), None)).await;
    assert_eq!(status, StatusCode::CREATED);

    let (status, _) = send(&state, request(Method::DELETE, &uri, Some(&eve), None)).await;
    assert_eq!(status, StatusCode::OK);

    let (_, body) = send(&state, request(Method::GET, "/api/calendar", Some(&ada), None)).await;
    assert_eq!(body["count"], 1);
}

#[tokio::test]
async fn test_calendar_list_after_remove_and_delete() {
    let state = test_app_state();
    let (token, _) = register(&state, "Ada", "ada@example.com").await;
    let kept = create_event(&state, &token, "Jazz Night", "Downtown", "Music").await;
    let removed = create_event(&state, &token, "Chess Club", "Downtown", "Social").await;
    let deleted = create_event(&state, &token, "Food Fair", "Uptown", "Food").await;

    for id in [&kept, &removed, &deleted] {
        let (status, _) =
            send(&state, request(Method::POST, &format!("/api/calendar/{}", id), Some(&token), None)).await;
        assert_eq!(status, StatusCode::CREATED);
    }

    let (status, body) = send(
        &state,
        request(Method::DELETE, &format!("/api/calendar/{}", removed), Some(&token), None),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["message"], "Event removed from calendar");

    let (status, _) = send(
        &state,
        request(Method::DELETE, &format!("/api/events/{}", deleted), Some(&token), None),
    )
    .await;
    assert_eq!(status, StatusCode::OK);

    let (status, body) = send(&state, request(Method::GET, "/api/calendar", Some(&token), None)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["count"], 1);
    assert_eq!(body["events"][0]["event"]["id"], kept.as_str());
    assert_eq!(body["events"][0]["event"]["createdBy"]["firstName"], "Ada");
}

#[tokio::test]
async fn test_calendar_requires_auth() {
    let state = test_app_state();
    let (status, _) = send(&state, request(Method::GET, "/api/calendar", None, None)).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}
