// Extractors whose rejections render the standard error envelope

use axum::extract::{FromRequest, FromRequestParts};
use crate::api::responses::ApiError;
use crate::core::errors::AppError;
use crate::core::models::{EventId, UserId};

/// `axum::Json` with malformed bodies rejected as 400 envelopes
#[derive(FromRequest)]
#[from_request(via(axum::Json), rejection(ApiError))]
pub struct ApiJson<T>(pub T);

/// `axum::extract::Query` with bad query strings rejected as 400 envelopes
#[derive(FromRequestParts)]
#[from_request(via(axum::extract::Query), rejection(ApiError))]
pub struct ApiQuery<T>(pub T);

/// Ids in paths: anything that is not a valid id cannot name an existing resource
pub fn parse_event_id(raw: &str) -> Result<EventId, AppError> {
    raw.parse()
        .map_err(|_| AppError::NotFound("Event not found".to_string()))
}

pub fn parse_user_id(raw: &str) -> Result<UserId, AppError> {
    raw.parse()
        .map_err(|_| AppError::NotFound("User not found".to_string()))
}
