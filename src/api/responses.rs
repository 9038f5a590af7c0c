// Response envelope and error rendering

use axum::{
    extract::rejection::{JsonRejection, QueryRejection},
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use serde_json::{json, Map, Value};
use tracing::error;
use crate::core::errors::{AppError, CryptoError};

/// Error body: `{ "success": false, "message": ... }`
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub success: bool,
    pub message: String,
}

/// Successful body: `{ "success": true, "message"?: ..., ...payload }`
#[derive(Debug)]
pub struct Envelope {
    status: StatusCode,
    body: Map<String, Value>,
    /// Set when any field failed to serialize; the envelope then renders as a 500
    serialization_failed: bool,
}

impl Envelope {
    pub fn ok() -> Self {
        Self::with_status(StatusCode::OK)
    }

    pub fn created() -> Self {
        Self::with_status(StatusCode::CREATED)
    }

    fn with_status(status: StatusCode) -> Self {
        let mut body = Map::new();
        body.insert("success".to_string(), Value::Bool(true));
        Self {
            status,
            body,
            serialization_failed: false,
        }
    }

    pub fn message(self, message: &str) -> Self {
        self.field("message", message)
    }

    /// Add a payload field. A field that fails to serialize turns the whole
    /// response into a 500 rather than a partial body.
    pub fn field(mut self, key: &str, value: impl Serialize) -> Self {
        match serde_json::to_value(value) {
            Ok(value) => {
                self.body.insert(key.to_string(), value);
            }
            Err(e) => {
                error!(field = key, error = %e, "Failed to serialize response field");
                self.serialization_failed = true;
            }
        }
        self
    }

    /// Status the envelope will render with
    pub fn status(&self) -> StatusCode {
        if self.serialization_failed {
            StatusCode::INTERNAL_SERVER_ERROR
        } else {
            self.status
        }
    }
}

impl IntoResponse for Envelope {
    fn into_response(self) -> Response {
        if self.serialization_failed {
            return ApiError::new(StatusCode::INTERNAL_SERVER_ERROR, "Internal server error")
                .into_response();
        }
        (self.status, Json(Value::Object(self.body))).into_response()
    }
}

/// API error type that converts domain errors to HTTP responses
#[derive(Debug)]
pub struct ApiError {
    pub status: StatusCode,
    pub message: String,
}

impl ApiError {
    pub fn new(status: StatusCode, message: impl Into<String>) -> Self {
        Self {
            status,
            message: message.into(),
        }
    }

    /// Create from AppError; server-side failures are logged here with full detail
    pub fn from_app_error(err: AppError) -> Self {
        if err.is_unexpected() {
            error!(error = %err, "Request failed");
        }
        let status =
            StatusCode::from_u16(err.status_code()).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
        Self {
            status,
            message: err.user_message(),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let body = Json(ErrorResponse {
            success: false,
            message: self.message,
        });
        (self.status, body).into_response()
    }
}

impl From<AppError> for ApiError {
    fn from(err: AppError) -> Self {
        ApiError::from_app_error(err)
    }
}

impl From<CryptoError> for ApiError {
    fn from(err: CryptoError) -> Self {
        ApiError::from_app_error(AppError::Crypto(err))
    }
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        let status = rejection.status();
        match rejection {
            // Oversized bodies keep their 413
            JsonRejection::BytesRejection(_) if status == StatusCode::PAYLOAD_TOO_LARGE => {
                ApiError::new(StatusCode::PAYLOAD_TOO_LARGE, "Request body too large")
            }
            JsonRejection::MissingJsonContentType(_) => ApiError::new(
                StatusCode::BAD_REQUEST,
                "Expected request with `Content-Type: application/json`",
            ),
            other => ApiError::new(
                StatusCode::BAD_REQUEST,
                format!("Invalid JSON body: {}", other.body_text()),
            ),
        }
    }
}

impl From<QueryRejection> for ApiError {
    fn from(rejection: QueryRejection) -> Self {
        ApiError::new(
            StatusCode::BAD_REQUEST,
            format!("Invalid query string: {}", rejection.body_text()),
        )
    }
}

/// Envelope for bare status responses produced by layers (timeouts, body limits)
pub fn status_envelope(status: StatusCode) -> Value {
    let message = match status {
        StatusCode::REQUEST_TIMEOUT => "Request timed out",
        StatusCode::PAYLOAD_TOO_LARGE => "Request body too large",
        StatusCode::NOT_FOUND => "Route not found",
        StatusCode::METHOD_NOT_ALLOWED => "Method not allowed",
        _ => "Internal server error",
    };
    json!({ "success": false, "message": message })
}
