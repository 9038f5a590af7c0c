// Middleware stack: tracing, CORS, body limit, timeout, error envelopes

use axum::{
    http::{header::CONTENT_TYPE, StatusCode},
    response::{IntoResponse, Response},
    BoxError, Json,
};
use tower_http::{
    classify::{ServerErrorsAsFailures, SharedClassifier},
    cors::CorsLayer,
    limit::RequestBodyLimitLayer,
    trace::TraceLayer,
};
use tracing::warn;
use crate::api::responses::{status_envelope, ApiError};

/// Request/response tracing: method, path, status, latency
pub fn tracing_layer() -> TraceLayer<SharedClassifier<ServerErrorsAsFailures>> {
    TraceLayer::new_for_http()
}

/// Any origin, any method, any header
pub fn cors_layer() -> CorsLayer {
    CorsLayer::permissive()
}

/// Returns 413 Payload Too Large when exceeded
pub fn body_size_limit_layer(limit: usize) -> RequestBodyLimitLayer {
    RequestBodyLimitLayer::new(limit)
}

/// Convert errors raised by the timeout layer into the error envelope
pub async fn handle_timeout_error(err: BoxError) -> ApiError {
    if err.is::<tower::timeout::error::Elapsed>() {
        warn!("Request timed out");
        ApiError::new(StatusCode::REQUEST_TIMEOUT, "Request timed out")
    } else {
        ApiError::new(StatusCode::INTERNAL_SERVER_ERROR, "Internal server error")
    }
}

/// Rewrite non-JSON error responses (unmatched routes, body limit rejections)
/// into the standard envelope so every failure has the same shape
pub async fn envelope_bare_errors(response: Response) -> Response {
    let status = response.status();
    if !(status.is_client_error() || status.is_server_error()) {
        return response;
    }

    let is_json = response
        .headers()
        .get(CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .is_some_and(|v| v.starts_with("application/json"));
    if is_json {
        return response;
    }

    (status, Json(status_envelope(status))).into_response()
}
