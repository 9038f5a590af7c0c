// Axum authorization guard

use axum::{
    extract::{Request, State},
    http::{HeaderMap, Method},
    middleware::Next,
    response::Response,
};
use std::sync::Arc;
use tracing::error;
use crate::api::responses::ApiError;
use crate::api::UserStore;
use crate::auth::audit_logger::{AuditContext, AuditLogger, AuthEvent};
use crate::auth::bearer::BearerToken;
use crate::core::crypto::TokenSigner;
use crate::core::errors::AppError;
use crate::core::models::{User, UserId};

const NOT_AUTHORIZED: &str = "Not authorized to access this route";

/// Dependencies of the guard
#[derive(Clone)]
pub struct AuthState {
    pub users: Arc<dyn UserStore + Send + Sync>,
    pub tokens: Arc<TokenSigner>,
    pub audit_logger: Arc<AuditLogger>,
}

/// Identity resolved from a verified bearer token, attached to the request
#[derive(Debug, Clone)]
pub struct Actor(pub User);

impl Actor {
    pub fn id(&self) -> UserId {
        self.0.id
    }

    pub fn user(&self) -> &User {
        &self.0
    }
}

/// Routes that skip the guard: registration, login, health and the public reads
pub fn is_public_route(method: &Method, path: &str) -> bool {
    let segments: Vec<&str> = path.trim_matches('/').split('/').collect();
    if method == Method::POST {
        matches!(segments.as_slice(), ["api", "auth", "register" | "login"])
    } else if method == Method::GET {
        matches!(
            segments.as_slice(),
            ["api", "health"] | ["api", "events" | "users"] | ["api", "events" | "users", _]
        )
    } else {
        false
    }
}

/// Resolve the actor for a request.
///
/// 1. Missing header or wrong scheme: `Unauthenticated`
/// 2. Bad signature, expired or malformed payload: `Unauthenticated`
/// 3. Subject not in the identity store: `IdentityNotFound`
pub async fn authenticate(auth_state: &AuthState, headers: &HeaderMap) -> Result<User, AppError> {
    let context = || AuditContext {
        ip_address: extract_ip_address(headers),
        user_agent: extract_user_agent(headers),
        ..Default::default()
    };

    let Some(token) = BearerToken::from_headers(headers) else {
        auth_state.audit_logger.log_auth_event(
            AuthEvent::TokenRejected { reason: "Missing bearer token".to_string() },
            context(),
        );
        return Err(AppError::Unauthenticated(NOT_AUTHORIZED.to_string()));
    };

    let Some(user_id) = auth_state
        .tokens
        .verify_token(token.expose_secret())
        .and_then(|claims| claims.subject())
    else {
        auth_state.audit_logger.log_auth_event(
            AuthEvent::TokenRejected { reason: "Invalid or expired token".to_string() },
            AuditContext { fingerprint: Some(token.fingerprint()), ..context() },
        );
        return Err(AppError::Unauthenticated(NOT_AUTHORIZED.to_string()));
    };

    match auth_state.users.find_by_id(user_id).await? {
        Some(user) => Ok(user),
        None => {
            auth_state.audit_logger.log_auth_event(
                AuthEvent::StaleIdentity,
                AuditContext {
                    user_id: Some(user_id),
                    fingerprint: Some(token.fingerprint()),
                    ..context()
                },
            );
            Err(AppError::IdentityNotFound)
        }
    }
}

/// Guard middleware: rejects the request or inserts the `Actor` extension
pub async fn auth_middleware(
    State(auth_state): State<Arc<AuthState>>,
    mut request: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let user = authenticate(&auth_state, request.headers()).await.map_err(|e| {
        if e.is_unexpected() {
            error!(error = %e, "Identity lookup failed");
        }
        ApiError::from(e)
    })?;

    request.extensions_mut().insert(Actor(user));
    Ok(next.run(request).await)
}

/// Client IP from `X-Forwarded-For` (first hop) or `X-Real-IP`
pub fn extract_ip_address(headers: &HeaderMap) -> Option<String> {
    headers
        .get("X-Forwarded-For")
        .or_else(|| headers.get("X-Real-IP"))
        .and_then(|v| v.to_str().ok())
        .and_then(|s| s.split(',').next())
        .map(|s| s.trim().to_string())
}

pub fn extract_user_agent(headers: &HeaderMap) -> Option<String> {
    headers
        .get("User-Agent")
        .and_then(|v| v.to_str().ok())
        .map(|s| s.to_string())
}
