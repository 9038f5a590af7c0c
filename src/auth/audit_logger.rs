// Authentication event logging

use crate::auth::bearer::TokenFingerprint;
use crate::core::models::UserId;
use sqlx::PgPool;
use tracing::{info, warn};

/// Authentication event type
#[derive(Debug, Clone, PartialEq)]
pub enum AuthEvent {
    Registered,
    LoginSuccess,
    LoginFailure { reason: String },
    TokenRejected { reason: String },
    /// Valid token whose subject no longer exists
    StaleIdentity,
}

impl AuthEvent {
    pub fn event_type(&self) -> &'static str {
        match self {
            AuthEvent::Registered => "REGISTERED",
            AuthEvent::LoginSuccess => "LOGIN_SUCCESS",
            AuthEvent::LoginFailure { .. } => "LOGIN_FAILURE",
            AuthEvent::TokenRejected { .. } => "TOKEN_REJECTED",
            AuthEvent::StaleIdentity => "STALE_IDENTITY",
        }
    }

    fn details(&self) -> Option<&str> {
        match self {
            AuthEvent::LoginFailure { reason } | AuthEvent::TokenRejected { reason } => {
                Some(reason)
            }
            _ => None,
        }
    }
}

/// Who and where an auth event came from
#[derive(Debug, Clone, Default)]
pub struct AuditContext {
    pub user_id: Option<UserId>,
    pub fingerprint: Option<TokenFingerprint>,
    pub ip_address: Option<String>,
    pub user_agent: Option<String>,
}

/// Audit logger for authentication events
pub struct AuditLogger {
    db_pool: Option<PgPool>,
}

impl AuditLogger {
    /// Without a pool only structured logging is emitted
    pub fn new(db_pool: Option<PgPool>) -> Self {
        Self { db_pool }
    }

    /// Fire-and-forget: spawns a task and never affects the request
    pub fn log_auth_event(&self, event: AuthEvent, context: AuditContext) {
        let db_pool = self.db_pool.clone();

        tokio::spawn(async move {
            let user_id = context.user_id.map(|id| id.to_string());
            let fingerprint = context.fingerprint.as_ref().map(|f| f.to_string());

            match event {
                AuthEvent::Registered | AuthEvent::LoginSuccess => {
                    info!(
                        event_type = event.event_type(),
                        user_id = ?user_id,
                        ip_address = ?context.ip_address,
                        user_agent = ?context.user_agent,
                        "Authentication event"
                    );
                }
                _ => {
                    warn!(
                        event_type = event.event_type(),
                        user_id = ?user_id,
                        token_fingerprint = ?fingerprint,
                        ip_address = ?context.ip_address,
                        user_agent = ?context.user_agent,
                        reason = ?event.details(),
                        "Authentication rejected"
                    );
                }
            }

            if let Some(pool) = db_pool {
                if let Err(e) = sqlx::query(
                    "INSERT INTO auth_audit_log \
                        (event_type, user_id, token_fingerprint, ip_address, user_agent, details) \
                     VALUES ($1, $2, $3, $4, $5, $6)",
                )
                .bind(event.event_type())
                .bind(context.user_id.map(|id| *id.as_uuid()))
                .bind(&fingerprint)
                .bind(&context.ip_address)
                .bind(&context.user_agent)
                .bind(event.details())
                .execute(&pool)
                .await
                {
                    warn!(error = %e, "Failed to write audit log to database");
                }
            }
        });
    }
}
