// Domain error types - classified locally, rendered at the HTTP boundary

use thiserror::Error;

/// Main error type for the events service
#[derive(Error, Debug)]
pub enum AppError {
    /// Missing or malformed input (HTTP 400)
    #[error("Validation error: {0}")]
    Validation(String),

    /// Missing, invalid or expired bearer token (HTTP 401)
    #[error("Unauthenticated: {0}")]
    Unauthenticated(String),

    /// Token verified but its subject no longer exists (HTTP 404)
    #[error("Identity not found")]
    IdentityNotFound,

    /// Authenticated but not the owner of the resource (HTTP 403)
    #[error("Forbidden: {0}")]
    Forbidden(String),

    /// Resource absent (HTTP 404)
    #[error("Not found: {0}")]
    NotFound(String),

    /// Uniqueness constraint hit (HTTP 400)
    #[error("Already exists: {0}")]
    AlreadyExists(String),

    /// Cryptographic error (HTTP 500)
    #[error("Cryptographic error: {0}")]
    Crypto(#[from] CryptoError),

    /// Store failure (HTTP 500)
    #[error("Store error: {0}")]
    Store(String),

    /// Configuration error (HTTP 500)
    #[error("Configuration error: {0}")]
    Configuration(String),
}

/// Credential operation errors
#[derive(Error, Debug)]
pub enum CryptoError {
    /// Failed to hash a password
    #[error("Failed to hash password: {0}")]
    HashingError(String),

    /// Stored password hash could not be parsed
    #[error("Malformed password hash: {0}")]
    MalformedHash(String),

    /// Failed to sign token
    #[error("Failed to sign token: {0}")]
    SigningError(String),

    /// Blocking task running the hash was cancelled or panicked
    #[error("Credential task failed: {0}")]
    TaskError(String),
}

impl AppError {
    /// Get HTTP status code for this error
    pub fn status_code(&self) -> u16 {
        match self {
            AppError::Validation(_) => 400,
            AppError::Unauthenticated(_) => 401,
            AppError::IdentityNotFound => 404,
            AppError::Forbidden(_) => 403,
            AppError::NotFound(_) => 404,
            AppError::AlreadyExists(_) => 400,
            AppError::Crypto(_) => 500,
            AppError::Store(_) => 500,
            AppError::Configuration(_) => 500,
        }
    }

    /// Get user-facing error message (no internal detail for server errors)
    pub fn user_message(&self) -> String {
        match self {
            AppError::Validation(msg) => msg.clone(),
            AppError::Unauthenticated(msg) => msg.clone(),
            AppError::IdentityNotFound => "User not found".to_string(),
            AppError::Forbidden(msg) => msg.clone(),
            AppError::NotFound(msg) => msg.clone(),
            AppError::AlreadyExists(msg) => msg.clone(),
            AppError::Crypto(_) => "Internal server error".to_string(),
            AppError::Store(_) => "Internal server error".to_string(),
            AppError::Configuration(_) => "Internal server error".to_string(),
        }
    }

    /// True for errors that indicate a server-side failure rather than a client mistake
    pub fn is_unexpected(&self) -> bool {
        self.status_code() >= 500
    }
}

impl From<sqlx::Error> for AppError {
    fn from(err: sqlx::Error) -> Self {
        if let Some(db_err) = err.as_database_error() {
            if db_err.is_unique_violation() {
                return AppError::AlreadyExists("Resource already exists".to_string());
            }
        }
        AppError::Store(err.to_string())
    }
}
