// Configuration management

use crate::core::crypto::parse_ttl;
use crate::core::errors::AppError;
use secrecy::{ExposeSecret, Secret, SecretString};
use std::env;
use std::time::Duration;

/// Application configuration loaded from environment variables
///
/// Without `DATABASE_URL` the service runs on the in-memory store.
#[derive(Debug)]
pub struct Config {
    // Server configuration
    pub bind_address: String,
    pub port: u16,

    // Database configuration (optional)
    pub database_url: Option<String>,
    pub database_max_connections: u32,

    // Credential configuration
    pub jwt_secret: SecretString,
    pub jwt_expire: Duration,
    pub password_hash_memory_kib: u32,
    pub password_hash_iterations: u32,

    // Middleware configuration
    pub request_timeout_secs: u64,
    pub body_size_limit_bytes: usize,

    // Logging configuration
    pub log_level: String,
    pub log_format: String, // "json" or "text"
}

impl Config {
    /// Load configuration from environment variables
    ///
    /// Supports `.env` file loading in development (via dotenv crate).
    pub fn from_env() -> Result<Self, AppError> {
        #[cfg(not(test))]
        {
            dotenv::dotenv().ok();
        }

        let config = Self {
            bind_address: Self::get_env_or_default("BIND_ADDRESS", "0.0.0.0"),
            port: Self::parse_port()?,
            database_url: Self::get_optional_env("DATABASE_URL"),
            database_max_connections: Self::parse_or_default("DATABASE_MAX_CONNECTIONS", 10u32)?,
            jwt_secret: Self::get_required_secret("JWT_SECRET")?,
            jwt_expire: Self::parse_duration_or_default("JWT_EXPIRE", "30d")?,
            password_hash_memory_kib: Self::parse_or_default("PASSWORD_HASH_MEMORY_KIB", 19_456u32)?,
            password_hash_iterations: Self::parse_or_default("PASSWORD_HASH_ITERATIONS", 2u32)?,
            request_timeout_secs: Self::parse_or_default("REQUEST_TIMEOUT_SECS", 30u64)?,
            body_size_limit_bytes: Self::parse_or_default("BODY_SIZE_LIMIT_BYTES", 2 * 1024 * 1024usize)?,
            log_level: Self::get_env_or_default("LOG_LEVEL", "info"),
            log_format: Self::get_env_or_default("LOG_FORMAT", "json"),
        };

        config.validate()?;

        Ok(config)
    }

    fn get_env_or_default(key: &str, default: &str) -> String {
        env::var(key).unwrap_or_else(|_| default.to_string())
    }

    fn get_optional_env(key: &str) -> Option<String> {
        match env::var(key) {
            Ok(value) if !value.trim().is_empty() => Some(value),
            _ => None,
        }
    }

    fn get_required_secret(key: &str) -> Result<SecretString, AppError> {
        let value = env::var(key)
            .map_err(|_| AppError::Configuration(format!("{} not set", key)))?;

        if value.trim().is_empty() {
            return Err(AppError::Configuration(format!("{} is empty", key)));
        }

        Ok(Secret::new(value))
    }

    /// Parse port from PORT environment variable
    fn parse_port() -> Result<u16, AppError> {
        let port_str = env::var("PORT").unwrap_or_else(|_| "5000".to_string());
        let port = port_str.parse::<u16>().map_err(|e| {
            AppError::Configuration(format!("Invalid PORT value '{}': {}", port_str, e))
        })?;

        if port == 0 {
            return Err(AppError::Configuration(
                "PORT must be between 1 and 65535".to_string(),
            ));
        }

        Ok(port)
    }

    /// Parse a positive number from an environment variable or return the default
    fn parse_or_default<T>(key: &str, default: T) -> Result<T, AppError>
    where
        T: std::str::FromStr + PartialEq + Default,
        T::Err: std::fmt::Display,
    {
        match env::var(key) {
            Ok(value) => {
                let parsed = value.trim().parse::<T>().map_err(|e| {
                    AppError::Configuration(format!("Invalid {} value '{}': {}", key, value, e))
                })?;

                if parsed == T::default() {
                    return Err(AppError::Configuration(format!(
                        "{} must be greater than 0",
                        key
                    )));
                }

                Ok(parsed)
            }
            _ => Ok(default),
        }
    }

    fn parse_duration_or_default(key: &str, default: &str) -> Result<Duration, AppError> {
        let raw = Self::get_env_or_default(key, default);
        parse_ttl(&raw).map_err(|e| AppError::Configuration(format!("Invalid {}: {}", key, e)))
    }

    /// Validate all configuration values
    pub fn validate(&self) -> Result<(), AppError> {
        if self.port == 0 {
            return Err(AppError::Configuration(format!(
                "Invalid PORT value '{}': must be between 1 and 65535",
                self.port
            )));
        }

        if self.jwt_secret.expose_secret().trim().is_empty() {
            return Err(AppError::Configuration("JWT_SECRET is empty".to_string()));
        }

        if let Some(ref url) = self.database_url {
            Self::validate_url(url, "Database URL")?;
        }

        Self::validate_log_level(&self.log_level)?;
        Self::validate_log_format(&self.log_format)?;

        Ok(())
    }

    /// Validate URL format
    fn validate_url(url: &str, description: &str) -> Result<(), AppError> {
        let parsed = url::Url::parse(url).map_err(|e| {
            AppError::Configuration(format!("Invalid {} '{}': {}", description, redact_url(url), e))
        })?;

        match parsed.scheme() {
            "postgres" | "postgresql" => Ok(()),
            other => Err(AppError::Configuration(format!(
                "Invalid {} scheme '{}': expected postgres or postgresql",
                description, other
            ))),
        }
    }

    /// Validate log level
    fn validate_log_level(level: &str) -> Result<(), AppError> {
        let valid_levels = ["trace", "debug", "info", "warn", "error"];
        if !valid_levels.contains(&level.to_lowercase().as_str()) {
            return Err(AppError::Configuration(format!(
                "Invalid LOG_LEVEL '{}': must be one of {}",
                level,
                valid_levels.join(", ")
            )));
        }
        Ok(())
    }

    /// Validate log format
    fn validate_log_format(format: &str) -> Result<(), AppError> {
        if format != "json" && format != "text" {
            return Err(AppError::Configuration(format!(
                "Invalid LOG_FORMAT '{}': must be 'json' or 'text'",
                format
            )));
        }
        Ok(())
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }
}

/// Drop the password from a connection URL before it reaches a log line
pub fn redact_url(raw: &str) -> String {
    match url::Url::parse(raw) {
        Ok(mut parsed) if parsed.password().is_some() => {
            let _ = parsed.set_password(Some("***"));
            parsed.to_string()
        }
        Ok(parsed) => parsed.to_string(),
        Err(_) => "<unparseable>".to_string(),
    }
}

impl Config {
    /// Configuration for tests: in-memory store, cheap password hashing
    pub fn test_config() -> Self {
        Self {
            bind_address: "127.0.0.1".to_string(),
            port: 5000,
            database_url: None,
            database_max_connections: 10,
            jwt_secret: Secret::new("test-jwt-secret".to_string()),
            jwt_expire: Duration::from_secs(30 * 24 * 60 * 60),
            password_hash_memory_kib: 1024,
            password_hash_iterations: 1,
            request_timeout_secs: 30,
            body_size_limit_bytes: 2 * 1024 * 1024,
            log_level: "info".to_string(),
            log_format: "json".to_string(),
        }
    }
}
