// Credential service: Argon2id password hashing, HS256 bearer tokens

use crate::core::errors::CryptoError;
use crate::core::models::{User, UserId};
use argon2::password_hash::{rand_core::OsRng, PasswordHash, PasswordHasher, PasswordVerifier, SaltString};
use argon2::{Algorithm as Argon2Algorithm, Argon2, Params, Version};
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};
use std::time::{Duration, SystemTime, UNIX_EPOCH};

/// Salted, cost-configurable password hashing
///
/// Hashes are PHC strings (`$argon2id$v=19$m=...,t=...,p=1$salt$hash`), so the
/// parameters travel with each hash and verification never needs the current
/// configuration.
#[derive(Debug, Clone)]
pub struct PasswordHashing {
    params: Params,
}

impl PasswordHashing {
    /// Create a hasher with the given Argon2id memory (KiB) and time cost
    pub fn new(memory_kib: u32, iterations: u32) -> Result<Self, CryptoError> {
        let params = Params::new(memory_kib, iterations, 1, None)
            .map_err(|e| CryptoError::HashingError(format!("Invalid Argon2 parameters: {}", e)))?;
        Ok(Self { params })
    }

    fn argon2(&self) -> Argon2<'static> {
        Argon2::new(Argon2Algorithm::Argon2id, Version::V0x13, self.params.clone())
    }

    /// Hash a password with a fresh random salt
    pub fn hash(&self, password: &str) -> Result<String, CryptoError> {
        let salt = SaltString::generate(&mut OsRng);
        self.argon2()
            .hash_password(password.as_bytes(), &salt)
            .map(|hash| hash.to_string())
            .map_err(|e| CryptoError::HashingError(e.to_string()))
    }

    /// Check a password against a stored PHC hash
    ///
    /// Returns `Ok(false)` on mismatch and `Err` only when the stored hash is malformed.
    pub fn verify(password: &str, hash: &str) -> Result<bool, CryptoError> {
        let parsed = PasswordHash::new(hash).map_err(|e| CryptoError::MalformedHash(e.to_string()))?;
        Ok(Argon2::default()
            .verify_password(password.as_bytes(), &parsed)
            .is_ok())
    }

    /// `hash` on the blocking pool
    pub async fn hash_async(&self, password: String) -> Result<String, CryptoError> {
        let hasher = self.clone();
        tokio::task::spawn_blocking(move || hasher.hash(&password))
            .await
            .map_err(|e| CryptoError::TaskError(e.to_string()))?
    }

    /// `verify` on the blocking pool
    pub async fn verify_async(password: String, hash: String) -> Result<bool, CryptoError> {
        tokio::task::spawn_blocking(move || Self::verify(&password, &hash))
            .await
            .map_err(|e| CryptoError::TaskError(e.to_string()))?
    }
}

/// Compare a login candidate against a user's stored hash
pub async fn match_password(user: &User, candidate: &str) -> Result<bool, CryptoError> {
    PasswordHashing::verify_async(candidate.to_string(), user.password_hash.clone()).await
}

/// Claims carried by a bearer token
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenClaims {
    /// Subject: the user id
    pub sub: String,
    pub iat: u64,
    pub exp: u64,
}

impl TokenClaims {
    pub fn subject(&self) -> Option<UserId> {
        self.sub.parse().ok()
    }
}

/// Signs and verifies bearer tokens with a shared HMAC secret
pub struct TokenSigner {
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    ttl: Duration,
}

impl TokenSigner {
    pub fn new(secret: &SecretString, ttl: Duration) -> Self {
        let bytes = secret.expose_secret().as_bytes();
        Self {
            encoding_key: EncodingKey::from_secret(bytes),
            decoding_key: DecodingKey::from_secret(bytes),
            ttl,
        }
    }

    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    /// Issue a token for `user_id` expiring after the configured lifetime
    pub fn issue_token(&self, user_id: UserId) -> Result<String, CryptoError> {
        let now = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map_err(|e| CryptoError::SigningError(format!("System time error: {}", e)))?
            .as_secs();

        let exp = now
            .checked_add(self.ttl.as_secs())
            .ok_or_else(|| CryptoError::SigningError("Token lifetime overflows expiry".to_string()))?;

        self.sign(&TokenClaims {
            sub: user_id.to_string(),
            iat: now,
            exp,
        })
    }

    /// Sign arbitrary claims; expiry is covered by the signature
    pub fn sign(&self, claims: &TokenClaims) -> Result<String, CryptoError> {
        encode(&Header::new(Algorithm::HS256), claims, &self.encoding_key)
            .map_err(|e| CryptoError::SigningError(e.to_string()))
    }

    /// Verify signature and expiry; `None` on any failure
    pub fn verify_token(&self, token: &str) -> Option<TokenClaims> {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.leeway = 0;
        validation.set_required_spec_claims(&["exp", "sub"]);

        decode::<TokenClaims>(token, &self.decoding_key, &validation)
            .map(|data| data.claims)
            .ok()
    }
}

/// Longest accepted token lifetime (10 years)
pub const MAX_TTL_SECS: u64 = 10 * 365 * 24 * 60 * 60;

/// Parse a token lifetime such as `30d`, `12h`, `45m`, `90s` or bare seconds
pub fn parse_ttl(raw: &str) -> Result<Duration, String> {
    let raw = raw.trim();
    let (digits, unit) = match raw.char_indices().last() {
        Some((idx, c)) if c.is_ascii_alphabetic() => (&raw[..idx], Some(c)),
        _ => (raw, None),
    };

    let value = digits
        .parse::<u64>()
        .map_err(|e| format!("Invalid duration '{}': {}", raw, e))?;

    let multiplier: u64 = match unit {
        None | Some('s') => 1,
        Some('m') => 60,
        Some('h') => 60 * 60,
        Some('d') => 60 * 60 * 24,
        Some(other) => return Err(format!("Invalid duration unit '{}' in '{}'", other, raw)),
    };
    let seconds = value
        .checked_mul(multiplier)
        .filter(|s| *s <= MAX_TTL_SECS)
        .ok_or_else(|| format!("Duration '{}' exceeds the maximum of {}s", raw, MAX_TTL_SECS))?;

    if seconds == 0 {
        return Err(format!("Duration '{}' must be greater than 0", raw));
    }

    Ok(Duration::from_secs(seconds))
}
