//! Signed bearer tokens (HS256 JWT) identifying a user.

use chrono::{Duration, Utc};
use jsonwebtoken::errors::ErrorKind;
use jsonwebtoken::{Algorithm, DecodingKey, EncodingKey, Header, Validation, decode, encode};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Errors that can occur during token operations.
#[derive(Debug, thiserror::Error)]
pub enum TokenError {
    #[error("token secret is not valid hex: {0}")]
    InvalidSecret(#[from] hex::FromHexError),

    #[error("token secret is empty")]
    EmptySecret,

    #[error("failed to sign token: {0}")]
    Encode(jsonwebtoken::errors::Error),

    #[error("token has expired")]
    Expired,

    #[error("invalid token: {0}")]
    Invalid(String),
}

/// Configuration for token signing and validation.
#[derive(Debug, Clone)]
pub struct TokenConfig {
    /// The HMAC secret key bytes.
    pub secret: Vec<u8>,
    /// Lifetime of issued tokens.
    pub expire_minutes: i64,
}

impl TokenConfig {
    pub const DEFAULT_EXPIRE_MINUTES: i64 = 30;

    pub fn new(secret: Vec<u8>, expire_minutes: i64) -> Self {
        Self {
            secret,
            expire_minutes,
        }
    }

    /// Build a config from a hex-encoded secret (as written by `fitforge init`).
    pub fn from_hex(secret_hex: &str, expire_minutes: i64) -> Result<Self, TokenError> {
        let secret = hex::decode(secret_hex.trim())?;
        if secret.is_empty() {
            return Err(TokenError::EmptySecret);
        }
        Ok(Self::new(secret, expire_minutes))
    }
}

/// JWT payload.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Claims {
    /// User ID.
    pub sub: String,
    pub iat: i64,
    pub exp: i64,
}

/// Issue a token for `user_id` that expires after the configured lifetime.
pub fn issue_token(config: &TokenConfig, user_id: Uuid) -> Result<String, TokenError> {
    let now = Utc::now();
    let claims = Claims {
        sub: user_id.to_string(),
        iat: now.timestamp(),
        exp: (now + Duration::minutes(config.expire_minutes)).timestamp(),
    };

    encode(
        &Header::new(Algorithm::HS256),
        &claims,
        &EncodingKey::from_secret(&config.secret),
    )
    .map_err(TokenError::Encode)
}

/// Verify signature and expiry, returning the user ID the token was issued for.
pub fn validate_token(config: &TokenConfig, token: &str) -> Result<Uuid, TokenError> {
    let validation = Validation::new(Algorithm::HS256);
    let data = decode::<Claims>(token, &DecodingKey::from_secret(&config.secret), &validation)
        .map_err(|e| match e.kind() {
            ErrorKind::ExpiredSignature => TokenError::Expired,
            _ => TokenError::Invalid(e.to_string()),
        })?;

    Uuid::parse_str(&data.claims.sub)
        .map_err(|_| TokenError::Invalid(format!("subject is not a user id: {}", data.claims.sub)))
}
