//! Access Tokens
//!
//! HS256 tokens carrying the caller's numeric user id.

use chrono::{TimeDelta, Utc};
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::domain::CallerId;

/// Claims written into every access token
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AccessTokenClaims {
    pub user_id: i32,
    pub username: String,
    /// Expiration time (Unix timestamp)
    pub exp: i64,
    /// Issued at (Unix timestamp)
    pub iat: i64,
}

/// Token issue and verification failures
#[derive(Debug, thiserror::Error)]
pub enum TokenError {
    #[error("failed to encode access token: {0}")]
    Encode(jsonwebtoken::errors::Error),

    #[error("access token rejected: {0}")]
    Invalid(jsonwebtoken::errors::Error),

    #[error("access token has no user_id claim")]
    MissingUserId,

    #[error("user_id claim is not an integer: {0}")]
    MalformedUserId(Value),

    #[error("token lifetime of {0} hours is out of range")]
    Lifetime(i64),
}

impl TokenError {
    /// A verified token whose identity claim cannot be read points at an
    /// issuer/verifier mismatch, not at a bad client.
    pub fn is_internal(&self) -> bool {
        matches!(
            self,
            TokenError::Encode(_) | TokenError::MalformedUserId(_) | TokenError::Lifetime(_)
        )
    }
}

/// Issues and verifies access tokens with a shared secret
#[derive(Clone)]
pub struct TokenService {
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    ttl_hours: i64,
}

impl TokenService {
    pub fn new(secret: &str, ttl_hours: i64) -> Self {
        Self {
            encoding_key: EncodingKey::from_secret(secret.as_bytes()),
            decoding_key: DecodingKey::from_secret(secret.as_bytes()),
            ttl_hours,
        }
    }

    /// Generate an access token for a user
    pub fn issue(&self, user_id: i32, username: &str) -> Result<String, TokenError> {
        let now = Utc::now();
        let expires_at = TimeDelta::try_hours(self.ttl_hours)
            .and_then(|ttl| now.checked_add_signed(ttl))
            .ok_or(TokenError::Lifetime(self.ttl_hours))?;

        let claims = AccessTokenClaims {
            user_id,
            username: username.to_string(),
            exp: expires_at.timestamp(),
            iat: now.timestamp(),
        };

        self.sign(&claims)
    }

    /// Verify signature and expiry, then read the caller id.
    pub fn verify(&self, token: &str) -> Result<CallerId, TokenError> {
        let validation = Validation::new(Algorithm::HS256);
        let data = decode::<Map<String, Value>>(token, &self.decoding_key, &validation)
            .map_err(TokenError::Invalid)?;

        let user_id = data
            .claims
            .get("user_id")
            .ok_or(TokenError::MissingUserId)?;

        user_id_from_claim(user_id)
            .map(CallerId::new)
            .ok_or_else(|| TokenError::MalformedUserId(user_id.clone()))
    }

    fn sign<T: Serialize>(&self, claims: &T) -> Result<String, TokenError> {
        encode(&Header::new(Algorithm::HS256), claims, &self.encoding_key)
            .map_err(TokenError::Encode)
    }
}

/// Accept integral JSON numbers only; `7.0` is fine, `7.5` or `"7"` is not.
fn user_id_from_claim(value: &Value) -> Option<i32> {
    let Value::Number(number) = value else {
        return None;
    };
    if let Some(n) = number.as_i64() {
        return i32::try_from(n).ok();
    }

    let f = number.as_f64()?;
    if f.fract() == 0.0 && f >= f64::from(i32::MIN) && f <= f64::from(i32::MAX) {
        Some(f as i32)
    } else {
        None
    }
}
