use std::sync::Arc;

use chrono::Utc;
use jsonwebtoken::{
    decode, encode, errors::ErrorKind, Algorithm, DecodingKey, EncodingKey, Header, Validation,
};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::config::Config;
use crate::error::{AppError, Result};

/// Claims carried by a session token.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Claims {
    /// Subject: the user id.
    pub id: i64,
    /// Issued-at, unix seconds.
    pub iat: i64,
    /// Expires-at, unix seconds.
    pub exp: i64,
}

/// Why a token failed verification.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum TokenError {
    #[error("token has expired")]
    Expired,

    #[error("malformed token: {0}")]
    Malformed(String),
}

impl From<jsonwebtoken::errors::Error> for TokenError {
    fn from(e: jsonwebtoken::errors::Error) -> Self {
        match e.kind() {
            ErrorKind::ExpiredSignature => TokenError::Expired,
            _ => TokenError::Malformed(e.to_string()),
        }
    }
}

struct Keys {
    encoding: EncodingKey,
    decoding: DecodingKey,
    validation: Validation,
    ttl: chrono::Duration,
}

/// Signs and verifies session tokens with the process-wide secret.
#[derive(Clone)]
pub struct TokenKeys {
    inner: Arc<Keys>,
}

impl TokenKeys {
    pub fn new(secret: &[u8], ttl: chrono::Duration) -> Self {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.leeway = 0;

        Self {
            inner: Arc::new(Keys {
                encoding: EncodingKey::from_secret(secret),
                decoding: DecodingKey::from_secret(secret),
                validation,
                ttl,
            }),
        }
    }

    pub fn from_config(config: &Config) -> Self {
        Self::new(config.jwt_secret.as_bytes(), config.token_ttl)
    }

    /// Issues a token for `subject_id` that expires after the configured ttl.
    pub fn issue(&self, subject_id: i64) -> Result<String> {
        let now = Utc::now();
        let expires = now.checked_add_signed(self.inner.ttl).ok_or_else(|| {
            AppError::Internal(format!("token ttl {} overflows the clock", self.inner.ttl))
        })?;
        let claims = Claims {
            id: subject_id,
            iat: now.timestamp(),
            exp: expires.timestamp(),
        };
        self.sign(&claims)
    }

    /// Signs arbitrary claims.
    pub fn sign(&self, claims: &Claims) -> Result<String> {
        encode(&Header::new(Algorithm::HS256), claims, &self.inner.encoding)
            .map_err(|e| AppError::Internal(format!("Token signing failed: {}", e)))
    }

    /// Checks signature and expiry and returns the claims.
    pub fn verify(&self, token: &str) -> std::result::Result<Claims, TokenError> {
        let data = decode::<Claims>(token, &self.inner.decoding, &self.inner.validation)?;
        Ok(data.claims)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn keys() -> TokenKeys {
        TokenKeys::new(b"test-secret", chrono::Duration::days(7))
    }

    #[test]
    fn expired_token_is_reported_as_expired() {
        let keys = keys();
        let now = Utc::now().timestamp();
        let token = keys
            .sign(&Claims {
                id: 7,
                iat: now - 7200,
                exp: now - 3600,
            })
            .unwrap();

        assert_eq!(keys.verify(&token), Err(TokenError::Expired));
    }

    #[test]
    fn token_from_another_secret_is_malformed() {
        let other = TokenKeys::new(b"another-secret", chrono::Duration::days(7));
        let token = other.issue(7).unwrap();

        assert!(matches!(keys().verify(&token), Err(TokenError::Malformed(_))));
    }

    #[test]
    fn garbage_is_malformed() {
        assert!(matches!(keys().verify("not.a.jwt"), Err(TokenError::Malformed(_))));
        assert!(matches!(keys().verify(""), Err(TokenError::Malformed(_))));
    }

    #[test]
    fn issued_token_expires_after_ttl() {
        let keys = TokenKeys::new(b"test-secret", chrono::Duration::hours(12));
        let claims = keys.verify(&keys.issue(1).unwrap()).unwrap();
        assert_eq!(claims.exp - claims.iat, 12 * 3600);
    }

    #[test]
    fn ttl_beyond_the_calendar_is_an_error_not_a_panic() {
        let ttl = chrono::Duration::try_days(100_000_000).unwrap();
        let keys = TokenKeys::new(b"test-secret", ttl);
        assert!(matches!(keys.issue(1), Err(AppError::Internal(_))));
    }

    proptest! {
        #[test]
        fn issue_then_verify_returns_the_subject(id in 1i64..i64::MAX) {
            let keys = keys();
            let token = keys.issue(id).unwrap();
            let claims = keys.verify(&token).unwrap();
            prop_assert_eq!(claims.id, id);
        }
    }
}
