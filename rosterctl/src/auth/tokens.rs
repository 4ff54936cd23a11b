//! JWT access and refresh token creation and verification.
//!
//! Both token kinds are HS256-signed with the configured secret and carry a
//! `kind` claim, so a refresh token can never be presented where an access
//! token is expected or vice versa. Verification is pure: it checks the
//! signature and expiry only, never persisted state. The persisted cross-check
//! for refresh tokens happens at the store boundary, during rotation.

use chrono::Utc;
use jsonwebtoken::{DecodingKey, EncodingKey, Header, Validation, decode, encode};
use serde::{Deserialize, Serialize};
use std::time::Duration;
use uuid::Uuid;

use crate::{config::Config, errors::Error, types::UserId};

/// Discriminates the two token kinds inside the signed claims.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TokenKind {
    Access,
    Refresh,
}

/// Signed JWT claims
#[derive(Debug, Serialize, Deserialize)]
pub struct TokenClaims {
    pub sub: UserId,     // Subject (user ID)
    pub kind: TokenKind, // Access or refresh
    pub jti: Uuid,       // Unique token id; two issuances are never byte-equal
    pub exp: i64,        // Expiration time
    pub iat: i64,        // Issued at
}

impl TokenClaims {
    fn new(user_id: UserId, kind: TokenKind, expiry: Duration) -> Self {
        let now = Utc::now();
        let exp = now + chrono::Duration::from_std(expiry).unwrap_or(chrono::Duration::minutes(15));

        Self {
            sub: user_id,
            kind,
            jti: Uuid::new_v4(),
            exp: exp.timestamp(),
            iat: now.timestamp(),
        }
    }
}

fn secret_key(config: &Config) -> Result<&str, Error> {
    config.secret_key.as_deref().ok_or_else(|| Error::Internal {
        operation: "sign JWT: secret_key is required".to_string(),
    })
}

fn sign(user_id: UserId, kind: TokenKind, expiry: Duration, config: &Config) -> Result<String, Error> {
    let claims = TokenClaims::new(user_id, kind, expiry);
    let key = EncodingKey::from_secret(secret_key(config)?.as_bytes());
    encode(&Header::default(), &claims, &key).map_err(|e| Error::Internal {
        operation: format!("create JWT: {e}"),
    })
}

/// Create a short-lived access token for a user. Pure computation, no side effects.
pub fn create_access_token(user_id: UserId, config: &Config) -> Result<String, Error> {
    sign(user_id, TokenKind::Access, config.auth.access_token_expiry, config)
}

/// Create a refresh token for a user. The caller is responsible for
/// persisting it on the user record.
pub fn create_refresh_token(user_id: UserId, config: &Config) -> Result<String, Error> {
    sign(user_id, TokenKind::Refresh, config.auth.refresh_token_expiry, config)
}

/// Verify a token of the expected kind and return the user id it names.
///
/// Fails with [`Error::InvalidToken`] on a bad signature, expiry, malformed
/// input, or kind mismatch. Key-level problems are server faults and map to
/// [`Error::Internal`] instead.
pub fn verify_token(token: &str, expected: TokenKind, config: &Config) -> Result<UserId, Error> {
    let key = DecodingKey::from_secret(secret_key(config)?.as_bytes());
    let validation = Validation::default();

    let token_data = decode::<TokenClaims>(token, &key, &validation).map_err(|e| match e.kind() {
        // Client errors - malformed tokens, invalid claims, expired tokens
        jsonwebtoken::errors::ErrorKind::InvalidToken
        | jsonwebtoken::errors::ErrorKind::InvalidSignature
        | jsonwebtoken::errors::ErrorKind::ExpiredSignature
        | jsonwebtoken::errors::ErrorKind::MissingRequiredClaim(_)
        | jsonwebtoken::errors::ErrorKind::InvalidIssuer
        | jsonwebtoken::errors::ErrorKind::InvalidAudience
        | jsonwebtoken::errors::ErrorKind::InvalidSubject
        | jsonwebtoken::errors::ErrorKind::ImmatureSignature
        | jsonwebtoken::errors::ErrorKind::Base64(_)
        | jsonwebtoken::errors::ErrorKind::Json(_)
        | jsonwebtoken::errors::ErrorKind::Utf8(_)
        | jsonwebtoken::errors::ErrorKind::InvalidAlgorithm => Error::InvalidToken,

        // Server errors - key issues, internal failures
        jsonwebtoken::errors::ErrorKind::InvalidEcdsaKey
        | jsonwebtoken::errors::ErrorKind::InvalidRsaKey(_)
        | jsonwebtoken::errors::ErrorKind::RsaFailedSigning
        | jsonwebtoken::errors::ErrorKind::InvalidAlgorithmName
        | jsonwebtoken::errors::ErrorKind::InvalidKeyFormat
        | jsonwebtoken::errors::ErrorKind::MissingAlgorithm
        | jsonwebtoken::errors::ErrorKind::Crypto(_) => Error::Internal {
            operation: format!("JWT verification: {e}"),
        },

        // Catch-all for any future error variants (default to server error for safety)
        _ => Error::Internal {
            operation: format!("JWT verification (unknown error): {e}"),
        },
    })?;

    if token_data.claims.kind != expected {
        return Err(Error::InvalidToken);
    }

    Ok(token_data.claims.sub)
}
