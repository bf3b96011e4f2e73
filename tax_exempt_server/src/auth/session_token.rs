//! Session token verification.
//!
//! Storefront UI extensions attach a session token minted by Shopify as an `Authorization: Bearer <token>` header.
//! The token is an HS256 JWT signed with the app's secret. Its subject is the GID of the customer using the
//! extension.
use chrono::{DateTime, Duration, Utc};
use jwt_compact::{
    alg::{Hs256, Hs256Key},
    AlgorithmExt,
    Claims,
    TimeOptions,
    Token,
    UntrustedToken,
};
use log::debug;
use serde::{Deserialize, Serialize};
use txe_common::Secret;

use crate::errors::AuthError;

pub const SESSION_TOKEN_ALGORITHM: &str = "HS256";

/// The custom claims we read from a session token. Anything else Shopify puts in the token is ignored.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionTokenClaims {
    pub sub: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionClaims {
    pub subject: String,
    pub expiry: DateTime<Utc>,
    pub issued_at: Option<DateTime<Utc>>,
    pub algorithm: String,
}

#[derive(Clone, Debug)]
pub struct SessionTokenVerifier {
    secret: Secret<String>,
    leeway: Duration,
}

impl SessionTokenVerifier {
    pub fn new(secret: Secret<String>, leeway: Duration) -> Self {
        Self { secret, leeway }
    }

    /// Verifies the value of an `Authorization` header. Any failure results in `None`; the reason is only logged.
    pub fn verify(&self, authorization: &str, now: DateTime<Utc>) -> Option<SessionClaims> {
        let result = bearer_token(authorization)
            .ok_or(AuthError::NotABearerToken)
            .and_then(|token| check_session_token(token, &self.secret, self.leeway, now));
        match result {
            Ok(claims) => Some(claims),
            Err(e) => {
                debug!("🔐️ Session token rejected. {e}");
                None
            },
        }
    }
}

/// Extracts the token from a `Bearer <token>` header value. The scheme is case-insensitive.
pub fn bearer_token(authorization: &str) -> Option<&str> {
    let (scheme, token) = authorization.trim().split_once(' ')?;
    let token = token.trim();
    (scheme.eq_ignore_ascii_case("bearer") && !token.is_empty()).then_some(token)
}

pub fn check_session_token(
    token: &str,
    secret: &Secret<String>,
    leeway: Duration,
    now: DateTime<Utc>,
) -> Result<SessionClaims, AuthError> {
    let untrusted_token = UntrustedToken::new(token).map_err(|e| AuthError::PoorlyFormattedToken(e.to_string()))?;
    let algorithm = untrusted_token.algorithm().to_string();
    if algorithm != SESSION_TOKEN_ALGORITHM {
        return Err(AuthError::UnsupportedAlgorithm(algorithm));
    }
    let key = Hs256Key::new(secret.as_bytes());
    let token: Token<SessionTokenClaims> = Hs256
        .validator(&key)
        .validate(&untrusted_token)
        .map_err(|e| AuthError::ValidationError(e.to_string()))?;
    let time_options = TimeOptions::new(leeway, move || now);
    let claims: &Claims<SessionTokenClaims> = token.claims();
    claims.validate_expiration(&time_options).map_err(|e| AuthError::ExpiredToken(e.to_string()))?;
    let expiry = claims.expiration.ok_or_else(|| AuthError::ExpiredToken("Token has no expiry".into()))?;
    Ok(SessionClaims {
        subject: claims.custom.sub.clone(),
        expiry,
        issued_at: claims.issued_at,
        algorithm,
    })
}
