//! Bearer-token authentication.
//!
//! Tokens are self-contained HS256 JWTs carrying the user identity, so
//! verification needs no store lookup. There is no revocation or refresh: a
//! token stays valid until its expiry passes.

use axum::{
    async_trait,
    body::Body,
    extract::{FromRequestParts, State},
    http::{request::Parts, HeaderMap, Request},
    middleware::Next,
    response::Response,
};
use chrono::{Duration, Utc};
use jsonwebtoken::{
    decode, encode, errors::ErrorKind, Algorithm, DecodingKey, EncodingKey, Header, Validation,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use thiserror::Error;

use crate::api::error::ApiError;
use crate::AppState;

/// JWT claims embedded in every issued token
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    /// Subject - the user id
    pub sub: String,
    /// Email at issue time
    pub email: String,
    /// Issued at (Unix timestamp)
    pub iat: i64,
    /// Expiration time (Unix timestamp)
    pub exp: i64,
}

#[derive(Debug, Error)]
pub enum TokenError {
    #[error("token has expired")]
    Expired,
    #[error("token is invalid")]
    Invalid,
    #[error("failed to sign token")]
    Signing(#[from] jsonwebtoken::errors::Error),
}

/// Issues and verifies signed bearer tokens.
pub struct TokenService {
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    validation: Validation,
    ttl: Duration,
}

impl TokenService {
    pub fn new(secret: &str, ttl_secs: u64) -> Self {
        let mut validation = Validation::new(Algorithm::HS256);
        // No leeway so expiry behaves the same under test clocks
        validation.leeway = 0;
        Self {
            encoding_key: EncodingKey::from_secret(secret.as_bytes()),
            decoding_key: DecodingKey::from_secret(secret.as_bytes()),
            validation,
            ttl: Duration::seconds(ttl_secs as i64),
        }
    }

    /// Sign a token for the given user identity, valid for the configured
    /// lifetime.
    pub fn issue(&self, user_id: &str, email: &str) -> Result<String, TokenError> {
        let now = Utc::now();
        let claims = Claims {
            sub: user_id.to_string(),
            email: email.to_string(),
            iat: now.timestamp(),
            exp: (now + self.ttl).timestamp(),
        };
        Ok(encode(
            &Header::new(Algorithm::HS256),
            &claims,
            &self.encoding_key,
        )?)
    }

    /// Check signature and expiry, returning the embedded claims on success.
    pub fn verify(&self, token: &str) -> Result<Claims, TokenError> {
        decode::<Claims>(token, &self.decoding_key, &self.validation)
            .map(|data| data.claims)
            .map_err(|err| match err.kind() {
                ErrorKind::ExpiredSignature => TokenError::Expired,
                _ => TokenError::Invalid,
            })
    }
}

/// The authenticated identity attached to a request by [`auth_middleware`]
#[derive(Debug, Clone)]
pub struct AuthUser {
    pub id: String,
    pub email: String,
}

/// Extract the bearer token from request headers.
///
/// The scheme must be exactly `Bearer <token>`; anything else counts as a
/// missing token. Whatever follows the prefix is returned unchecked and left
/// for verification to reject.
fn extract_token(headers: &HeaderMap) -> Option<String> {
    headers
        .get("Authorization")
        .and_then(|h| h.to_str().ok())
        .and_then(|h| h.strip_prefix("Bearer "))
        .map(|token| token.to_string())
}

/// Auth middleware guarding the protected routes.
///
/// Verification failures collapse into a single 401 message; callers cannot
/// distinguish a bad signature from an expired token.
pub async fn auth_middleware(
    State(state): State<Arc<AppState>>,
    mut request: Request<Body>,
    next: Next,
) -> Result<Response, ApiError> {
    let token = extract_token(request.headers())
        .ok_or_else(|| ApiError::unauthorized("Unauthorized - Token missing"))?;

    let claims = state
        .tokens
        .verify(&token)
        .map_err(|_| ApiError::unauthorized("Unauthorized - Invalid token"))?;

    request.extensions_mut().insert(AuthUser {
        id: claims.sub,
        email: claims.email,
    });

    Ok(next.run(request).await)
}

/// Extractor for the identity the middleware attached. Rejects when a handler
/// is reached without passing the guard.
#[async_trait]
impl FromRequestParts<Arc<AppState>> for AuthUser {
    type Rejection = ApiError;

    async fn from_request_parts(
        parts: &mut Parts,
        _state: &Arc<AppState>,
    ) -> Result<Self, Self::Rejection> {
        parts
            .extensions
            .get::<AuthUser>()
            .cloned()
            .ok_or_else(|| ApiError::unauthorized("Unauthorized - Token missing"))
    }
}
