use argon2::{
    password_hash::{rand_core::OsRng, PasswordHash, PasswordHasher, PasswordVerifier, SaltString},
    Argon2,
};
use axum::{
    extract::{rejection::JsonRejection, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use serde::Deserialize;
use std::sync::Arc;

use crate::AppState;

use super::error::ApiError;
use super::MessageResponse;

/// Display name assigned at registration until the user picks one
const DEFAULT_USER_NAME: &str = "New User";

#[derive(Debug, Deserialize)]
pub struct RegisterRequest {
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub password: String,
}

#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub password: String,
}

#[derive(Debug, serde::Serialize)]
pub struct LoginResponse {
    pub success: bool,
    pub token: String,
}

/// Hash a password using Argon2
pub fn hash_password(password: &str) -> Result<String, argon2::password_hash::Error> {
    let salt = SaltString::generate(&mut OsRng);
    let argon2 = Argon2::default();
    let hash = argon2.hash_password(password.as_bytes(), &salt)?;
    Ok(hash.to_string())
}

/// Verify a password against a hash
pub fn verify_password(password: &str, hash: &str) -> bool {
    let parsed_hash = match PasswordHash::new(hash) {
        Ok(h) => h,
        Err(_) => return false,
    };
    Argon2::default()
        .verify_password(password.as_bytes(), &parsed_hash)
        .is_ok()
}

/// Register endpoint
pub async fn register(
    State(state): State<Arc<AppState>>,
    payload: Result<Json<RegisterRequest>, JsonRejection>,
) -> Result<impl IntoResponse, ApiError> {
    let Json(request) = payload?;

    // Presence is the only rule; email format is not checked
    if request.email.is_empty() || request.password.is_empty() {
        return Err(ApiError::validation("Email and password are required"));
    }

    let password_hash = hash_password(&request.password).map_err(|e| {
        tracing::error!(error = %e, "Failed to hash password");
        ApiError::internal("Internal Server Error")
    })?;

    let user = state
        .users
        .create(&request.email, &password_hash, DEFAULT_USER_NAME)
        .await?;

    tracing::info!(user_id = %user.id, "User registered");

    Ok((
        StatusCode::CREATED,
        Json(MessageResponse {
            success: true,
            message: "User registered successfully".to_string(),
        }),
    ))
}

/// Login endpoint.
///
/// Unknown email and wrong password produce the same response, so the
/// endpoint cannot be used to probe which emails are registered.
pub async fn login(
    State(state): State<Arc<AppState>>,
    payload: Result<Json<LoginRequest>, JsonRejection>,
) -> Result<Json<LoginResponse>, ApiError> {
    let Json(request) = payload?;

    let user = state
        .users
        .find_by_email(&request.email)
        .await?
        .ok_or_else(|| ApiError::bad_request("Invalid email or password"))?;

    if !verify_password(&request.password, &user.password_hash) {
        return Err(ApiError::bad_request("Invalid email or password"));
    }

    let token = state.tokens.issue(&user.id, &user.email).map_err(|e| {
        tracing::error!(error = %e, "Failed to issue token");
        ApiError::internal("Internal Server Error")
    })?;

    tracing::info!(user_id = %user.id, "User logged in");

    Ok(Json(LoginResponse {
        success: true,
        token,
    }))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_hash_and_verify_password() {
        let hash = hash_password("hunter2").unwrap();
        assert_ne!(hash, "hunter2");
        assert!(hash.starts_with("$argon2"));

        assert!(verify_password("hunter2", &hash));
        assert!(!verify_password("hunter3", &hash));
    }

    #[test]
    fn test_hashes_are_salted() {
        let first = hash_password("hunter2").unwrap();
        let second = hash_password("hunter2").unwrap();
        assert_ne!(first, second);
        assert!(verify_password("hunter2", &first));
        assert!(verify_password("hunter2", &second));
    }

    #[test]
    fn test_verify_rejects_malformed_hash() {
        assert!(!verify_password("hunter2", "not-a-phc-string"));
        assert!(!verify_password("hunter2", ""));
    }
}
