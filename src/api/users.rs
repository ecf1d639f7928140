use axum::{
    extract::{rejection::JsonRejection, State},
    Json,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

use crate::auth::AuthUser;
use crate::store::Profile;
use crate::AppState;

use super::auth::{hash_password, verify_password};
use super::error::ApiError;
use super::validation::validate_name;
use super::MessageResponse;

#[derive(Debug, Serialize)]
pub struct ProfileResponse {
    pub success: bool,
    pub data: Profile,
    pub cached: bool,
}

#[derive(Debug, Serialize)]
pub struct ProfileUpdateResponse {
    pub success: bool,
    pub message: String,
    pub data: Profile,
}

#[derive(Debug, Deserialize)]
pub struct UpdateProfileRequest {
    #[serde(default)]
    pub name: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChangePasswordRequest {
    #[serde(default)]
    pub current_password: String,
    #[serde(default)]
    pub new_password: String,
}

/// Get the caller's profile, read through the cache
pub async fn get_profile(
    State(state): State<Arc<AppState>>,
    auth: AuthUser,
) -> Result<Json<ProfileResponse>, ApiError> {
    if let Some(profile) = state.profile_cache.get(&auth.id) {
        return Ok(Json(ProfileResponse {
            success: true,
            data: profile,
            cached: true,
        }));
    }

    // Fill under the owner's lock so a concurrent write cannot slip between
    // the store read and the cache fill.
    let lock = state.user_locks.for_user(&auth.id);
    let _guard = lock.lock().await;

    if let Some(profile) = state.profile_cache.get(&auth.id) {
        return Ok(Json(ProfileResponse {
            success: true,
            data: profile,
            cached: true,
        }));
    }

    let user = state
        .users
        .find_by_id(&auth.id)
        .await?
        .ok_or_else(|| ApiError::not_found("User not found"))?;

    let profile = Profile::from(&user);
    state.profile_cache.set(&auth.id, profile.clone());

    Ok(Json(ProfileResponse {
        success: true,
        data: profile,
        cached: false,
    }))
}

/// Update the caller's display name
pub async fn update_profile(
    State(state): State<Arc<AppState>>,
    auth: AuthUser,
    payload: Result<Json<UpdateProfileRequest>, JsonRejection>,
) -> Result<Json<ProfileUpdateResponse>, ApiError> {
    let Json(request) = payload?;

    validate_name(&request.name).map_err(ApiError::validation)?;

    let lock = state.user_locks.for_user(&auth.id);
    let _guard = lock.lock().await;

    let user = state
        .users
        .update_name(&auth.id, &request.name)
        .await
        .map_err(|_| ApiError::not_found("User not found"))?;

    state.profile_cache.invalidate(&auth.id);

    tracing::info!(user_id = %auth.id, "Profile updated");

    Ok(Json(ProfileUpdateResponse {
        success: true,
        message: "Profile updated successfully".to_string(),
        data: Profile::from(&user),
    }))
}

/// Change the caller's password
pub async fn change_password(
    State(state): State<Arc<AppState>>,
    auth: AuthUser,
    payload: Result<Json<ChangePasswordRequest>, JsonRejection>,
) -> Result<Json<MessageResponse>, ApiError> {
    let Json(request) = payload?;

    if request.current_password.is_empty() || request.new_password.is_empty() {
        return Err(ApiError::validation(
            "Current and new password are required",
        ));
    }

    let lock = state.user_locks.for_user(&auth.id);
    let _guard = lock.lock().await;

    let user = state
        .users
        .find_by_id(&auth.id)
        .await?
        .ok_or_else(|| ApiError::not_found("User not found"))?;

    if !verify_password(&request.current_password, &user.password_hash) {
        return Err(ApiError::bad_request("Incorrect current password"));
    }

    let password_hash = hash_password(&request.new_password).map_err(|e| {
        tracing::error!(error = %e, "Failed to hash password");
        ApiError::internal("Internal Server Error")
    })?;

    state
        .users
        .update_password_hash(&auth.id, &password_hash)
        .await
        .map_err(|_| ApiError::not_found("User not found"))?;

    // The cached profile carries no credential fields, so it stays valid.

    tracing::info!(user_id = %auth.id, "Password changed");

    Ok(Json(MessageResponse {
        success: true,
        message: "Password changed successfully".to_string(),
    }))
}
