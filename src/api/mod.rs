mod auth;
pub mod error;
mod tasks;
mod users;
mod validation;

use axum::{
    middleware,
    routing::{delete, get, post, put},
    Router,
};
use serde::Serialize;
use std::sync::Arc;
use tower_http::{cors::CorsLayer, trace::TraceLayer};

use crate::auth::auth_middleware;
use crate::AppState;

use error::ApiError;

/// Success envelope for endpoints that return no data
#[derive(Debug, Serialize)]
pub struct MessageResponse {
    pub success: bool,
    pub message: String,
}

pub fn create_router(state: Arc<AppState>) -> Router {
    // Auth routes (public)
    let auth_routes = Router::new()
        .route("/register", post(auth::register))
        .route("/login", post(auth::login));

    // Protected routes
    let api_routes = Router::new()
        // Profile
        .route("/user/profile", get(users::get_profile))
        .route("/user/profile", put(users::update_profile))
        .route("/user/change-password", put(users::change_password))
        // Tasks
        .route("/tasks", get(tasks::list_tasks))
        .route("/tasks", post(tasks::create_task))
        .route("/tasks/:id", put(tasks::update_task))
        .route("/tasks/:id", delete(tasks::delete_task))
        // Protected by auth
        .layer(middleware::from_fn_with_state(
            state.clone(),
            auth_middleware,
        ));

    Router::new()
        .route("/health", get(health_check))
        .nest("/auth", auth_routes)
        .merge(api_routes)
        .fallback(not_found)
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
}

async fn health_check() -> &'static str {
    "OK"
}

async fn not_found() -> ApiError {
    ApiError::not_found("Route not found")
}
