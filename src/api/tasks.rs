use axum::{
    extract::{rejection::JsonRejection, Path, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

use crate::auth::AuthUser;
use crate::store::{Task, TaskPatch};
use crate::AppState;

use super::error::ApiError;
use super::validation::validate_title;
use super::MessageResponse;

#[derive(Debug, Serialize)]
pub struct TaskListResponse {
    pub success: bool,
    pub data: Vec<Task>,
    pub cached: bool,
}

#[derive(Debug, Serialize)]
pub struct TaskResponse {
    pub success: bool,
    pub data: Task,
}

#[derive(Debug, Deserialize)]
pub struct CreateTaskRequest {
    #[serde(default)]
    pub title: String,
}

#[derive(Debug, Deserialize)]
pub struct UpdateTaskRequest {
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub completed: Option<bool>,
}

/// List the caller's tasks, read through the cache
pub async fn list_tasks(
    State(state): State<Arc<AppState>>,
    auth: AuthUser,
) -> Result<Json<TaskListResponse>, ApiError> {
    if let Some(tasks) = state.task_cache.get(&auth.id) {
        return Ok(Json(TaskListResponse {
            success: true,
            data: tasks,
            cached: true,
        }));
    }

    // Fill under the owner's lock so a concurrent write cannot slip between
    // the store read and the cache fill.
    let lock = state.user_locks.for_user(&auth.id);
    let _guard = lock.lock().await;

    if let Some(tasks) = state.task_cache.get(&auth.id) {
        return Ok(Json(TaskListResponse {
            success: true,
            data: tasks,
            cached: true,
        }));
    }

    let tasks = state.tasks.list_by_owner(&auth.id).await?;
    state.task_cache.set(&auth.id, tasks.clone());

    Ok(Json(TaskListResponse {
        success: true,
        data: tasks,
        cached: false,
    }))
}

/// Create a task owned by the caller
pub async fn create_task(
    State(state): State<Arc<AppState>>,
    auth: AuthUser,
    payload: Result<Json<CreateTaskRequest>, JsonRejection>,
) -> Result<impl IntoResponse, ApiError> {
    let Json(request) = payload?;

    validate_title(&request.title).map_err(ApiError::validation)?;

    let lock = state.user_locks.for_user(&auth.id);
    let _guard = lock.lock().await;

    let task = state.tasks.create(&auth.id, &request.title).await?;
    state.task_cache.invalidate(&auth.id);

    tracing::info!(user_id = %auth.id, task_id = %task.id, "Task created");

    Ok((
        StatusCode::CREATED,
        Json(TaskResponse {
            success: true,
            data: task,
        }),
    ))
}

/// Partially update one of the caller's tasks
pub async fn update_task(
    State(state): State<Arc<AppState>>,
    auth: AuthUser,
    Path(id): Path<String>,
    payload: Result<Json<UpdateTaskRequest>, JsonRejection>,
) -> Result<Json<TaskResponse>, ApiError> {
    let Json(request) = payload?;

    if let Some(title) = request.title.as_deref() {
        validate_title(title).map_err(ApiError::validation)?;
    }

    let lock = state.user_locks.for_user(&auth.id);
    let _guard = lock.lock().await;

    let task = state
        .tasks
        .update(
            &id,
            &auth.id,
            TaskPatch {
                title: request.title,
                completed: request.completed,
            },
        )
        .await
        .map_err(|_| ApiError::not_found("Task not found"))?;

    state.task_cache.invalidate(&auth.id);

    Ok(Json(TaskResponse {
        success: true,
        data: task,
    }))
}

/// Delete one of the caller's tasks
pub async fn delete_task(
    State(state): State<Arc<AppState>>,
    auth: AuthUser,
    Path(id): Path<String>,
) -> Result<Json<MessageResponse>, ApiError> {
    let lock = state.user_locks.for_user(&auth.id);
    let _guard = lock.lock().await;

    state
        .tasks
        .delete(&id, &auth.id)
        .await
        .map_err(|_| ApiError::not_found("Task not found"))?;

    state.task_cache.invalidate(&auth.id);

    tracing::info!(user_id = %auth.id, task_id = %id, "Task deleted");

    Ok(Json(MessageResponse {
        success: true,
        message: "Task deleted successfully".to_string(),
    }))
}
