pub mod memory;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// A registered account. Never serialized to the wire; see [`Profile`].
#[derive(Debug, Clone)]
pub struct User {
    pub id: String,
    pub email: String,
    pub password_hash: String,
    pub name: String,
    pub created_at: DateTime<Utc>,
}

/// The public view of a user, as served and cached by the profile endpoints.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Profile {
    pub id: String,
    pub email: String,
    pub name: String,
}

impl From<&User> for Profile {
    fn from(user: &User) -> Self {
        Self {
            id: user.id.clone(),
            email: user.email.clone(),
            name: user.name.clone(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Task {
    pub id: String,
    pub user_id: String,
    pub title: String,
    pub completed: bool,
    pub created_at: DateTime<Utc>,
}

/// Partial update for a task. `None` fields keep the stored value.
#[derive(Debug, Clone, Default)]
pub struct TaskPatch {
    pub title: Option<String>,
    pub completed: Option<bool>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum StoreError {
    #[error("email already registered")]
    EmailExists,
    #[error("record not found")]
    NotFound,
    #[error("title must not be empty")]
    EmptyTitle,
}

/// Storage for user accounts. Implementations must enforce email uniqueness
/// atomically inside `create`.
#[async_trait]
pub trait UserStore: Send + Sync {
    async fn create(
        &self,
        email: &str,
        password_hash: &str,
        name: &str,
    ) -> Result<User, StoreError>;

    async fn find_by_email(&self, email: &str) -> Result<Option<User>, StoreError>;

    async fn find_by_id(&self, id: &str) -> Result<Option<User>, StoreError>;

    async fn update_name(&self, id: &str, name: &str) -> Result<User, StoreError>;

    async fn update_password_hash(&self, id: &str, password_hash: &str)
        -> Result<(), StoreError>;
}

/// Storage for tasks. Every lookup is scoped to the owning user; a task id
/// belonging to another user is indistinguishable from a missing one.
#[async_trait]
pub trait TaskStore: Send + Sync {
    async fn list_by_owner(&self, user_id: &str) -> Result<Vec<Task>, StoreError>;

    /// Fails with [`StoreError::EmptyTitle`] on an empty title, regardless of
    /// any validation done upstream.
    async fn create(&self, user_id: &str, title: &str) -> Result<Task, StoreError>;

    async fn update(&self, id: &str, user_id: &str, patch: TaskPatch) -> Result<Task, StoreError>;

    async fn delete(&self, id: &str, user_id: &str) -> Result<(), StoreError>;
}
