//! In-memory store backends.
//!
//! Both stores keep their records in a `Vec` behind an `RwLock`, preserving
//! insertion order. Lookups scan linearly, which is the intended trade-off at
//! this scale. Each trait method takes the lock once, so every call is an
//! atomic read-modify-write with respect to other callers.

use async_trait::async_trait;
use chrono::Utc;
use parking_lot::RwLock;
use uuid::Uuid;

use super::{StoreError, Task, TaskPatch, TaskStore, User, UserStore};

#[derive(Default)]
pub struct MemoryUserStore {
    users: RwLock<Vec<User>>,
}

impl MemoryUserStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl UserStore for MemoryUserStore {
    async fn create(
        &self,
        email: &str,
        password_hash: &str,
        name: &str,
    ) -> Result<User, StoreError> {
        // Check-and-insert under one write lock so two concurrent
        // registrations cannot both claim the same email.
        let mut users = self.users.write();
        if users.iter().any(|u| u.email == email) {
            return Err(StoreError::EmailExists);
        }

        let user = User {
            id: Uuid::new_v4().to_string(),
            email: email.to_string(),
            password_hash: password_hash.to_string(),
            name: name.to_string(),
            created_at: Utc::now(),
        };
        users.push(user.clone());
        Ok(user)
    }

    async fn find_by_email(&self, email: &str) -> Result<Option<User>, StoreError> {
        let users = self.users.read();
        Ok(users.iter().find(|u| u.email == email).cloned())
    }

    async fn find_by_id(&self, id: &str) -> Result<Option<User>, StoreError> {
        let users = self.users.read();
        Ok(users.iter().find(|u| u.id == id).cloned())
    }

    async fn update_name(&self, id: &str, name: &str) -> Result<User, StoreError> {
        let mut users = self.users.write();
        let user = users
            .iter_mut()
            .find(|u| u.id == id)
            .ok_or(StoreError::NotFound)?;
        user.name = name.to_string();
        Ok(user.clone())
    }

    async fn update_password_hash(
        &self,
        id: &str,
        password_hash: &str,
    ) -> Result<(), StoreError> {
        let mut users = self.users.write();
        let user = users
            .iter_mut()
            .find(|u| u.id == id)
            .ok_or(StoreError::NotFound)?;
        user.password_hash = password_hash.to_string();
        Ok(())
    }
}

#[derive(Default)]
pub struct MemoryTaskStore {
    tasks: RwLock<Vec<Task>>,
}

impl MemoryTaskStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl TaskStore for MemoryTaskStore {
    async fn list_by_owner(&self, user_id: &str) -> Result<Vec<Task>, StoreError> {
        let tasks = self.tasks.read();
        Ok(tasks
            .iter()
            .filter(|t| t.user_id == user_id)
            .cloned()
            .collect())
    }

    async fn create(&self, user_id: &str, title: &str) -> Result<Task, StoreError> {
        if title.is_empty() {
            return Err(StoreError::EmptyTitle);
        }

        let task = Task {
            id: Uuid::new_v4().to_string(),
            user_id: user_id.to_string(),
            title: title.to_string(),
            completed: false,
            created_at: Utc::now(),
        };

        let mut tasks = self.tasks.write();
        tasks.push(task.clone());
        Ok(task)
    }

    async fn update(&self, id: &str, user_id: &str, patch: TaskPatch) -> Result<Task, StoreError> {
        let mut tasks = self.tasks.write();
        let task = tasks
            .iter_mut()
            .find(|t| t.id == id && t.user_id == user_id)
            .ok_or(StoreError::NotFound)?;

        if let Some(title) = patch.title {
            task.title = title;
        }
        if let Some(completed) = patch.completed {
            task.completed = completed;
        }
        Ok(task.clone())
    }

    async fn delete(&self, id: &str, user_id: &str) -> Result<(), StoreError> {
        let mut tasks = self.tasks.write();
        let index = tasks
            .iter()
            .position(|t| t.id == id && t.user_id == user_id)
            .ok_or(StoreError::NotFound)?;
        tasks.remove(index);
        Ok(())
    }
}
