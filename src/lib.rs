pub mod api;
pub mod auth;
pub mod cache;
pub mod config;
pub mod store;

use anyhow::{bail, Result};
use config::Config;
use std::sync::Arc;
use std::time::Duration;

use crate::auth::TokenService;
use crate::cache::{Cache, UserLocks};
use crate::store::{Profile, Task, TaskStore, UserStore};

pub struct AppState {
    pub config: Config,
    pub users: Arc<dyn UserStore>,
    pub tasks: Arc<dyn TaskStore>,
    pub tokens: TokenService,
    pub profile_cache: Arc<Cache<Profile>>,
    pub task_cache: Arc<Cache<Vec<Task>>>,
    pub user_locks: Arc<UserLocks>,
}

// The store trait objects and token keys are not Debug, so derive is not an
// option; tests need this impl for `unwrap_err` on `Result<AppState, _>`.
impl std::fmt::Debug for AppState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppState").finish_non_exhaustive()
    }
}

impl AppState {
    /// Build the shared state. Fails when `auth.jwt_secret` is unset or
    /// empty; tokens are never signed with a defaulted key.
    pub fn new(
        config: Config,
        users: Arc<dyn UserStore>,
        tasks: Arc<dyn TaskStore>,
    ) -> Result<Self> {
        let tokens = match config.auth.jwt_secret.as_deref() {
            Some(secret) if !secret.is_empty() => {
                TokenService::new(secret, config.auth.token_ttl_secs)
            }
            _ => bail!("auth.jwt_secret is not configured"),
        };
        let cache_ttl = config.cache.ttl_seconds.map(Duration::from_secs);
        Ok(Self {
            config,
            users,
            tasks,
            tokens,
            profile_cache: Arc::new(Cache::new(cache_ttl)),
            task_cache: Arc::new(Cache::new(cache_ttl)),
            user_locks: Arc::new(UserLocks::new()),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::memory::{MemoryTaskStore, MemoryUserStore};

    fn stores() -> (Arc<dyn UserStore>, Arc<dyn TaskStore>) {
        (
            Arc::new(MemoryUserStore::new()),
            Arc::new(MemoryTaskStore::new()),
        )
    }

    #[test]
    fn test_app_state_requires_jwt_secret() {
        let (users, tasks) = stores();
        let err = AppState::new(Config::default(), users, tasks).unwrap_err();
        assert!(err.to_string().contains("jwt_secret"));

        // An empty secret is as bad as a missing one
        let mut config = Config::default();
        config.auth.jwt_secret = Some(String::new());
        let (users, tasks) = stores();
        assert!(AppState::new(config, users, tasks).is_err());
    }

    #[test]
    fn test_app_state_builds_with_secret() {
        let mut config = Config::default();
        config.auth.jwt_secret = Some("s3cret".to_string());
        let (users, tasks) = stores();
        let state = AppState::new(config, users, tasks).unwrap();
        assert!(state.tokens.issue("u1", "ada@example.com").is_ok());
    }
}
