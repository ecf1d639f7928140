//! Read-through caches and per-user write serialization.
//!
//! Each cache instance holds one value type keyed by user id, so the profile
//! and task-list caches are separate tables and cannot collide. Entries live
//! until a write path invalidates them; an optional TTL adds a staleness
//! bound on top, enforced lazily on `get` and by a periodic sweep.

use dashmap::DashMap;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::Mutex;

#[derive(Debug, Clone)]
struct CacheEntry<T> {
    value: T,
    inserted_at: Instant,
}

/// Thread-safe single-type cache keyed by user id.
#[derive(Debug)]
pub struct Cache<T: Clone> {
    entries: DashMap<String, CacheEntry<T>>,
    ttl: Option<Duration>,
}

impl<T: Clone> Cache<T> {
    /// Create a cache. `ttl` of `None` disables expiry entirely.
    pub fn new(ttl: Option<Duration>) -> Self {
        Self {
            entries: DashMap::new(),
            ttl,
        }
    }

    /// Look up a cached value. Expired entries count as a miss and are
    /// dropped on the way out.
    pub fn get(&self, key: &str) -> Option<T> {
        let entry = self.entries.get(key)?;
        if let Some(ttl) = self.ttl {
            if entry.inserted_at.elapsed() >= ttl {
                // Release the shard guard before removing
                drop(entry);
                self.entries.remove(key);
                return None;
            }
        }
        Some(entry.value.clone())
    }

    /// Store a value, replacing any previous entry for the key.
    pub fn set(&self, key: &str, value: T) {
        self.entries.insert(
            key.to_string(),
            CacheEntry {
                value,
                inserted_at: Instant::now(),
            },
        );
    }

    /// Remove the entry for a key. A no-op if the key is absent.
    pub fn invalidate(&self, key: &str) {
        self.entries.remove(key);
    }

    /// Drop every expired entry. A no-op when no TTL is configured.
    pub fn cleanup_expired(&self) {
        if let Some(ttl) = self.ttl {
            self.entries
                .retain(|_, entry| entry.inserted_at.elapsed() < ttl);
        }
    }

    /// Get the number of stored entries (for monitoring and tests)
    pub fn entry_count(&self) -> usize {
        self.entries.len()
    }
}

/// Spawn a background task that periodically drops expired cache entries
pub fn spawn_cleanup_task<T>(cache: Arc<Cache<T>>, cleanup_interval_secs: u64)
where
    T: Clone + Send + Sync + 'static,
{
    tokio::spawn(async move {
        let interval = Duration::from_secs(cleanup_interval_secs);
        loop {
            tokio::time::sleep(interval).await;
            cache.cleanup_expired();
            tracing::debug!(
                "Cache cleanup complete, {} entries remaining",
                cache.entry_count()
            );
        }
    });
}

/// One async mutex per user id.
///
/// Mutating handlers hold the owner's lock across the store write and the
/// cache invalidation that follows; miss paths hold it across the store read
/// and the cache fill. That ordering stops a concurrent reader from
/// repopulating the cache with pre-write data.
#[derive(Debug, Default)]
pub struct UserLocks {
    locks: DashMap<String, Arc<Mutex<()>>>,
}

impl UserLocks {
    pub fn new() -> Self {
        Self::default()
    }

    /// Get the lock for a user, creating it on first use. The same id always
    /// yields the same mutex.
    pub fn for_user(&self, user_id: &str) -> Arc<Mutex<()>> {
        self.locks
            .entry(user_id.to_string())
            .or_insert_with(|| Arc::new(Mutex::new(())))
            .value()
            .clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_set_get_invalidate() {
        let cache: Cache<String> = Cache::new(None);

        assert!(cache.get("alice").is_none());

        cache.set("alice", "hello".to_string());
        assert_eq!(cache.get("alice").as_deref(), Some("hello"));
        assert_eq!(cache.entry_count(), 1);

        cache.invalidate("alice");
        assert!(cache.get("alice").is_none());
        assert_eq!(cache.entry_count(), 0);
    }

    #[test]
    fn test_invalidate_missing_key_is_noop() {
        let cache: Cache<u32> = Cache::new(None);
        cache.invalidate("nobody");
        cache.invalidate("nobody");
        assert_eq!(cache.entry_count(), 0);
    }

    #[test]
    fn test_set_overwrites() {
        let cache: Cache<u32> = Cache::new(None);
        cache.set("alice", 1);
        cache.set("alice", 2);
        assert_eq!(cache.get("alice"), Some(2));
        assert_eq!(cache.entry_count(), 1);
    }

    #[test]
    fn test_keys_are_independent() {
        let cache: Cache<u32> = Cache::new(None);
        cache.set("alice", 1);
        cache.set("bob", 2);

        cache.invalidate("alice");
        assert!(cache.get("alice").is_none());
        assert_eq!(cache.get("bob"), Some(2));
    }

    #[test]
    fn test_ttl_expires_entries() {
        let cache: Cache<u32> = Cache::new(Some(Duration::from_millis(20)));
        cache.set("alice", 1);
        assert_eq!(cache.get("alice"), Some(1));

        std::thread::sleep(Duration::from_millis(30));

        // Expired entry reads as a miss and is evicted
        assert!(cache.get("alice").is_none());
        assert_eq!(cache.entry_count(), 0);
    }

    #[test]
    fn test_no_ttl_never_expires() {
        let cache: Cache<u32> = Cache::new(None);
        cache.set("alice", 1);
        std::thread::sleep(Duration::from_millis(30));
        assert_eq!(cache.get("alice"), Some(1));

        cache.cleanup_expired();
        assert_eq!(cache.entry_count(), 1);
    }

    #[test]
    fn test_cleanup_removes_only_expired() {
        let cache: Cache<u32> = Cache::new(Some(Duration::from_millis(20)));
        cache.set("old", 1);
        std::thread::sleep(Duration::from_millis(30));
        cache.set("fresh", 2);

        cache.cleanup_expired();
        assert_eq!(cache.entry_count(), 1);
        assert_eq!(cache.get("fresh"), Some(2));
    }

    #[tokio::test]
    async fn test_same_user_gets_same_lock() {
        let locks = UserLocks::new();
        let a1 = locks.for_user("alice");
        let a2 = locks.for_user("alice");
        let b = locks.for_user("bob");

        assert!(Arc::ptr_eq(&a1, &a2));
        assert!(!Arc::ptr_eq(&a1, &b));
    }

    #[tokio::test]
    async fn test_lock_excludes_same_user_only() {
        let locks = UserLocks::new();
        let alice = locks.for_user("alice");
        let guard = alice.lock().await;

        // A second handle to the same user is blocked
        assert!(locks.for_user("alice").try_lock().is_err());
        // Another user proceeds independently
        assert!(locks.for_user("bob").try_lock().is_ok());

        drop(guard);
        assert!(locks.for_user("alice").try_lock().is_ok());
    }
}
