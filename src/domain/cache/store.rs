//! Look-aside cache store with explicit hit/miss/failure outcomes

use std::sync::Arc;
use std::time::Duration;

use serde::{de::DeserializeOwned, Serialize};
use tracing::{debug, warn};

use super::repository::Cache;

/// Result of a cache read: the only two outcomes are a present, decodable
/// value and a miss. An empty-but-valid value (empty page, zero counts) is a
/// hit like any other.
#[derive(Debug, Clone, PartialEq)]
pub enum CacheLookup<T> {
    Hit(T),
    Miss,
}

impl<T> CacheLookup<T> {
    pub fn is_hit(&self) -> bool {
        matches!(self, Self::Hit(_))
    }
}

/// Result of a cache write or delete
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CacheOutcome<T = ()> {
    Done(T),
    Failed,
}

impl<T> CacheOutcome<T> {
    pub fn is_done(&self) -> bool {
        matches!(self, Self::Done(_))
    }
}

/// Cache store wrapping a backend so that no backend error reaches the caller
///
/// Every backend failure is logged and converted: reads become
/// [`CacheLookup::Miss`], writes become [`CacheOutcome::Failed`].
#[derive(Debug, Clone)]
pub struct CacheStore {
    backend: Arc<dyn Cache>,
}

impl CacheStore {
    pub fn new(backend: Arc<dyn Cache>) -> Self {
        Self { backend }
    }

    /// Returns the stored value if present, unexpired and decodable
    pub async fn get<V>(&self, key: &str) -> CacheLookup<V>
    where
        V: DeserializeOwned,
    {
        let raw = match self.backend.get_raw(key).await {
            Ok(Some(raw)) => raw,
            Ok(None) => return CacheLookup::Miss,
            Err(e) => {
                warn!(key = %key, error = %e, "Cache read failed, treating as miss");
                return CacheLookup::Miss;
            }
        };

        match serde_json::from_str(&raw) {
            Ok(value) => CacheLookup::Hit(value),
            Err(e) => {
                debug!(key = %key, error = %e, "Undecodable cache entry, treating as miss");
                CacheLookup::Miss
            }
        }
    }

    /// Stores a value wholesale with absolute expiry `now + ttl`
    pub async fn set<V>(&self, key: &str, value: &V, ttl: Duration) -> CacheOutcome
    where
        V: Serialize + ?Sized,
    {
        let data = match serde_json::to_string(value) {
            Ok(data) => data,
            Err(e) => {
                warn!(key = %key, error = %e, "Failed to serialize cache value");
                return CacheOutcome::Failed;
            }
        };

        match self.backend.set_raw(key, &data, ttl).await {
            Ok(()) => CacheOutcome::Done(()),
            Err(e) => {
                warn!(key = %key, error = %e, "Cache write failed");
                CacheOutcome::Failed
            }
        }
    }

    /// Removes a single entry; removing a missing key still succeeds
    pub async fn delete(&self, key: &str) -> CacheOutcome {
        match self.backend.delete(key).await {
            Ok(_) => CacheOutcome::Done(()),
            Err(e) => {
                warn!(key = %key, error = %e, "Cache delete failed");
                CacheOutcome::Failed
            }
        }
    }

    /// Removes every entry matching a glob, returning the number removed
    pub async fn clear_pattern(&self, pattern: &str) -> CacheOutcome<usize> {
        match self.backend.delete_pattern(pattern).await {
            Ok(count) => CacheOutcome::Done(count),
            Err(e) => {
                warn!(pattern = %pattern, error = %e, "Cache pattern delete failed");
                CacheOutcome::Failed
            }
        }
    }

    /// Reports whether the backend answers
    pub async fn ping(&self) -> CacheOutcome {
        match self.backend.ping().await {
            Ok(()) => CacheOutcome::Done(()),
            Err(e) => {
                debug!(error = %e, "Cache ping failed");
                CacheOutcome::Failed
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::cache::MockCache;

    #[tokio::test]
    async fn test_round_trip() {
        let store = CacheStore::new(Arc::new(MockCache::new()));

        let outcome = store.set("k", &vec![1, 2, 3], Duration::from_secs(60)).await;
        assert!(outcome.is_done());

        let lookup: CacheLookup<Vec<i32>> = store.get("k").await;
        assert_eq!(lookup, CacheLookup::Hit(vec![1, 2, 3]));
    }

    #[tokio::test]
    async fn test_empty_value_is_a_hit() {
        let store = CacheStore::new(Arc::new(MockCache::new()));
        store.set("empty", &Vec::<i32>::new(), Duration::from_secs(60)).await;
        store.set("zero", &0u64, Duration::from_secs(60)).await;

        assert_eq!(store.get::<Vec<i32>>("empty").await, CacheLookup::Hit(vec![]));
        assert_eq!(store.get::<u64>("zero").await, CacheLookup::Hit(0));
    }

    #[tokio::test]
    async fn test_missing_key_is_miss() {
        let store = CacheStore::new(Arc::new(MockCache::new()));

        let lookup: CacheLookup<String> = store.get("missing").await;
        assert_eq!(lookup, CacheLookup::Miss);
    }

    #[tokio::test]
    async fn test_malformed_value_is_miss() {
        let backend = MockCache::new().with_raw_entry("bad", "{not json");
        let store = CacheStore::new(Arc::new(backend));

        let lookup: CacheLookup<Vec<i32>> = store.get("bad").await;
        assert_eq!(lookup, CacheLookup::Miss);
    }

    #[tokio::test]
    async fn test_backend_failures_degrade() {
        let store = CacheStore::new(Arc::new(MockCache::new().with_error("down")));

        assert_eq!(store.get::<String>("k").await, CacheLookup::Miss);
        assert_eq!(store.set("k", "v", Duration::from_secs(1)).await, CacheOutcome::Failed);
        assert_eq!(store.delete("k").await, CacheOutcome::Failed);
        assert_eq!(store.clear_pattern("*").await, CacheOutcome::Failed);
        assert_eq!(store.ping().await, CacheOutcome::Failed);
    }

    #[tokio::test]
    async fn test_delete_missing_key_succeeds() {
        let store = CacheStore::new(Arc::new(MockCache::new()));
        assert_eq!(store.delete("nothing").await, CacheOutcome::Done(()));
    }

    #[tokio::test]
    async fn test_clear_pattern_is_idempotent() {
        let store = CacheStore::new(Arc::new(MockCache::new()));
        store.set("a", &1, Duration::from_secs(60)).await;
        store.set("b", &2, Duration::from_secs(60)).await;

        assert_eq!(store.clear_pattern("*").await, CacheOutcome::Done(2));
        assert_eq!(store.clear_pattern("*").await, CacheOutcome::Done(0));
        assert_eq!(store.clear_pattern("*").await, CacheOutcome::Done(0));
    }

    #[tokio::test]
    async fn test_set_overwrites_wholesale() {
        let store = CacheStore::new(Arc::new(MockCache::new()));
        store.set("k", &vec![1, 2], Duration::from_secs(60)).await;
        store.set("k", &vec![3], Duration::from_secs(60)).await;

        assert_eq!(store.get::<Vec<i32>>("k").await, CacheLookup::Hit(vec![3]));
    }
}
