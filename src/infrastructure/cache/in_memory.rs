//! In-memory cache implementation using moka

use std::time::Duration;

use async_trait::async_trait;
use moka::future::Cache as MokaCache;
use tokio::time::Instant;

use crate::domain::cache::{Cache, GlobPattern};
use crate::domain::DomainError;

/// Configuration for in-memory cache
#[derive(Debug, Clone)]
pub struct InMemoryCacheConfig {
    /// Maximum number of entries
    pub max_capacity: u64,
    /// Upper bound on any entry's lifetime; per-entry TTLs are enforced on read
    pub max_ttl: Duration,
}

impl Default for InMemoryCacheConfig {
    fn default() -> Self {
        Self {
            max_capacity: 10_000,
            max_ttl: Duration::from_secs(3600),
        }
    }
}

impl InMemoryCacheConfig {
    pub fn with_max_capacity(mut self, capacity: u64) -> Self {
        self.max_capacity = capacity;
        self
    }

    pub fn with_max_ttl(mut self, ttl: Duration) -> Self {
        self.max_ttl = ttl;
        self
    }
}

#[derive(Debug, Clone)]
struct CacheEntry {
    data: String,
    expires_at: Instant,
}

impl CacheEntry {
    fn is_expired(&self) -> bool {
        Instant::now() >= self.expires_at
    }
}

/// Process-local cache backend
///
/// Expiry is checked against the tokio clock, so paused-time tests can step
/// past a TTL without sleeping.
#[derive(Debug)]
pub struct InMemoryCache {
    cache: MokaCache<String, CacheEntry>,
}

impl InMemoryCache {
    pub fn new() -> Self {
        Self::with_config(InMemoryCacheConfig::default())
    }

    pub fn with_config(config: InMemoryCacheConfig) -> Self {
        let cache = MokaCache::builder()
            .max_capacity(config.max_capacity)
            .time_to_live(config.max_ttl)
            .build();

        Self { cache }
    }

    async fn live_entry(&self, key: &str) -> Option<CacheEntry> {
        let entry = self.cache.get(key).await?;

        if entry.is_expired() {
            self.cache.remove(key).await;
            return None;
        }

        Some(entry)
    }
}

impl Default for InMemoryCache {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Cache for InMemoryCache {
    async fn get_raw(&self, key: &str) -> Result<Option<String>, DomainError> {
        Ok(self.live_entry(key).await.map(|entry| entry.data))
    }

    async fn set_raw(&self, key: &str, value: &str, ttl: Duration) -> Result<(), DomainError> {
        let entry = CacheEntry {
            data: value.to_string(),
            expires_at: Instant::now() + ttl,
        };

        self.cache.insert(key.to_string(), entry).await;
        Ok(())
    }

    async fn delete(&self, key: &str) -> Result<bool, DomainError> {
        Ok(self.cache.remove(key).await.is_some_and(|e| !e.is_expired()))
    }

    async fn delete_pattern(&self, pattern: &str) -> Result<usize, DomainError> {
        let glob = GlobPattern::new(pattern)?;

        self.cache.run_pending_tasks().await;

        let keys: Vec<String> = self
            .cache
            .iter()
            .filter(|(k, _)| glob.matches(k))
            .map(|(k, _)| k.to_string())
            .collect();

        let mut deleted = 0;

        for key in keys {
            if let Some(entry) = self.cache.remove(&key).await {
                if !entry.is_expired() {
                    deleted += 1;
                }
            }
        }

        Ok(deleted)
    }

    async fn ping(&self) -> Result<(), DomainError> {
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::cache::{CacheLookup, CacheStore};
    use std::sync::Arc;

    #[tokio::test]
    async fn test_set_and_get() {
        let cache = InMemoryCache::new();

        cache
            .set_raw("key1", "\"value1\"", Duration::from_secs(60))
            .await
            .unwrap();

        let result = cache.get_raw("key1").await.unwrap();
        assert_eq!(result, Some("\"value1\"".to_string()));
    }

    #[tokio::test]
    async fn test_get_nonexistent() {
        let cache = InMemoryCache::new();
        assert_eq!(cache.get_raw("nonexistent").await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_delete() {
        let cache = InMemoryCache::new();
        cache.set_raw("key1", "1", Duration::from_secs(60)).await.unwrap();

        assert!(cache.delete("key1").await.unwrap());
        assert!(!cache.delete("key1").await.unwrap());
        assert_eq!(cache.get_raw("key1").await.unwrap(), None);
    }

    #[tokio::test(start_paused = true)]
    async fn test_entry_expires_after_ttl() {
        let store = CacheStore::new(Arc::new(InMemoryCache::new()));

        store.set("page", &vec![1, 2, 3], Duration::from_secs(300)).await;
        assert_eq!(store.get::<Vec<i32>>("page").await, CacheLookup::Hit(vec![1, 2, 3]));

        tokio::time::advance(Duration::from_secs(299)).await;
        assert!(store.get::<Vec<i32>>("page").await.is_hit());

        tokio::time::advance(Duration::from_secs(1)).await;
        assert_eq!(store.get::<Vec<i32>>("page").await, CacheLookup::Miss);
    }

    #[tokio::test(start_paused = true)]
    async fn test_overwrite_resets_expiry() {
        let cache = InMemoryCache::new();

        cache.set_raw("k", "1", Duration::from_secs(10)).await.unwrap();
        tokio::time::advance(Duration::from_secs(8)).await;
        cache.set_raw("k", "2", Duration::from_secs(10)).await.unwrap();
        tokio::time::advance(Duration::from_secs(8)).await;

        assert_eq!(cache.get_raw("k").await.unwrap(), Some("2".to_string()));
    }

    #[tokio::test]
    async fn test_delete_pattern() {
        let cache = InMemoryCache::new();

        cache.set_raw("user:1", "1", Duration::from_secs(60)).await.unwrap();
        cache.set_raw("user:2", "2", Duration::from_secs(60)).await.unwrap();
        cache.set_raw("product:1", "3", Duration::from_secs(60)).await.unwrap();

        let deleted = cache.delete_pattern("user:*").await.unwrap();
        assert_eq!(deleted, 2);

        assert_eq!(cache.get_raw("user:1").await.unwrap(), None);
        assert!(cache.get_raw("product:1").await.unwrap().is_some());
    }

    #[tokio::test]
    async fn test_clear_all_on_empty_store() {
        let cache = InMemoryCache::new();

        assert_eq!(cache.delete_pattern("*").await.unwrap(), 0);
        assert_eq!(cache.delete_pattern("*").await.unwrap(), 0);
    }
}
