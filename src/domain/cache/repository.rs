//! Cache trait definition

use std::fmt::Debug;
use std::time::Duration;

use async_trait::async_trait;

use crate::domain::DomainError;

/// Backend trait for key-value operations with TTL support
///
/// Values are JSON strings so the trait stays dyn-compatible. Backends report
/// every failure as an error; turning failures into misses is the job of
/// [`CacheStore`](super::CacheStore), not of the backend.
#[async_trait]
pub trait Cache: Send + Sync + Debug {
    /// Gets a raw JSON value; `None` when absent or expired
    async fn get_raw(&self, key: &str) -> Result<Option<String>, DomainError>;

    /// Stores a raw JSON value, replacing any previous entry, expiring after `ttl`
    async fn set_raw(&self, key: &str, value: &str, ttl: Duration) -> Result<(), DomainError>;

    /// Deletes a value; returns whether an entry existed
    async fn delete(&self, key: &str) -> Result<bool, DomainError>;

    /// Deletes every key matching a glob pattern, returning how many were removed
    async fn delete_pattern(&self, pattern: &str) -> Result<usize, DomainError>;

    /// Verifies the backend is reachable
    async fn ping(&self) -> Result<(), DomainError>;
}

#[cfg(test)]
pub mod mock {
    use super::*;
    use std::collections::HashMap;
    use std::sync::Mutex;

    use crate::domain::cache::GlobPattern;

    /// Mock cache for testing
    #[derive(Debug)]
    pub struct MockCache {
        entries: Mutex<HashMap<String, (String, Duration)>>,
        error: Mutex<Option<String>>,
    }

    impl Default for MockCache {
        fn default() -> Self {
            Self::new()
        }
    }

    impl MockCache {
        pub fn new() -> Self {
            Self {
                entries: Mutex::new(HashMap::new()),
                error: Mutex::new(None),
            }
        }

        pub fn with_raw_entry(self, key: &str, raw: &str) -> Self {
            self.entries
                .lock()
                .unwrap()
                .insert(key.to_string(), (raw.to_string(), Duration::from_secs(60)));
            self
        }

        pub fn with_error(self, error: impl Into<String>) -> Self {
            *self.error.lock().unwrap() = Some(error.into());
            self
        }

        pub fn ttl_of(&self, key: &str) -> Option<Duration> {
            self.entries.lock().unwrap().get(key).map(|(_, ttl)| *ttl)
        }

        pub fn keys(&self) -> Vec<String> {
            self.entries.lock().unwrap().keys().cloned().collect()
        }

        fn check_error(&self) -> Result<(), DomainError> {
            if let Some(error) = self.error.lock().unwrap().clone() {
                return Err(DomainError::cache(error));
            }
            Ok(())
        }
    }

    #[async_trait]
    impl Cache for MockCache {
        async fn get_raw(&self, key: &str) -> Result<Option<String>, DomainError> {
            self.check_error()?;
            let entries = self.entries.lock().unwrap();

            Ok(entries.get(key).map(|(json, _)| json.clone()))
        }

        async fn set_raw(&self, key: &str, value: &str, ttl: Duration) -> Result<(), DomainError> {
            self.check_error()?;
            self.entries
                .lock()
                .unwrap()
                .insert(key.to_string(), (value.to_string(), ttl));
            Ok(())
        }

        async fn delete(&self, key: &str) -> Result<bool, DomainError> {
            self.check_error()?;
            Ok(self.entries.lock().unwrap().remove(key).is_some())
        }

        async fn delete_pattern(&self, pattern: &str) -> Result<usize, DomainError> {
            self.check_error()?;

            let glob = GlobPattern::new(pattern)?;
            let mut entries = self.entries.lock().unwrap();
            let before = entries.len();

            entries.retain(|k, _| !glob.matches(k));

            Ok(before - entries.len())
        }

        async fn ping(&self) -> Result<(), DomainError> {
            self.check_error()
        }
    }

    #[cfg(test)]
    mod tests {
        use super::*;

        #[tokio::test]
        async fn test_mock_cache_set_get() {
            let cache = MockCache::new();
            cache
                .set_raw("key1", "\"value1\"", Duration::from_secs(60))
                .await
                .unwrap();

            let result = cache.get_raw("key1").await.unwrap();
            assert_eq!(result, Some("\"value1\"".to_string()));
            assert_eq!(cache.ttl_of("key1"), Some(Duration::from_secs(60)));
        }

        #[tokio::test]
        async fn test_mock_cache_with_error() {
            let cache = MockCache::new().with_error("connection refused");

            assert!(cache.get_raw("key").await.is_err());
            assert!(cache.ping().await.is_err());
        }

        #[tokio::test]
        async fn test_mock_cache_delete_pattern() {
            let cache = MockCache::new()
                .with_raw_entry("user:1:profile", "1")
                .with_raw_entry("user:2:profile", "2")
                .with_raw_entry("other:key", "3");

            let deleted = cache.delete_pattern("user:*:profile").await.unwrap();
            assert_eq!(deleted, 2);
            assert_eq!(cache.keys(), vec!["other:key".to_string()]);
        }
    }
}
