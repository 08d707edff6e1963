//! Redis cache implementation

use std::fmt;
use std::future::Future;
use std::time::Duration;

use async_trait::async_trait;
use redis::aio::ConnectionManager;
use redis::{AsyncCommands, Client, RedisError};
use tokio::sync::OnceCell;

use crate::domain::cache::Cache;
use crate::domain::DomainError;

/// Configuration for Redis cache
#[derive(Debug, Clone)]
pub struct RedisCacheConfig {
    /// Redis connection URL (e.g., "redis://127.0.0.1:6379")
    pub url: String,
    /// Key prefix for namespacing
    pub key_prefix: Option<String>,
    /// Upper bound on every command, connection setup included
    pub operation_timeout: Duration,
}

impl Default for RedisCacheConfig {
    fn default() -> Self {
        Self {
            url: "redis://127.0.0.1:6379".to_string(),
            key_prefix: None,
            operation_timeout: Duration::from_millis(500),
        }
    }
}

impl RedisCacheConfig {
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            ..Default::default()
        }
    }

    pub fn with_key_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.key_prefix = Some(prefix.into());
        self
    }

    pub fn with_operation_timeout(mut self, timeout: Duration) -> Self {
        self.operation_timeout = timeout;
        self
    }
}

/// Redis cache backend
///
/// The connection is established on first use and reused afterwards, so an
/// unreachable server at startup only turns into per-operation errors.
pub struct RedisCache {
    client: Client,
    connection: OnceCell<ConnectionManager>,
    config: RedisCacheConfig,
}

impl fmt::Debug for RedisCache {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RedisCache")
            .field("config", &self.config)
            .field("connected", &self.connection.initialized())
            .finish()
    }
}

impl RedisCache {
    /// Validates the URL; does not connect
    pub fn new(config: RedisCacheConfig) -> Result<Self, DomainError> {
        let client = Client::open(config.url.as_str())
            .map_err(|e| DomainError::configuration(format!("Invalid Redis URL: {}", e)))?;

        Ok(Self {
            client,
            connection: OnceCell::new(),
            config,
        })
    }

    fn prefix_key(&self, key: &str) -> String {
        match &self.config.key_prefix {
            Some(prefix) => format!("{}:{}", prefix, key),
            None => key.to_string(),
        }
    }

    async fn connection(&self) -> Result<ConnectionManager, DomainError> {
        let manager = self
            .connection
            .get_or_try_init(|| async {
                ConnectionManager::new(self.client.clone())
                    .await
                    .map_err(|e| DomainError::cache(format!("Failed to connect to Redis: {}", e)))
            })
            .await?;

        Ok(manager.clone())
    }

    /// Runs one command against a fresh handle, bounded by the operation timeout
    async fn run<T, F, Fut>(&self, op: &str, f: F) -> Result<T, DomainError>
    where
        F: FnOnce(ConnectionManager) -> Fut,
        Fut: Future<Output = Result<T, RedisError>>,
    {
        let timeout = self.config.operation_timeout;

        let work = async {
            let conn = self.connection().await?;
            f(conn)
                .await
                .map_err(|e| DomainError::cache(format!("Redis {} failed: {}", op, e)))
        };

        tokio::time::timeout(timeout, work)
            .await
            .map_err(|_| DomainError::cache(format!("Redis {} timed out after {:?}", op, timeout)))?
    }
}

#[async_trait]
impl Cache for RedisCache {
    async fn get_raw(&self, key: &str) -> Result<Option<String>, DomainError> {
        let key = self.prefix_key(key);

        self.run("GET", |mut conn| async move { conn.get(&key).await })
            .await
    }

    async fn set_raw(&self, key: &str, value: &str, ttl: Duration) -> Result<(), DomainError> {
        let key = self.prefix_key(key);
        let ttl_secs = ttl.as_secs().max(1);

        self.run("SETEX", |mut conn| async move {
            conn.set_ex::<_, _, ()>(&key, value, ttl_secs).await
        })
        .await
    }

    async fn delete(&self, key: &str) -> Result<bool, DomainError> {
        let key = self.prefix_key(key);

        let deleted: i64 = self
            .run("DEL", |mut conn| async move { conn.del(&key).await })
            .await?;

        Ok(deleted > 0)
    }

    async fn delete_pattern(&self, pattern: &str) -> Result<usize, DomainError> {
        let pattern = self.prefix_key(pattern);

        self.run("SCAN/DEL", |mut conn| async move {
            let mut cursor = 0u64;
            let mut total_deleted = 0usize;

            loop {
                let (next, keys): (u64, Vec<String>) = redis::cmd("SCAN")
                    .arg(cursor)
                    .arg("MATCH")
                    .arg(&pattern)
                    .arg("COUNT")
                    .arg(100)
                    .query_async(&mut conn)
                    .await?;

                if !keys.is_empty() {
                    let deleted: i64 = conn.del(&keys).await?;
                    total_deleted += deleted as usize;
                }

                cursor = next;

                if cursor == 0 {
                    break;
                }
            }

            Ok::<_, RedisError>(total_deleted)
        })
        .await
    }

    async fn ping(&self) -> Result<(), DomainError> {
        self.run("PING", |mut conn| async move {
            redis::cmd("PING").query_async::<String>(&mut conn).await
        })
        .await
        .map(|_| ())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    // Port 1 is reserved and refuses connections
    fn unreachable() -> RedisCache {
        let config = RedisCacheConfig::new("redis://127.0.0.1:1")
            .with_key_prefix("test")
            .with_operation_timeout(Duration::from_millis(200));

        RedisCache::new(config).unwrap()
    }

    #[test]
    fn test_key_prefix() {
        let cache = unreachable();
        assert_eq!(cache.prefix_key("abc"), "test:abc");

        let bare = RedisCache::new(RedisCacheConfig::new("redis://localhost")).unwrap();
        assert_eq!(bare.prefix_key("abc"), "abc");
    }

    #[test]
    fn test_invalid_url_is_configuration_error() {
        let result = RedisCache::new(RedisCacheConfig::new("not a url"));
        assert!(matches!(result, Err(DomainError::Configuration { .. })));
    }

    #[tokio::test]
    async fn test_unreachable_server_reports_errors() {
        let cache = unreachable();

        assert!(cache.get_raw("k").await.is_err());
        assert!(cache.set_raw("k", "v", Duration::from_secs(1)).await.is_err());
        assert!(cache.delete_pattern("*").await.is_err());
        assert!(cache.ping().await.is_err());
    }

    #[tokio::test]
    #[ignore = "Requires running Redis instance"]
    async fn test_redis_round_trip() {
        let cache = RedisCache::new(
            RedisCacheConfig::new("redis://127.0.0.1:6379").with_key_prefix("catalog-test"),
        )
        .unwrap();

        cache.set_raw("key1", "\"value1\"", Duration::from_secs(60)).await.unwrap();
        assert_eq!(cache.get_raw("key1").await.unwrap(), Some("\"value1\"".to_string()));

        assert_eq!(cache.delete_pattern("*").await.unwrap(), 1);
        assert_eq!(cache.delete_pattern("*").await.unwrap(), 0);
    }
}
