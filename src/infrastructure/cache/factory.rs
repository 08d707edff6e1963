//! Cache factory for runtime selection

use std::sync::Arc;
use std::time::Duration;

use serde::Deserialize;
use tracing::info;

use crate::config::CacheConfig;
use crate::domain::cache::Cache;
use crate::domain::DomainError;

use super::in_memory::{InMemoryCache, InMemoryCacheConfig};
use super::redis::{RedisCache, RedisCacheConfig};

/// Supported cache types
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CacheType {
    /// In-memory cache using moka
    #[serde(alias = "memory", alias = "inmemory")]
    InMemory,
    /// Redis cache
    #[default]
    Redis,
}

impl std::fmt::Display for CacheType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CacheType::InMemory => write!(f, "in_memory"),
            CacheType::Redis => write!(f, "redis"),
        }
    }
}

impl std::str::FromStr for CacheType {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "in_memory" | "inmemory" | "memory" => Ok(CacheType::InMemory),
            "redis" => Ok(CacheType::Redis),
            _ => Err(DomainError::configuration(format!(
                "Unknown cache type: {}. Valid types: in_memory, redis",
                s
            ))),
        }
    }
}

/// Factory for creating cache backends
#[derive(Debug, Default)]
pub struct CacheFactory;

impl CacheFactory {
    pub fn new() -> Self {
        Self
    }

    /// Creates the configured backend; Redis connects lazily on first use
    pub fn create(&self, config: &CacheConfig) -> Result<Arc<dyn Cache>, DomainError> {
        match config.backend {
            CacheType::InMemory => {
                let longest_ttl = config
                    .list_ttl_secs
                    .max(config.item_ttl_secs)
                    .max(config.stats_ttl_secs)
                    .max(1);

                let in_memory_config = InMemoryCacheConfig::default()
                    .with_max_capacity(config.max_capacity)
                    .with_max_ttl(Duration::from_secs(longest_ttl));

                info!(capacity = config.max_capacity, "Using in-memory cache");
                Ok(Arc::new(InMemoryCache::with_config(in_memory_config)))
            }
            CacheType::Redis => {
                if config.redis_url.is_empty() {
                    return Err(DomainError::configuration(
                        "Redis URL is required for Redis cache type",
                    ));
                }

                let mut redis_config = RedisCacheConfig::new(config.redis_url.clone())
                    .with_operation_timeout(Duration::from_millis(config.operation_timeout_ms));

                if let Some(prefix) = config.key_prefix.as_ref().filter(|p| !p.is_empty()) {
                    redis_config = redis_config.with_key_prefix(prefix.clone());
                }

                info!(prefix = ?redis_config.key_prefix, "Using Redis cache");
                Ok(Arc::new(RedisCache::new(redis_config)?))
            }
        }
    }
}
