//! Bulk cache invalidation after dataset-wide mutations

use metrics::counter;
use tracing::{error, info};

use crate::domain::cache::{CacheOutcome, CacheStore};

/// Pattern covering every cached response
pub const ALL_KEYS: &str = "*";

/// Clears every cached response. Failures are logged and reported, never
/// raised: an already committed mutation stays committed and stale entries
/// age out by TTL.
#[derive(Debug, Clone)]
pub struct BulkInvalidator {
    cache: CacheStore,
}

impl BulkInvalidator {
    pub fn new(cache: CacheStore) -> Self {
        Self { cache }
    }

    pub async fn invalidate_all(&self) -> CacheOutcome<usize> {
        let outcome = self.cache.clear_pattern(ALL_KEYS).await;

        match outcome {
            CacheOutcome::Done(removed) => {
                counter!("cache_invalidations_total", "outcome" => "success").increment(1);
                info!(removed, "Cache invalidated");
            }
            CacheOutcome::Failed => {
                counter!("cache_invalidations_total", "outcome" => "failure").increment(1);
                error!("Cache invalidation failed; stale entries expire by TTL");
            }
        }

        outcome
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;
    use std::time::Duration;

    use super::*;
    use crate::domain::cache::MockCache;

    #[tokio::test]
    async fn test_invalidate_removes_everything() {
        let cache = Arc::new(MockCache::new());
        let store = CacheStore::new(cache.clone());
        store.set("a", &1, Duration::from_secs(60)).await;
        store.set("b", &2, Duration::from_secs(60)).await;

        let invalidator = BulkInvalidator::new(store);

        assert_eq!(invalidator.invalidate_all().await, CacheOutcome::Done(2));
        assert!(cache.keys().is_empty());
    }

    #[tokio::test]
    async fn test_repeated_invalidation_is_idempotent() {
        let invalidator = BulkInvalidator::new(CacheStore::new(Arc::new(MockCache::new())));

        assert_eq!(invalidator.invalidate_all().await, CacheOutcome::Done(0));
        assert_eq!(invalidator.invalidate_all().await, CacheOutcome::Done(0));
    }

    #[tokio::test]
    async fn test_backend_failure_reported_not_raised() {
        let cache = Arc::new(MockCache::new().with_error("timeout"));
        let invalidator = BulkInvalidator::new(CacheStore::new(cache));

        assert_eq!(invalidator.invalidate_all().await, CacheOutcome::Failed);
    }
}
