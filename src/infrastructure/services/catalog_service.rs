//! Catalog read path: look-aside cache in front of the query engine

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use metrics::counter;
use serde::{de::DeserializeOwned, Serialize};
use tracing::debug;

use crate::config::CacheConfig;
use crate::domain::cache::{CacheKeyGenerator, CacheKeyParams, CacheLookup, CacheStore, QueryKeyEncoder};
use crate::domain::catalog::{
    DatasetRepository, DatasetStats, OrderQuery, OrderRepository, OrderView, Page, ProductQuery,
    ProductRepository, ProductView, UserQuery, UserRepository, UserView,
};
use crate::domain::DomainError;

/// Per-endpoint expiry for cached responses
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CacheTtlPolicy {
    pub list: Duration,
    pub item: Duration,
    pub stats: Duration,
}

impl Default for CacheTtlPolicy {
    fn default() -> Self {
        Self {
            list: Duration::from_secs(300),
            item: Duration::from_secs(600),
            stats: Duration::from_secs(60),
        }
    }
}

impl From<&CacheConfig> for CacheTtlPolicy {
    fn from(config: &CacheConfig) -> Self {
        Self {
            list: Duration::from_secs(config.list_ttl_secs),
            item: Duration::from_secs(config.item_ttl_secs),
            stats: Duration::from_secs(config.stats_ttl_secs),
        }
    }
}

/// Read-only catalog operations, each served from the cache when possible
#[derive(Clone)]
pub struct CatalogService {
    products: Arc<dyn ProductRepository>,
    users: Arc<dyn UserRepository>,
    orders: Arc<dyn OrderRepository>,
    dataset: Arc<dyn DatasetRepository>,
    cache: CacheStore,
    keys: QueryKeyEncoder,
    ttl: CacheTtlPolicy,
}

impl std::fmt::Debug for CatalogService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CatalogService")
            .field("cache", &self.cache)
            .field("ttl", &self.ttl)
            .finish_non_exhaustive()
    }
}

fn require_positive_id(id: i64, entity: &str) -> Result<(), DomainError> {
    if id < 1 {
        return Err(DomainError::validation(format!(
            "{} ID must be greater than 0",
            entity
        )));
    }
    Ok(())
}

impl CatalogService {
    pub fn new(
        products: Arc<dyn ProductRepository>,
        users: Arc<dyn UserRepository>,
        orders: Arc<dyn OrderRepository>,
        dataset: Arc<dyn DatasetRepository>,
        cache: CacheStore,
        ttl: CacheTtlPolicy,
    ) -> Self {
        Self {
            products,
            users,
            orders,
            dataset,
            cache,
            keys: QueryKeyEncoder::new(),
            ttl,
        }
    }

    /// Look-aside read: cached value on a hit, otherwise `load` and populate.
    ///
    /// Errors from `load` (including not-found) are returned without
    /// touching the cache.
    async fn read_through<T, F, Fut>(
        &self,
        endpoint: &'static str,
        params: CacheKeyParams,
        ttl: Duration,
        load: F,
    ) -> Result<T, DomainError>
    where
        T: Serialize + DeserializeOwned,
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<T, DomainError>>,
    {
        let key = self.keys.generate(&params);

        if let CacheLookup::Hit(value) = self.cache.get::<T>(&key).await {
            counter!("cache_lookups_total", "endpoint" => endpoint, "outcome" => "hit").increment(1);
            debug!(endpoint, key = %key, "Cache hit");
            return Ok(value);
        }

        counter!("cache_lookups_total", "endpoint" => endpoint, "outcome" => "miss").increment(1);
        debug!(endpoint, key = %key, "Cache miss");

        let value = load().await?;

        if !self.cache.set(&key, &value, ttl).await.is_done() {
            debug!(endpoint, key = %key, "Response served without populating cache");
        }

        Ok(value)
    }

    pub async fn list_products(&self, query: &ProductQuery) -> Result<Page<ProductView>, DomainError> {
        self.read_through("products", query.key_params("products"), self.ttl.list, || async {
            let listing = self.products.list(query).await?;
            Ok::<_, DomainError>(Page::from_listing(listing, query.page, ProductView::from))
        })
        .await
    }

    pub async fn get_product(&self, id: i64) -> Result<ProductView, DomainError> {
        require_positive_id(id, "Product")?;

        let params = CacheKeyParams::new("product").with_component("id", id);
        self.read_through("product", params, self.ttl.item, || async {
            self.products
                .find_by_id(id)
                .await?
                .map(ProductView::from)
                .ok_or_else(|| DomainError::not_found("Product not found"))
        })
        .await
    }

    pub async fn list_users(&self, query: &UserQuery) -> Result<Page<UserView>, DomainError> {
        self.read_through("users", query.key_params("users"), self.ttl.list, || async {
            let listing = self.users.list(query).await?;
            Ok::<_, DomainError>(Page::from_listing(listing, query.page, UserView::from))
        })
        .await
    }

    pub async fn get_user(&self, id: i64) -> Result<UserView, DomainError> {
        require_positive_id(id, "User")?;

        let params = CacheKeyParams::new("user").with_component("id", id);
        self.read_through("user", params, self.ttl.item, || async {
            self.users
                .find_by_id(id)
                .await?
                .map(UserView::from)
                .ok_or_else(|| DomainError::not_found("User not found"))
        })
        .await
    }

    pub async fn list_orders(&self, query: &OrderQuery) -> Result<Page<OrderView>, DomainError> {
        self.read_through("orders", query.key_params("orders"), self.ttl.list, || async {
            let listing = self.orders.list(query).await?;
            Ok::<_, DomainError>(Page::from_listing(listing, query.page, OrderView::from))
        })
        .await
    }

    pub async fn get_order(&self, id: i64) -> Result<OrderView, DomainError> {
        require_positive_id(id, "Order")?;

        let params = CacheKeyParams::new("order").with_component("id", id);
        self.read_through("order", params, self.ttl.item, || async {
            self.orders
                .find_by_id(id)
                .await?
                .map(OrderView::from)
                .ok_or_else(|| DomainError::not_found("Order not found"))
        })
        .await
    }

    pub async fn stats(&self) -> Result<DatasetStats, DomainError> {
        self.read_through("stats", CacheKeyParams::new("stats"), self.ttl.stats, || async {
            self.dataset.stats().await
        })
        .await
    }
}
