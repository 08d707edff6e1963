//! Catalog Data API
//!
//! Paginated, filterable and sortable read access to a product / user /
//! order catalog, served through a look-aside cache. Reads degrade to the
//! database when the cache is unreachable; bulk mutations (truncate and
//! reseed) invalidate every cached entry.

pub mod api;
pub mod cli;
pub mod config;
pub mod domain;
pub mod infrastructure;

pub use config::AppConfig;

use anyhow::Context;
use tracing::info;

use api::state::AppState;
use domain::cache::CacheStore;
use infrastructure::cache::CacheFactory;
use infrastructure::services::{BulkInvalidator, CacheTtlPolicy, CatalogService, DatasetService};
use infrastructure::storage::{CatalogStorage, StorageFactory};

/// Fully wired services for one process
#[derive(Debug, Clone)]
pub struct AppContext {
    pub config: AppConfig,
    pub storage: CatalogStorage,
    pub cache: CacheStore,
    pub catalog: CatalogService,
    pub dataset: DatasetService,
}

impl AppContext {
    /// Connects storage and cache from `config`. With `migrate`, pending
    /// PostgreSQL migrations are applied before anything else runs.
    pub async fn build(config: AppConfig, migrate: bool) -> anyhow::Result<Self> {
        let storage = StorageFactory::create(&config.storage, migrate)
            .await
            .context("failed to initialize storage")?;

        let backend = CacheFactory::new()
            .create(&config.cache)
            .context("failed to initialize cache")?;
        let cache = CacheStore::new(backend);

        Ok(Self::with_parts(config, storage, cache))
    }

    /// Assembles services over an already constructed storage and cache
    pub fn with_parts(config: AppConfig, storage: CatalogStorage, cache: CacheStore) -> Self {
        let catalog = CatalogService::new(
            storage.products.clone(),
            storage.users.clone(),
            storage.orders.clone(),
            storage.dataset.clone(),
            cache.clone(),
            CacheTtlPolicy::from(&config.cache),
        );
        let dataset = DatasetService::new(storage.dataset.clone(), BulkInvalidator::new(cache.clone()));

        Self {
            config,
            storage,
            cache,
            catalog,
            dataset,
        }
    }

    pub fn app_state(&self) -> AppState {
        AppState::new(self.catalog.clone(), self.dataset.clone(), self.cache.clone())
    }

    pub async fn shutdown(&self) {
        self.storage.close().await;
        info!(backend = %self.storage.backend(), "Storage connections closed");
    }
}
