//! Storage factory for runtime backend selection

use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

use serde::Deserialize;
use sqlx::postgres::PgPool;
use tracing::info;

use crate::config::StorageConfig;
use crate::domain::catalog::{
    DatasetRepository, OrderRepository, ProductRepository, UserRepository,
};
use crate::domain::DomainError;

use super::in_memory::InMemoryCatalog;
use super::migrations::run_catalog_migrations;
use super::postgres::{connect_pool, PostgresCatalog, PostgresConfig};

/// Supported storage types
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StorageType {
    /// In-memory storage (for testing/development)
    #[serde(alias = "memory", alias = "inmemory")]
    InMemory,
    /// PostgreSQL storage
    #[default]
    #[serde(alias = "postgresql", alias = "pg")]
    Postgres,
}

impl fmt::Display for StorageType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StorageType::InMemory => write!(f, "in_memory"),
            StorageType::Postgres => write!(f, "postgres"),
        }
    }
}

impl FromStr for StorageType {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "memory" | "inmemory" | "in-memory" | "in_memory" => Ok(Self::InMemory),
            "postgres" | "postgresql" | "pg" => Ok(Self::Postgres),
            _ => Err(DomainError::configuration(format!(
                "Unknown storage type: {}. Valid types: in_memory, postgres",
                s
            ))),
        }
    }
}

/// One storage backend seen through every catalog repository seam
#[derive(Clone)]
pub struct CatalogStorage {
    pub products: Arc<dyn ProductRepository>,
    pub users: Arc<dyn UserRepository>,
    pub orders: Arc<dyn OrderRepository>,
    pub dataset: Arc<dyn DatasetRepository>,
    backend: StorageType,
    pool: Option<PgPool>,
}

impl fmt::Debug for CatalogStorage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CatalogStorage")
            .field("backend", &self.backend)
            .finish_non_exhaustive()
    }
}

impl CatalogStorage {
    /// Wraps a single value implementing every repository trait
    pub fn from_backend<B>(backend: Arc<B>, kind: StorageType) -> Self
    where
        B: ProductRepository + UserRepository + OrderRepository + DatasetRepository + 'static,
    {
        Self {
            products: backend.clone(),
            users: backend.clone(),
            orders: backend.clone(),
            dataset: backend,
            backend: kind,
            pool: None,
        }
    }

    pub fn in_memory() -> Self {
        Self::from_backend(Arc::new(InMemoryCatalog::new()), StorageType::InMemory)
    }

    pub fn backend(&self) -> StorageType {
        self.backend
    }

    /// The PostgreSQL pool, when that backend is in use
    pub fn pool(&self) -> Option<&PgPool> {
        self.pool.as_ref()
    }

    /// Closes pooled connections; a no-op for the in-memory backend
    pub async fn close(&self) {
        if let Some(pool) = &self.pool {
            pool.close().await;
        }
    }
}

/// Factory for creating catalog storage
#[derive(Debug, Default)]
pub struct StorageFactory;

impl StorageFactory {
    /// Creates the configured backend. For PostgreSQL, pending schema
    /// migrations are applied when `migrate` is set.
    pub async fn create(config: &StorageConfig, migrate: bool) -> Result<CatalogStorage, DomainError> {
        match config.backend {
            StorageType::InMemory => {
                info!("Using in-memory storage");
                Ok(CatalogStorage::in_memory())
            }
            StorageType::Postgres => {
                let pool = connect_pool(&PostgresConfig::from(config)).await?;

                if migrate {
                    let applied = run_catalog_migrations(&pool).await?;
                    info!(applied, "Catalog schema up to date");
                }

                info!(max_connections = config.max_connections, "Using PostgreSQL storage");

                let mut storage = CatalogStorage::from_backend(
                    Arc::new(PostgresCatalog::new(pool.clone())),
                    StorageType::Postgres,
                );
                storage.pool = Some(pool);
                Ok(storage)
            }
        }
    }
}
