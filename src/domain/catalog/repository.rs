//! Storage seams for the catalog
//!
//! The read traits are the query engine: each `list` returns the requested
//! window plus the count of all matching rows, computed with the same
//! predicate. [`DatasetRepository`] covers the dataset-wide mutations.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use super::order::{NewOrder, OrderQuery, OrderRecord};
use super::product::{NewProduct, Product, ProductQuery};
use super::query::Listing;
use super::user::{NewUser, User, UserQuery};
use crate::domain::DomainError;

#[cfg(test)]
use mockall::automock;

#[cfg_attr(test, automock)]
#[async_trait]
pub trait ProductRepository: Send + Sync {
    async fn list(&self, query: &ProductQuery) -> Result<Listing<Product>, DomainError>;

    async fn find_by_id(&self, id: i64) -> Result<Option<Product>, DomainError>;
}

#[cfg_attr(test, automock)]
#[async_trait]
pub trait UserRepository: Send + Sync {
    async fn list(&self, query: &UserQuery) -> Result<Listing<User>, DomainError>;

    async fn find_by_id(&self, id: i64) -> Result<Option<User>, DomainError>;
}

/// Order reads always carry the one-hop user/product expansion
#[cfg_attr(test, automock)]
#[async_trait]
pub trait OrderRepository: Send + Sync {
    async fn list(&self, query: &OrderQuery) -> Result<Listing<OrderRecord>, DomainError>;

    async fn find_by_id(&self, id: i64) -> Result<Option<OrderRecord>, DomainError>;
}

/// Aggregate counts across the dataset
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DatasetStats {
    pub total_products: u64,
    pub total_users: u64,
    pub total_orders: u64,
    pub active_products: u64,
    pub active_users: u64,
}

/// Rows removed per entity by a truncate
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeletedCounts {
    pub orders: u64,
    pub users: u64,
    pub products: u64,
}

#[cfg_attr(test, automock)]
#[async_trait]
pub trait DatasetRepository: Send + Sync {
    async fn stats(&self) -> Result<DatasetStats, DomainError>;

    /// Deletes every order, user and product atomically; on failure nothing
    /// is deleted
    async fn truncate_all(&self) -> Result<DeletedCounts, DomainError>;

    /// Inserts one batch, returning the number of rows written
    async fn insert_products(&self, batch: Vec<NewProduct>) -> Result<u64, DomainError>;

    async fn insert_users(&self, batch: Vec<NewUser>) -> Result<u64, DomainError>;

    async fn insert_orders(&self, batch: Vec<NewOrder>) -> Result<u64, DomainError>;

    async fn product_ids(&self) -> Result<Vec<i64>, DomainError>;

    async fn user_ids(&self) -> Result<Vec<i64>, DomainError>;

    /// Verifies storage is reachable
    async fn ping(&self) -> Result<(), DomainError>;
}
