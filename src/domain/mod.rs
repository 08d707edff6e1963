//! Domain layer - Core entities, query rules and cache abstractions

pub mod cache;
pub mod catalog;
pub mod error;

pub use cache::{Cache, CacheKeyGenerator, CacheKeyParams, CacheLookup, CacheOutcome, CacheStore};
pub use catalog::{
    DatasetRepository, DatasetStats, DeletedCounts, OrderRepository, Page, PageRequest,
    ProductRepository, UserRepository,
};
pub use error::DomainError;
