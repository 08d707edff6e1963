//! Infrastructure services

mod catalog_service;
mod dataset_service;
mod invalidation;

pub use catalog_service::{CacheTtlPolicy, CatalogService};
pub use dataset_service::{DatasetService, SeedOutcome, TruncateReport};
pub use invalidation::{BulkInvalidator, ALL_KEYS};
