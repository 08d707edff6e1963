//! Application state shared by every handler

use crate::domain::cache::CacheStore;
use crate::infrastructure::services::{CatalogService, DatasetService};

#[derive(Debug, Clone)]
pub struct AppState {
    pub catalog: CatalogService,
    pub dataset: DatasetService,
    /// Used directly only by the readiness probe
    pub cache: CacheStore,
}

impl AppState {
    pub fn new(catalog: CatalogService, dataset: DatasetService, cache: CacheStore) -> Self {
        Self {
            catalog,
            dataset,
            cache,
        }
    }
}
