//! Storage infrastructure - Catalog storage backends

mod factory;
mod in_memory;
pub mod migrations;
mod postgres;

pub use factory::{CatalogStorage, StorageFactory, StorageType};
pub use in_memory::InMemoryCatalog;
pub use migrations::{
    catalog_migrations, revert_last_migration, run_catalog_migrations, Migration, PostgresMigrator,
};
pub use postgres::{connect_pool, PostgresCatalog, PostgresConfig};

#[cfg(test)]
pub use in_memory::fixtures;
