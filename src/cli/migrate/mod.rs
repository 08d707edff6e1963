//! Migrate command - PostgreSQL schema management

use anyhow::bail;
use clap::Args;
use tracing::info;

use crate::config::AppConfig;
use crate::infrastructure::storage::{
    connect_pool, revert_last_migration, run_catalog_migrations, PostgresConfig, StorageType,
};

#[derive(Debug, Clone, Default, Args)]
pub struct MigrateArgs {
    /// Roll back the most recently applied migration instead
    #[arg(long)]
    pub revert: bool,
}

pub async fn run(config: AppConfig, args: MigrateArgs) -> anyhow::Result<()> {
    if config.storage.backend != StorageType::Postgres {
        bail!(
            "migrations require the postgres storage backend (configured: {})",
            config.storage.backend
        );
    }

    let pool = connect_pool(&PostgresConfig::from(&config.storage)).await?;

    if args.revert {
        match revert_last_migration(&pool).await? {
            Some(version) => info!(version, "Reverted migration"),
            None => info!("No applied migrations to revert"),
        }
    } else {
        let applied = run_catalog_migrations(&pool).await?;
        info!(applied, "Migrations complete");
    }

    pool.close().await;
    Ok(())
}
