//! Seed and truncate commands, run against storage without the HTTP server

use clap::Args;
use tracing::{info, warn};

use crate::config::AppConfig;
use crate::infrastructure::seed::{
    SeedPlan, DEFAULT_BATCH_SIZE, DEFAULT_ORDERS, DEFAULT_PRODUCTS, DEFAULT_USERS,
};
use crate::infrastructure::storage::StorageType;
use crate::AppContext;

#[derive(Debug, Clone, Args)]
pub struct SeedArgs {
    #[arg(long, default_value_t = DEFAULT_PRODUCTS)]
    pub products: usize,

    #[arg(long, default_value_t = DEFAULT_USERS)]
    pub users: usize,

    #[arg(long, default_value_t = DEFAULT_ORDERS)]
    pub orders: usize,

    /// Fixed RNG seed for reproducible data
    #[arg(long)]
    pub seed: Option<u64>,

    #[arg(long, default_value_t = DEFAULT_BATCH_SIZE)]
    pub batch_size: usize,
}

impl SeedArgs {
    pub fn plan(&self) -> SeedPlan {
        let plan = SeedPlan::new(self.products, self.users, self.orders)
            .with_batch_size(self.batch_size);

        match self.seed {
            Some(seed) => plan.with_seed(seed),
            None => plan,
        }
    }
}

pub async fn seed(config: AppConfig, args: SeedArgs) -> anyhow::Result<()> {
    let context = connect(config).await?;

    let outcome = context.dataset.seed(&args.plan()).await;
    context.shutdown().await;
    let outcome = outcome?;

    info!(cache_cleared = outcome.cache_cleared, "{}", outcome.message);
    println!("{}", serde_json::to_string_pretty(&outcome)?);

    Ok(())
}

pub async fn truncate(config: AppConfig) -> anyhow::Result<()> {
    let context = connect(config).await?;

    let report = context.dataset.truncate_all().await;
    context.shutdown().await;
    let report = report?;

    info!(cache_cleared = report.cache_cleared, "{}", report.message);
    println!("{}", serde_json::to_string_pretty(&report)?);

    Ok(())
}

async fn connect(config: AppConfig) -> anyhow::Result<AppContext> {
    if config.storage.backend == StorageType::InMemory {
        warn!("In-memory storage is discarded when this command exits");
    }

    let migrate = config.storage.backend == StorageType::Postgres;
    AppContext::build(config, migrate).await
}
