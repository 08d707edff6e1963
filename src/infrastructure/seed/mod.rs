//! Bulk loader generating a synthetic catalog
//!
//! Products and users are generated first; orders then reference the ids
//! that actually exist in storage. Every entity is written in fixed-size
//! batches.

mod generator;

use std::sync::Arc;

use chrono::{DateTime, Utc};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::domain::catalog::DatasetRepository;
use crate::domain::DomainError;

pub use generator::{BRANDS, CATEGORIES};

pub const DEFAULT_PRODUCTS: usize = 50_000;
pub const DEFAULT_USERS: usize = 25_000;
pub const DEFAULT_ORDERS: usize = 100_000;
pub const DEFAULT_BATCH_SIZE: usize = 1_000;

/// How much to generate
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SeedPlan {
    pub products: usize,
    pub users: usize,
    pub orders: usize,
    pub batch_size: usize,
    /// RNG seed; `None` draws one from the OS
    pub seed: Option<u64>,
}

impl Default for SeedPlan {
    fn default() -> Self {
        Self {
            products: DEFAULT_PRODUCTS,
            users: DEFAULT_USERS,
            orders: DEFAULT_ORDERS,
            batch_size: DEFAULT_BATCH_SIZE,
            seed: None,
        }
    }
}

impl SeedPlan {
    pub fn new(products: usize, users: usize, orders: usize) -> Self {
        Self {
            products,
            users,
            orders,
            ..Default::default()
        }
    }

    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }

    pub fn with_batch_size(mut self, batch_size: usize) -> Self {
        self.batch_size = batch_size.max(1);
        self
    }
}

/// Rows written per entity
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SeedReport {
    pub products: u64,
    pub users: u64,
    pub orders: u64,
}

#[derive(Clone)]
pub struct Seeder {
    dataset: Arc<dyn DatasetRepository>,
}

impl std::fmt::Debug for Seeder {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Seeder").finish_non_exhaustive()
    }
}

impl Seeder {
    pub fn new(dataset: Arc<dyn DatasetRepository>) -> Self {
        Self { dataset }
    }

    pub async fn run(&self, plan: &SeedPlan) -> Result<SeedReport, DomainError> {
        self.run_at(plan, Utc::now()).await
    }

    /// Seeds with timestamps relative to `now`
    pub async fn run_at(&self, plan: &SeedPlan, now: DateTime<Utc>) -> Result<SeedReport, DomainError> {
        let mut rng = match plan.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };
        let batch_size = plan.batch_size.max(1);
        let mut report = SeedReport::default();

        info!(
            products = plan.products,
            users = plan.users,
            orders = plan.orders,
            "Starting data seeding"
        );

        for start in (0..plan.products).step_by(batch_size) {
            let end = (start + batch_size).min(plan.products);
            let batch = (start..end).map(|_| generator::product(&mut rng, now)).collect();

            report.products += self.dataset.insert_products(batch).await?;
            info!(seeded = end, total = plan.products, "Seeded products");
        }

        // Per-run token so reseeding does not collide with earlier emails
        let run_token = format!("{:08x}", rng.gen_range(0..=u32::MAX));

        for start in (0..plan.users).step_by(batch_size) {
            let end = (start + batch_size).min(plan.users);
            let batch = (start..end)
                .map(|i| generator::user(&mut rng, now, &format!("{}{}", run_token, i)))
                .collect();

            report.users += self.dataset.insert_users(batch).await?;
            info!(seeded = end, total = plan.users, "Seeded users");
        }

        if plan.orders > 0 {
            report.orders = self.seed_orders(&mut rng, plan, batch_size, now).await?;
        }

        info!(
            products = report.products,
            users = report.users,
            orders = report.orders,
            "Data seeding completed"
        );

        Ok(report)
    }

    async fn seed_orders(
        &self,
        rng: &mut StdRng,
        plan: &SeedPlan,
        batch_size: usize,
        now: DateTime<Utc>,
    ) -> Result<u64, DomainError> {
        let user_ids = self.dataset.user_ids().await?;
        let product_ids = self.dataset.product_ids().await?;

        if user_ids.is_empty() || product_ids.is_empty() {
            warn!("No users or products found, skipping orders");
            return Ok(0);
        }

        let mut written = 0;

        for start in (0..plan.orders).step_by(batch_size) {
            let end = (start + batch_size).min(plan.orders);
            let batch = (start..end)
                .map(|_| generator::order(rng, now, &user_ids, &product_ids))
                .collect();

            written += self.dataset.insert_orders(batch).await?;
            info!(seeded = end, total = plan.orders, "Seeded orders");
        }

        Ok(written)
    }
}
