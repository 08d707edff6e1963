//! Dataset-wide mutations: truncate and reseed, each followed by a full
//! cache invalidation

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tracing::{error, info};

use crate::domain::catalog::{DatasetRepository, DeletedCounts};
use crate::domain::DomainError;
use crate::infrastructure::seed::{SeedPlan, SeedReport, Seeder};

use super::invalidation::BulkInvalidator;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TruncateReport {
    pub message: String,
    pub deleted_counts: DeletedCounts,
    pub cache_cleared: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SeedOutcome {
    pub message: String,
    pub seeded: SeedReport,
    pub cache_cleared: bool,
}

#[derive(Clone)]
pub struct DatasetService {
    dataset: Arc<dyn DatasetRepository>,
    seeder: Seeder,
    invalidator: BulkInvalidator,
}

impl std::fmt::Debug for DatasetService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DatasetService")
            .field("invalidator", &self.invalidator)
            .finish_non_exhaustive()
    }
}

/// Retryable failures keep their kind so callers can back off
fn wrap_failure(context: &str, e: DomainError) -> DomainError {
    match e {
        DomainError::Unavailable { .. } => e,
        other => DomainError::internal(format!("{}: {}", context, other)),
    }
}

impl DatasetService {
    pub fn new(dataset: Arc<dyn DatasetRepository>, invalidator: BulkInvalidator) -> Self {
        Self {
            seeder: Seeder::new(dataset.clone()),
            dataset,
            invalidator,
        }
    }

    /// Deletes every order, user and product in one transaction.
    ///
    /// The cache is cleared whether or not the delete succeeded; counts are
    /// only reported for a fully committed delete.
    pub async fn truncate_all(&self) -> Result<TruncateReport, DomainError> {
        let result = self.dataset.truncate_all().await;
        let cache_cleared = self.invalidator.invalidate_all().await.is_done();

        let deleted_counts = result.map_err(|e| {
            error!(error = %e, "Truncate failed and was rolled back");
            wrap_failure("Failed to truncate data", e)
        })?;

        info!(
            orders = deleted_counts.orders,
            users = deleted_counts.users,
            products = deleted_counts.products,
            cache_cleared,
            "All data truncated"
        );

        Ok(TruncateReport {
            message: "All data truncated successfully".to_string(),
            deleted_counts,
            cache_cleared,
        })
    }

    /// Bulk loads synthetic data, then clears the cache
    pub async fn seed(&self, plan: &SeedPlan) -> Result<SeedOutcome, DomainError> {
        let result = self.seeder.run(plan).await;
        let cache_cleared = self.invalidator.invalidate_all().await.is_done();

        let seeded = result.map_err(|e| {
            error!(error = %e, "Seeding failed");
            wrap_failure("Failed to seed data", e)
        })?;

        Ok(SeedOutcome {
            message: "Database seeded successfully".to_string(),
            seeded,
            cache_cleared,
        })
    }

    /// Verifies storage answers
    pub async fn check_storage(&self) -> Result<(), DomainError> {
        self.dataset.ping().await
    }
}
