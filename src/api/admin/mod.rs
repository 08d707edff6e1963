//! Dataset-wide mutation endpoints

use axum::{extract::State, Json};
use serde::Deserialize;
use validator::Validate;

use crate::api::state::AppState;
use crate::api::types::{ApiError, Query};
use crate::infrastructure::seed::SeedPlan;
use crate::infrastructure::services::{SeedOutcome, TruncateReport};

const MAX_SEED_ROWS: usize = 1_000_000;

/// Optional overrides for `POST /seed-data`; absent counts use the defaults
#[derive(Debug, Clone, Default, Deserialize, Validate)]
pub struct SeedParams {
    #[validate(range(max = 1_000_000, message = "products must be at most 1000000"))]
    pub products: Option<usize>,
    #[validate(range(max = 1_000_000, message = "users must be at most 1000000"))]
    pub users: Option<usize>,
    #[validate(range(max = 1_000_000, message = "orders must be at most 1000000"))]
    pub orders: Option<usize>,
    pub seed: Option<u64>,
}

impl SeedParams {
    pub fn plan(&self) -> SeedPlan {
        let defaults = SeedPlan::default();
        let mut plan = SeedPlan::new(
            self.products.unwrap_or(defaults.products).min(MAX_SEED_ROWS),
            self.users.unwrap_or(defaults.users).min(MAX_SEED_ROWS),
            self.orders.unwrap_or(defaults.orders).min(MAX_SEED_ROWS),
        );

        if let Some(seed) = self.seed {
            plan = plan.with_seed(seed);
        }

        plan
    }
}

/// DELETE /truncate-all
pub async fn truncate_all(State(state): State<AppState>) -> Result<Json<TruncateReport>, ApiError> {
    Ok(Json(state.dataset.truncate_all().await?))
}

/// POST /seed-data
pub async fn seed_data(
    State(state): State<AppState>,
    Query(params): Query<SeedParams>,
) -> Result<Json<SeedOutcome>, ApiError> {
    Ok(Json(state.dataset.seed(&params.plan()).await?))
}
