//! Read-only catalog endpoints

mod orders;
mod products;
mod users;

use axum::{extract::State, Json};
use serde::Serialize;

use crate::api::state::AppState;
use crate::api::types::ApiError;
use crate::domain::catalog::DatasetStats;

pub use orders::{get_order, list_orders, OrderListParams};
pub use products::{get_product, list_products, ProductListParams};
pub use users::{get_user, list_users, UserListParams};

#[derive(Debug, Serialize)]
pub struct RootResponse {
    pub message: &'static str,
    pub status: &'static str,
}

/// GET /
pub async fn root() -> Json<RootResponse> {
    Json(RootResponse {
        message: "Catalog Data API",
        status: "running",
    })
}

/// GET /stats
pub async fn stats(State(state): State<AppState>) -> Result<Json<DatasetStats>, ApiError> {
    Ok(Json(state.catalog.stats().await?))
}
