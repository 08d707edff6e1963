//! Order endpoints; every order carries its expanded user and product

use axum::{
    extract::{Path, State},
    Json,
};
use serde::Deserialize;
use validator::Validate;

use crate::api::state::AppState;
use crate::api::types::{default_page, default_size, non_empty, parse_id, ApiError, Query};
use crate::domain::catalog::{
    OrderFilter, OrderQuery, OrderStatus, OrderView, Page, PageRequest, Sort,
};

#[derive(Debug, Clone, Deserialize, Validate)]
pub struct OrderListParams {
    #[serde(default = "default_page")]
    #[validate(range(min = 1, message = "Page must be greater than 0"))]
    pub page: u32,
    #[serde(default = "default_size")]
    #[validate(range(min = 1, max = 1000, message = "Size must be between 1 and 1000"))]
    pub size: u32,
    #[validate(range(min = 1, message = "User ID must be greater than 0"))]
    pub user_id: Option<i64>,
    pub status: Option<String>,
    pub sort_by: Option<String>,
    pub sort_order: Option<String>,
}

impl OrderListParams {
    pub fn into_query(self) -> Result<OrderQuery, ApiError> {
        let page = PageRequest::new(self.page, self.size)?;
        let sort = Sort::parse(
            non_empty(self.sort_by).as_deref(),
            non_empty(self.sort_order).as_deref(),
        )?;

        let status = match non_empty(self.status).as_deref() {
            Some(raw) => Some(
                raw.parse::<OrderStatus>()
                    .map_err(|e| ApiError::from(e).with_param("status"))?,
            ),
            None => None,
        };

        let filter = OrderFilter {
            user_id: self.user_id,
            status,
        };

        Ok(OrderQuery::new(page, filter, sort)?)
    }
}

pub async fn list_orders(
    State(state): State<AppState>,
    Query(params): Query<OrderListParams>,
) -> Result<Json<Page<OrderView>>, ApiError> {
    let query = params.into_query()?;
    Ok(Json(state.catalog.list_orders(&query).await?))
}

pub async fn get_order(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<OrderView>, ApiError> {
    let id = parse_id(&id, "Order")?;
    Ok(Json(state.catalog.get_order(id).await?))
}
