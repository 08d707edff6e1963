//! Product endpoints

use axum::{
    extract::{Path, State},
    Json,
};
use serde::Deserialize;
use validator::Validate;

use crate::api::state::AppState;
use crate::api::types::{default_page, default_size, non_empty, parse_id, ApiError, Query};
use crate::domain::catalog::{
    Page, PageRequest, ProductFilter, ProductQuery, ProductView, Sort,
};
use crate::domain::DomainError;

#[derive(Debug, Clone, Deserialize, Validate)]
pub struct ProductListParams {
    #[serde(default = "default_page")]
    #[validate(range(min = 1, message = "Page must be greater than 0"))]
    pub page: u32,
    #[serde(default = "default_size")]
    #[validate(range(min = 1, max = 1000, message = "Size must be between 1 and 1000"))]
    pub size: u32,
    #[validate(length(max = 255, message = "search must be at most 255 characters"))]
    pub search: Option<String>,
    #[validate(length(max = 100, message = "category must be at most 100 characters"))]
    pub category: Option<String>,
    #[validate(length(max = 100, message = "brand must be at most 100 characters"))]
    pub brand: Option<String>,
    #[validate(range(min = 0.0, message = "min_price must be a non-negative number"))]
    pub min_price: Option<f64>,
    #[validate(range(min = 0.0, message = "max_price must be a non-negative number"))]
    pub max_price: Option<f64>,
    pub sort_by: Option<String>,
    pub sort_order: Option<String>,
}

impl ProductListParams {
    pub fn into_query(self) -> Result<ProductQuery, DomainError> {
        let page = PageRequest::new(self.page, self.size)?;
        let sort = Sort::parse(
            non_empty(self.sort_by).as_deref(),
            non_empty(self.sort_order).as_deref(),
        )?;

        let filter = ProductFilter {
            search: non_empty(self.search),
            category: non_empty(self.category),
            brand: non_empty(self.brand),
            min_price: self.min_price,
            max_price: self.max_price,
        };

        ProductQuery::new(page, filter, sort)
    }
}

/// GET /products
pub async fn list_products(
    State(state): State<AppState>,
    Query(params): Query<ProductListParams>,
) -> Result<Json<Page<ProductView>>, ApiError> {
    let query = params.into_query()?;
    Ok(Json(state.catalog.list_products(&query).await?))
}

/// GET /products/{id}
pub async fn get_product(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<ProductView>, ApiError> {
    let id = parse_id(&id, "Product")?;
    Ok(Json(state.catalog.get_product(id).await?))
}
