//! User endpoints

use axum::{
    extract::{Path, State},
    Json,
};
use serde::Deserialize;
use validator::Validate;

use crate::api::state::AppState;
use crate::api::types::{default_page, default_size, non_empty, parse_id, ApiError, Query};
use crate::domain::catalog::{Page, PageRequest, Sort, UserFilter, UserQuery, UserView};
use crate::domain::DomainError;

#[derive(Debug, Clone, Deserialize, Validate)]
pub struct UserListParams {
    #[serde(default = "default_page")]
    #[validate(range(min = 1, message = "Page must be greater than 0"))]
    pub page: u32,
    #[serde(default = "default_size")]
    #[validate(range(min = 1, max = 1000, message = "Size must be between 1 and 1000"))]
    pub size: u32,
    #[validate(length(max = 255, message = "search must be at most 255 characters"))]
    pub search: Option<String>,
    #[validate(length(max = 100, message = "city must be at most 100 characters"))]
    pub city: Option<String>,
    #[validate(length(max = 100, message = "country must be at most 100 characters"))]
    pub country: Option<String>,
    pub sort_by: Option<String>,
    pub sort_order: Option<String>,
}

impl UserListParams {
    pub fn into_query(self) -> Result<UserQuery, DomainError> {
        let page = PageRequest::new(self.page, self.size)?;
        let sort = Sort::parse(
            non_empty(self.sort_by).as_deref(),
            non_empty(self.sort_order).as_deref(),
        )?;

        let filter = UserFilter {
            search: non_empty(self.search),
            city: non_empty(self.city),
            country: non_empty(self.country),
        };

        UserQuery::new(page, filter, sort)
    }
}

pub async fn list_users(
    State(state): State<AppState>,
    Query(params): Query<UserListParams>,
) -> Result<Json<Page<UserView>>, ApiError> {
    let query = params.into_query()?;
    Ok(Json(state.catalog.list_users(&query).await?))
}

pub async fn get_user(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<UserView>, ApiError> {
    let id = parse_id(&id, "User")?;
    Ok(Json(state.catalog.get_user(id).await?))
}
