//! Query-string extractor that validates and reports errors in the API format

use axum::{
    extract::{FromRequestParts, Query as AxumQuery},
    http::request::Parts,
};
use serde::de::DeserializeOwned;
use validator::{Validate, ValidationErrors};

use super::error::ApiError;
use crate::domain::catalog::DEFAULT_PAGE_SIZE;
use crate::domain::DomainError;

pub fn default_page() -> u32 {
    1
}

pub fn default_size() -> u32 {
    DEFAULT_PAGE_SIZE
}

/// Deserialized and validated query parameters
///
/// Both malformed values (e.g. `page=abc`) and out-of-bounds values
/// (e.g. `size=0`) are rejected with `400` before the handler runs.
#[derive(Debug, Clone, Copy, Default)]
pub struct Query<T>(pub T);

impl<S, T> FromRequestParts<S> for Query<T>
where
    T: DeserializeOwned + Validate,
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let AxumQuery(value) = AxumQuery::<T>::from_request_parts(parts, state)
            .await
            .map_err(|rejection| {
                ApiError::bad_request(format!("Invalid query parameters: {}", rejection.body_text()))
                    .with_code("invalid_query")
            })?;

        value.validate().map_err(validation_error)?;

        Ok(Query(value))
    }
}

/// Reports the first failing field, by name, so the message is stable
fn validation_error(errors: ValidationErrors) -> ApiError {
    let mut fields: Vec<(String, String)> = errors
        .field_errors()
        .into_iter()
        .map(|(field, errs)| {
            let message = errs
                .iter()
                .find_map(|e| e.message.as_ref().map(|m| m.to_string()))
                .unwrap_or_else(|| format!("Invalid value for {}", field));
            (field.to_string(), message)
        })
        .collect();

    fields.sort();

    match fields.into_iter().next() {
        Some((field, message)) => ApiError::bad_request(message).with_param(field),
        None => ApiError::bad_request("Invalid query parameters"),
    }
}

/// Empty query values (`?category=`) mean the same as an absent parameter
pub fn non_empty(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.trim().is_empty())
}

/// Parses a path id; non-integers are rejected, range checks happen later
pub fn parse_id(raw: &str, entity: &str) -> Result<i64, DomainError> {
    raw.trim()
        .parse::<i64>()
        .map_err(|_| DomainError::invalid_id(format!("{} ID must be an integer", entity)))
}
