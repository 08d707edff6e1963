//! Shared API types: error envelope and query extraction

pub mod error;
pub mod query;

pub use error::{ApiError, ApiErrorResponse, ApiErrorType};
pub use query::{default_page, default_size, non_empty, parse_id, Query};
