//! Infrastructure layer - Storage, cache, services and observability

pub mod cache;
pub mod logging;
pub mod observability;
pub mod seed;
pub mod services;
pub mod storage;
