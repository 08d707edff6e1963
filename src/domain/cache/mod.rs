//! Cache domain - key encoding, backend abstraction and the look-aside store

mod key;
mod pattern;
mod repository;
mod store;

pub use key::{CacheKeyGenerator, CacheKeyParams, ParamValue, QueryKeyEncoder};
pub use pattern::GlobPattern;
pub use repository::Cache;
pub use store::{CacheLookup, CacheOutcome, CacheStore};

#[cfg(test)]
pub use repository::mock::MockCache;
