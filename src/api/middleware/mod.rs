//! API middleware components

pub mod logging;
pub mod timing;

pub use logging::{logging_middleware, REQUEST_ID_HEADER};
pub use timing::{timing_middleware, PROCESS_TIME_HEADER};
