//! Per-request timing: `X-Process-Time` header plus HTTP metrics

use std::time::{Duration, Instant};

use axum::{
    body::Body,
    http::{HeaderValue, Request},
    middleware::Next,
    response::Response,
};

use super::logging::matched_path;
use crate::infrastructure::observability::record_http_request;

pub const PROCESS_TIME_HEADER: &str = "x-process-time";

pub async fn timing_middleware(request: Request<Body>, next: Next) -> Response {
    let start = Instant::now();
    let method = request.method().clone();
    let path = matched_path(&request);

    let mut response = next.run(request).await;

    let duration = start.elapsed();
    record_http_request(method.as_str(), &path, response.status().as_u16(), duration);

    if let Ok(value) = HeaderValue::from_str(&format_seconds(duration)) {
        response.headers_mut().insert(PROCESS_TIME_HEADER, value);
    }

    response
}

/// Elapsed wall time in seconds
fn format_seconds(duration: Duration) -> String {
    format!("{:.6}", duration.as_secs_f64())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_seconds() {
        assert_eq!(format_seconds(Duration::from_millis(1500)), "1.500000");
        assert_eq!(format_seconds(Duration::ZERO), "0.000000");
    }
}
