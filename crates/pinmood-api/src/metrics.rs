//! Prometheus metrics for the API server.

use std::time::{Duration, Instant};

use axum::body::Body;
use axum::http::{Request, Response};
use axum::middleware::Next;
use metrics::{counter, gauge, histogram};
use metrics_exporter_prometheus::{PrometheusBuilder, PrometheusHandle};

/// Install the Prometheus recorder and return its render handle.
pub fn init_metrics() -> anyhow::Result<PrometheusHandle> {
    Ok(PrometheusBuilder::new().install_recorder()?)
}

/// Metric names as constants for consistency.
pub mod names {
    // HTTP metrics
    pub const HTTP_REQUESTS_TOTAL: &str = "pinmood_http_requests_total";
    pub const HTTP_REQUEST_DURATION_SECONDS: &str = "pinmood_http_request_duration_seconds";
    pub const HTTP_REQUESTS_IN_FLIGHT: &str = "pinmood_http_requests_in_flight";

    // Cache metrics
    pub const CACHE_LOOKUPS_TOTAL: &str = "pinmood_cache_lookups_total";
    pub const CACHE_WRITES_TOTAL: &str = "pinmood_cache_writes_total";

    // Pipeline metrics
    pub const STAGE_DURATION_SECONDS: &str = "pinmood_pipeline_stage_duration_seconds";
    pub const STAGE_FAILURES_TOTAL: &str = "pinmood_pipeline_stage_failures_total";
    pub const CATALOG_MISSES_TOTAL: &str = "pinmood_catalog_misses_total";

    // Rate limiting metrics
    pub const RATE_LIMIT_HITS_TOTAL: &str = "pinmood_rate_limit_hits_total";
}

/// Routes reported under their own label; everything else is `other`.
const KNOWN_ROUTES: &[&str] = &[
    "/analyze",
    "/upload",
    "/search",
    "/auth/pinterest",
    "/auth/pinterest/callback",
    "/auth/pinterest/analyze-pin",
    "/auth/pinterest/pins",
    "/auth/spotify/search",
    "/pinterest/pins",
    "/upload/userfile",
    "/health",
    "/healthz",
    "/ready",
    "/metrics",
];

/// Record an HTTP request.
pub fn record_http_request(method: &str, path: &str, status: u16, duration_secs: f64) {
    let labels = [
        ("method", method.to_string()),
        ("path", route_label(path).to_string()),
        ("status", status.to_string()),
    ];

    counter!(names::HTTP_REQUESTS_TOTAL, &labels).increment(1);
    histogram!(names::HTTP_REQUEST_DURATION_SECONDS, &labels).record(duration_secs);
}

/// Record a cache lookup outcome: `hit`, `miss` or `error`.
pub fn record_cache_lookup(outcome: &'static str) {
    counter!(names::CACHE_LOOKUPS_TOTAL, "result" => outcome).increment(1);
}

/// Record a cache write.
pub fn record_cache_write(ok: bool) {
    let status = if ok { "ok" } else { "error" };
    counter!(names::CACHE_WRITES_TOTAL, "status" => status).increment(1);
}

/// Record how long a pipeline stage took.
pub fn record_stage_duration(stage: &'static str, elapsed: Duration) {
    histogram!(names::STAGE_DURATION_SECONDS, "stage" => stage).record(elapsed.as_secs_f64());
}

/// Record a stage failure that was replaced by its default.
pub fn record_stage_failure(stage: &'static str) {
    counter!(names::STAGE_FAILURES_TOTAL, "stage" => stage).increment(1);
}

/// Record a song suggestion that did not resolve: `no_match` or `error`.
pub fn record_catalog_miss(reason: &'static str) {
    counter!(names::CATALOG_MISSES_TOTAL, "reason" => reason).increment(1);
}

/// Record rate limit hit.
pub fn record_rate_limit_hit(endpoint: &str) {
    counter!(names::RATE_LIMIT_HITS_TOTAL, "endpoint" => route_label(endpoint).to_string()).increment(1);
}

/// Label for a request path. Static-file paths collapse into one label.
fn route_label(path: &str) -> &str {
    let trimmed = if path.len() > 1 {
        path.trim_end_matches('/')
    } else {
        path
    };
    KNOWN_ROUTES
        .iter()
        .copied()
        .find(|route| *route == trimmed)
        .unwrap_or("other")
}

/// Metrics middleware for HTTP requests.
pub async fn metrics_middleware(request: Request<Body>, next: Next) -> Response<Body> {
    let method = request.method().to_string();
    let path = request.uri().path().to_string();
    let start = Instant::now();

    gauge!(names::HTTP_REQUESTS_IN_FLIGHT).increment(1.0);

    let response = next.run(request).await;

    gauge!(names::HTTP_REQUESTS_IN_FLIGHT).decrement(1.0);

    let status = response.status().as_u16();
    record_http_request(&method, &path, status, start.elapsed().as_secs_f64());

    response
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_route_label() {
        assert_eq!(route_label("/analyze"), "/analyze");
        assert_eq!(route_label("/auth/pinterest/callback/"), "/auth/pinterest/callback");
        assert_eq!(route_label("/static/js/main.3f2a.js"), "other");
        assert_eq!(route_label("/"), "other");
    }
}
