//! API routes.

use std::sync::Arc;

use axum::extract::DefaultBodyLimit;
use axum::middleware;
use axum::routing::{get, post};
use axum::Router;
use metrics_exporter_prometheus::PrometheusHandle;
use tower_http::limit::RequestBodyLimitLayer;
use tower_http::services::{ServeDir, ServeFile};

use crate::handlers::{
    analyze_pin, analyze_pin_query, health, list_pins, pinterest_callback, pinterest_sign_in,
    ready, search_track, upload_image,
};
use crate::metrics::metrics_middleware;
use crate::middleware::{
    cors_layer, rate_limit_middleware, request_id, request_logging, security_headers,
    ClientRateLimiter,
};
use crate::state::AppState;

/// Create the API router.
pub fn create_router(state: AppState, metrics_handle: Option<PrometheusHandle>) -> Router {
    let analysis_routes = Router::new()
        .route("/analyze", get(analyze_pin_query).post(analyze_pin))
        .route("/upload", post(upload_image))
        .route("/search", get(search_track))
        // Paths used by the existing frontend
        .route("/auth/pinterest/analyze-pin", post(analyze_pin))
        .route("/upload/userfile", post(upload_image))
        .route("/auth/spotify/search", get(search_track));

    let pinterest_routes = Router::new()
        .route("/auth/pinterest", get(pinterest_sign_in))
        .route("/auth/pinterest/callback", get(pinterest_callback))
        .route("/pinterest/pins", get(list_pins))
        .route("/auth/pinterest/pins", get(list_pins));

    let rate_limiter = Arc::new(ClientRateLimiter::new(
        state.config.rate_limit_rps,
        state.config.rate_limit_burst,
    ));

    let api_routes = Router::new()
        .merge(analysis_routes)
        .merge(pinterest_routes)
        .layer(middleware::from_fn_with_state(rate_limiter, rate_limit_middleware));

    let health_routes = Router::new()
        .route("/health", get(health))
        .route("/healthz", get(health))
        .route("/ready", get(ready));

    // Metrics endpoint (if enabled)
    let metrics_routes = if let Some(handle) = metrics_handle {
        Router::new().route("/metrics", get(move || async move { handle.render() }))
    } else {
        Router::new()
    };

    let mut router: Router<AppState> = Router::new()
        .merge(api_routes)
        .merge(health_routes)
        .merge(metrics_routes);

    if let Some(dir) = &state.config.static_dir {
        let index = dir.join("index.html");
        router = router.fallback_service(ServeDir::new(dir).fallback(ServeFile::new(index)));
    }

    router
        // multipart uploads are capped by the same limit as other bodies
        .layer(DefaultBodyLimit::max(state.config.max_body_size))
        .layer(RequestBodyLimitLayer::new(state.config.max_body_size))
        .layer(middleware::from_fn(metrics_middleware))
        .layer(middleware::from_fn(security_headers))
        .layer(middleware::from_fn(request_id))
        .layer(middleware::from_fn(request_logging))
        .layer(cors_layer(&state.config.cors_origins))
        .with_state(state)
}
