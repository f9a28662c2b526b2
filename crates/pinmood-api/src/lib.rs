//! Axum HTTP API server for pin mood analysis.
//!
//! This crate provides:
//! - Pin and upload analysis backed by a Firestore result cache
//! - Direct Spotify track search
//! - Pinterest sign-in and pin listing
//! - Rate limiting, security headers and Prometheus metrics

pub mod config;
pub mod error;
pub mod handlers;
pub mod metrics;
pub mod middleware;
pub mod oauth_state;
pub mod routes;
pub mod services;
pub mod state;

pub use config::{ApiConfig, CacheBackend};
pub use error::{ApiError, ApiResult};
pub use routes::create_router;
pub use state::{AppState, Collaborators};
