//! Firestore REST API client.
//!
//! This crate provides:
//! - A minimal Firestore client (get, upsert, structured query)
//! - Service account authentication via gcp_auth, with token caching
//! - The analysis cache repository keyed by image URL

pub mod cache_repo;
pub mod client;
pub mod error;
pub mod metrics;
pub mod token_cache;
pub mod types;

pub use cache_repo::{AnalysisCacheRepository, DEFAULT_CACHE_COLLECTION};
pub use client::{FirestoreClient, FirestoreConfig};
pub use error::{FirestoreError, FirestoreResult};
pub use token_cache::{AccessTokenSource, IssuedToken, StaticTokenSource};
pub use types::{Document, FromFirestoreValue, StructuredQuery, ToFirestoreValue, Value};
