//! Analysis cache backends.

use std::collections::HashMap;

use async_trait::async_trait;
use thiserror::Error;
use tokio::sync::RwLock;

use pinmood_firestore::{AnalysisCacheRepository, FirestoreError};
use pinmood_models::AnalysisResult;

pub type CacheResult<T> = Result<T, CacheError>;

#[derive(Debug, Error)]
pub enum CacheError {
    #[error("Firestore error: {0}")]
    Firestore(#[from] FirestoreError),

    #[error("Cache unavailable: {0}")]
    Unavailable(String),
}

/// Analysis results keyed by exact image URL.
#[async_trait]
pub trait AnalysisCache: Send + Sync {
    async fn lookup(&self, image_url: &str) -> CacheResult<Option<AnalysisResult>>;

    /// Store a result. A later store for the same URL replaces it.
    async fn store(&self, image_url: &str, result: &AnalysisResult) -> CacheResult<()>;

    /// Check the backend is reachable.
    async fn ping(&self) -> CacheResult<()>;

    fn backend(&self) -> &'static str;
}

/// Firestore-backed cache.
pub struct FirestoreCache {
    repo: AnalysisCacheRepository,
}

impl FirestoreCache {
    pub fn new(repo: AnalysisCacheRepository) -> Self {
        Self { repo }
    }
}

#[async_trait]
impl AnalysisCache for FirestoreCache {
    async fn lookup(&self, image_url: &str) -> CacheResult<Option<AnalysisResult>> {
        Ok(self.repo.lookup(image_url).await?)
    }

    async fn store(&self, image_url: &str, result: &AnalysisResult) -> CacheResult<()> {
        Ok(self.repo.store(image_url, result).await?)
    }

    async fn ping(&self) -> CacheResult<()> {
        Ok(self.repo.ping().await?)
    }

    fn backend(&self) -> &'static str {
        "firestore"
    }
}

/// In-process cache, for local development and tests.
#[derive(Default)]
pub struct MemoryCache {
    entries: RwLock<HashMap<String, AnalysisResult>>,
}

impl MemoryCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn len(&self) -> usize {
        self.entries.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.entries.read().await.is_empty()
    }
}

#[async_trait]
impl AnalysisCache for MemoryCache {
    async fn lookup(&self, image_url: &str) -> CacheResult<Option<AnalysisResult>> {
        Ok(self.entries.read().await.get(image_url).cloned())
    }

    async fn store(&self, image_url: &str, result: &AnalysisResult) -> CacheResult<()> {
        self.entries
            .write()
            .await
            .insert(image_url.to_string(), result.clone());
        Ok(())
    }

    async fn ping(&self) -> CacheResult<()> {
        Ok(())
    }

    fn backend(&self) -> &'static str {
        "memory"
    }
}
