//! Application state.

use std::sync::Arc;

use tracing::info;

use pinmood_clients::{
    GeminiClient, ImageAnnotator, PinterestApi, PinterestClient, SpotifyClient, TextGenerator,
    TrackCatalog, VisionClient,
};
use pinmood_firestore::{AnalysisCacheRepository, FirestoreClient};

use crate::config::{ApiConfig, CacheBackend};
use crate::oauth_state::OAuthStateStore;
use crate::services::{AnalysisCache, AnalysisPipeline, FirestoreCache, MemoryCache};

/// The external services the API talks to.
pub struct Collaborators {
    pub annotator: Arc<dyn ImageAnnotator>,
    pub generator: Arc<dyn TextGenerator>,
    pub catalog: Arc<dyn TrackCatalog>,
    pub pinterest: Arc<dyn PinterestApi>,
    pub cache: Arc<dyn AnalysisCache>,
}

/// Shared application state.
#[derive(Clone)]
pub struct AppState {
    pub config: ApiConfig,
    pub pipeline: Arc<AnalysisPipeline>,
    pub catalog: Arc<dyn TrackCatalog>,
    pub pinterest: Arc<dyn PinterestApi>,
    pub cache: Arc<dyn AnalysisCache>,
    pub oauth_states: Arc<OAuthStateStore>,
}

impl AppState {
    pub fn new(config: ApiConfig, services: Collaborators) -> Self {
        let pipeline = AnalysisPipeline::new(
            services.annotator,
            services.generator,
            Arc::clone(&services.catalog),
            Arc::clone(&services.cache),
        );

        Self {
            config,
            pipeline: Arc::new(pipeline),
            catalog: services.catalog,
            pinterest: services.pinterest,
            cache: services.cache,
            oauth_states: Arc::new(OAuthStateStore::default()),
        }
    }

    /// Create application state with real vendor clients.
    pub fn from_env(config: ApiConfig) -> anyhow::Result<Self> {
        let cache: Arc<dyn AnalysisCache> = match config.cache_backend {
            CacheBackend::Firestore => {
                let client = FirestoreClient::from_env()?;
                let repo = AnalysisCacheRepository::new(client, config.cache_collection.clone());
                Arc::new(FirestoreCache::new(repo))
            }
            CacheBackend::Memory => Arc::new(MemoryCache::new()),
        };
        info!(backend = cache.backend(), "Analysis cache configured");

        let services = Collaborators {
            annotator: Arc::new(VisionClient::from_env()?),
            generator: Arc::new(GeminiClient::from_env()?),
            catalog: Arc::new(SpotifyClient::from_env()?),
            pinterest: Arc::new(PinterestClient::from_env()?),
            cache,
        };

        Ok(Self::new(config, services))
    }
}
