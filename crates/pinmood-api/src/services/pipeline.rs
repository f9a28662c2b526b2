//! Image analysis pipeline.
//!
//! annotate -> dominant emotion -> song suggestions + story -> catalog
//! resolution, with the cache consulted first for URL requests.
//!
//! Each entry point fixes a [`FailurePolicy`]. URL analysis fails fast on
//! any stage error; upload analysis replaces a failed stage with its empty
//! default and carries on.

use std::fmt;
use std::future::Future;
use std::sync::Arc;
use std::time::Instant;

use thiserror::Error;
use tracing::{debug, info, warn};

use pinmood_clients::{ClientError, ClientResult, ImageAnnotator, ImageSource, TextGenerator, TrackCatalog};
use pinmood_models::{extract_song_candidates, AnalysisResult, MoodContext, MusicRecommendation, SongCandidate};

use crate::metrics;
use crate::services::cache::AnalysisCache;

/// What to do when a stage fails.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailurePolicy {
    /// Abort the analysis with the stage error.
    FailFast,
    /// Log, use the stage's empty default, continue.
    Degrade,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    Annotate,
    Recommend,
    Resolve,
    Story,
}

impl Stage {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Annotate => "annotate",
            Self::Recommend => "recommend",
            Self::Resolve => "resolve",
            Self::Story => "story",
        }
    }
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Error)]
#[error("{stage} stage failed: {source}")]
pub struct PipelineError {
    pub stage: Stage,
    #[source]
    pub source: ClientError,
}

impl PipelineError {
    /// Vendor error detail for the API error body.
    pub fn detail(&self) -> serde_json::Value {
        self.source.detail()
    }
}

pub struct AnalysisPipeline {
    annotator: Arc<dyn ImageAnnotator>,
    generator: Arc<dyn TextGenerator>,
    catalog: Arc<dyn TrackCatalog>,
    cache: Arc<dyn AnalysisCache>,
}

impl AnalysisPipeline {
    pub fn new(
        annotator: Arc<dyn ImageAnnotator>,
        generator: Arc<dyn TextGenerator>,
        catalog: Arc<dyn TrackCatalog>,
        cache: Arc<dyn AnalysisCache>,
    ) -> Self {
        Self {
            annotator,
            generator,
            catalog,
            cache,
        }
    }

    /// Analyse an image by URL, answering from the cache when possible.
    ///
    /// Fresh results are stored before returning. Cache failures never fail
    /// the request: a failed read is a miss, a failed write is logged.
    pub async fn analyze_url(&self, image_url: &str) -> Result<AnalysisResult, PipelineError> {
        match self.cache.lookup(image_url).await {
            Ok(Some(hit)) => {
                metrics::record_cache_lookup("hit");
                info!(image_url = %image_url, "Serving cached analysis");
                return Ok(hit);
            }
            Ok(None) => metrics::record_cache_lookup("miss"),
            Err(e) => {
                metrics::record_cache_lookup("error");
                warn!(image_url = %image_url, "Cache lookup failed, treating as miss: {}", e);
            }
        }

        let result = self
            .compute(&ImageSource::Url(image_url.to_string()), FailurePolicy::FailFast)
            .await?;

        match self.cache.store(image_url, &result).await {
            Ok(()) => metrics::record_cache_write(true),
            Err(e) => {
                metrics::record_cache_write(false);
                warn!(image_url = %image_url, "Failed to cache analysis: {}", e);
            }
        }

        Ok(result)
    }

    /// Analyse uploaded image bytes. Never cached; every stage degrades.
    pub async fn analyze_upload(&self, image: Vec<u8>) -> Result<AnalysisResult, PipelineError> {
        self.compute(&ImageSource::Bytes(image), FailurePolicy::Degrade)
            .await
    }

    async fn compute(
        &self,
        image: &ImageSource,
        policy: FailurePolicy,
    ) -> Result<AnalysisResult, PipelineError> {
        let annotation = settle(
            policy,
            Stage::Annotate,
            timed(Stage::Annotate, self.annotator.annotate(image)).await,
        )?;

        let dominant_emotion = annotation.dominant_emotion();
        let labels = annotation.labels;
        let mood = MoodContext::new(dominant_emotion, &labels);
        debug!(emotion = %dominant_emotion, labels = labels.len(), "Derived mood");

        let recommendation_prompt = mood.recommendation_prompt();
        let suggestions = settle(
            policy,
            Stage::Recommend,
            timed(Stage::Recommend, self.generator.generate(&recommendation_prompt)).await,
        )?;
        let candidates = extract_song_candidates(&suggestions);

        let music_recommendations = settle(
            policy,
            Stage::Resolve,
            timed(Stage::Resolve, self.resolve(&candidates)).await,
        )?;

        let story_prompt = mood.story_prompt();
        let story = settle(
            policy,
            Stage::Story,
            timed(Stage::Story, self.generator.generate(&story_prompt)).await,
        )?;

        Ok(AnalysisResult {
            labels,
            dominant_emotion,
            music_recommendations,
            story,
        })
    }

    /// Resolve candidates in order. Per-candidate misses and errors are
    /// skipped; failing to authenticate with the catalog fails the stage.
    async fn resolve(&self, candidates: &[SongCandidate]) -> ClientResult<Vec<MusicRecommendation>> {
        let mut resolved = Vec::with_capacity(candidates.len());

        for candidate in candidates {
            match self.catalog.search_track(&candidate.search_query()).await {
                Ok(Some(track)) => resolved.push(MusicRecommendation {
                    song: candidate.song.clone(),
                    artist: candidate.artist.clone(),
                    url: track.url,
                }),
                Ok(None) => {
                    metrics::record_catalog_miss("no_match");
                    debug!(song = %candidate.song, artist = %candidate.artist, "No catalog match");
                }
                Err(e) if e.is_auth() => return Err(e),
                Err(e) => {
                    metrics::record_catalog_miss("error");
                    warn!(song = %candidate.song, artist = %candidate.artist, "Catalog search failed: {}", e);
                }
            }
        }

        Ok(resolved)
    }
}

async fn timed<F: Future>(stage: Stage, fut: F) -> F::Output {
    let start = Instant::now();
    let output = fut.await;
    metrics::record_stage_duration(stage.as_str(), start.elapsed());
    output
}

fn settle<T: Default>(
    policy: FailurePolicy,
    stage: Stage,
    result: ClientResult<T>,
) -> Result<T, PipelineError> {
    match (result, policy) {
        (Ok(value), _) => Ok(value),
        (Err(source), FailurePolicy::FailFast) => Err(PipelineError { stage, source }),
        (Err(source), FailurePolicy::Degrade) => {
            metrics::record_stage_failure(stage.as_str());
            warn!(stage = %stage, "Stage failed, continuing without it: {}", source);
            Ok(T::default())
        }
    }
}
