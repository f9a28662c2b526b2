//! Business logic services.

pub mod cache;
pub mod pipeline;

pub use cache::{AnalysisCache, CacheError, CacheResult, FirestoreCache, MemoryCache};
pub use pipeline::{AnalysisPipeline, FailurePolicy, PipelineError, Stage};
