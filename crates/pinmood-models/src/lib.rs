//! Shared data models for the pinmood backend.
//!
//! This crate provides Serde-serializable types for:
//! - Analysis results and music recommendations
//! - Face-emotion likelihoods and dominant mood derivation
//! - Song suggestions parsed from generated text
//! - Pinterest pins and accounts

pub mod analysis;
pub mod emotion;
pub mod pin;
pub mod songs;

// Re-export common types
pub use analysis::{AnalysisResult, MoodContext, MusicRecommendation};
pub use emotion::{dominant_emotion, Emotion, FaceLikelihoods, Likelihood};
pub use pin::{Pin, PinPage, UserAccount};
pub use songs::{extract_song_candidates, SongCandidate};
