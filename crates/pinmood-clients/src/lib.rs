//! HTTP clients for the third-party services behind pinmood.
//!
//! Each vendor sits behind a small trait so the API layer can swap in
//! fakes:
//! - [`ImageAnnotator`]: Google Cloud Vision labels and face emotion
//! - [`TextGenerator`]: Gemini text generation
//! - [`TrackCatalog`]: Spotify top-1 track search with a cached token
//! - [`PinterestApi`]: Pinterest OAuth, profile and pins

pub mod error;
pub mod gemini;
mod http;
pub mod pinterest;
pub mod spotify;
pub mod token;
pub mod vision;

pub use error::{ClientError, ClientResult};
pub use gemini::{GeminiClient, GeminiConfig, TextGenerator};
pub use http::DEFAULT_TIMEOUT;
pub use pinterest::{PinterestApi, PinterestClient, PinterestConfig};
pub use spotify::{SpotifyClient, SpotifyConfig, Track, TrackCatalog};
pub use token::TokenSlot;
pub use vision::{ImageAnnotation, ImageAnnotator, ImageSource, VisionClient, VisionConfig};
