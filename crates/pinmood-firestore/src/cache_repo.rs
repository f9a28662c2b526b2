//! Analysis cache repository.
//!
//! One document per analysed image URL in the cache collection:
//!
//! ```text
//! {
//!   imageUrl:  "<url>",
//!   imageData: { labels, dominantEmotion, spotifyResults[{song, artist, spotifyUrl}], storyText },
//!   createdAt: <timestamp>
//! }
//! ```
//!
//! Document IDs are the SHA-256 of the URL so a second store for the same
//! URL replaces the first. Lookups query on `imageUrl`, which also finds
//! entries written under auto-generated IDs.

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use sha2::{Digest, Sha256};
use tracing::debug;

use pinmood_models::{AnalysisResult, Emotion, MusicRecommendation};

use crate::client::FirestoreClient;
use crate::error::{FirestoreError, FirestoreResult};
use crate::types::{ArrayValue, Document, FromFirestoreValue, StructuredQuery, ToFirestoreValue, Value};

/// Default collection holding cached analyses.
pub const DEFAULT_CACHE_COLLECTION: &str = "cache";

/// Repository for cached analysis results keyed by image URL.
#[derive(Clone)]
pub struct AnalysisCacheRepository {
    client: FirestoreClient,
    collection: String,
}

impl AnalysisCacheRepository {
    pub fn new(client: FirestoreClient, collection: impl Into<String>) -> Self {
        Self {
            client,
            collection: collection.into(),
        }
    }

    /// Document ID for an image URL.
    pub fn document_id(image_url: &str) -> String {
        format!("{:x}", Sha256::digest(image_url.as_bytes()))
    }

    /// Find the cached analysis for an image URL.
    pub async fn lookup(&self, image_url: &str) -> FirestoreResult<Option<AnalysisResult>> {
        let query = StructuredQuery::field_equals(
            &self.collection,
            "imageUrl",
            image_url.to_firestore_value(),
            1,
        );

        let docs = self.client.run_query(None, query).await?;
        match docs.first() {
            Some(doc) => {
                debug!(image_url = %image_url, "Analysis cache hit");
                document_to_analysis(doc).map(Some)
            }
            None => Ok(None),
        }
    }

    /// Store the analysis for an image URL, replacing any earlier entry.
    pub async fn store(&self, image_url: &str, result: &AnalysisResult) -> FirestoreResult<()> {
        let fields = analysis_to_fields(image_url, result, Utc::now());
        self.client
            .upsert_document(&self.collection, &Self::document_id(image_url), fields)
            .await?;

        debug!(image_url = %image_url, "Stored analysis in cache");
        Ok(())
    }

    /// Round-trip to the collection; a missing probe document still counts.
    pub async fn ping(&self) -> FirestoreResult<()> {
        self.client
            .get_document(&self.collection, "_health")
            .await
            .map(|_| ())
    }
}

// ============================================================================
// Conversions
// ============================================================================

fn analysis_to_fields(
    image_url: &str,
    result: &AnalysisResult,
    created_at: DateTime<Utc>,
) -> HashMap<String, Value> {
    let spotify_results = result
        .music_recommendations
        .iter()
        .map(|rec| {
            let mut entry = HashMap::new();
            entry.insert("song".to_string(), rec.song.to_firestore_value());
            entry.insert("artist".to_string(), rec.artist.to_firestore_value());
            entry.insert("spotifyUrl".to_string(), rec.url.to_firestore_value());
            Value::map(entry)
        })
        .collect::<Vec<_>>();

    let mut image_data = HashMap::new();
    image_data.insert("labels".to_string(), result.labels.to_firestore_value());
    image_data.insert(
        "dominantEmotion".to_string(),
        result.dominant_emotion.as_str().to_firestore_value(),
    );
    image_data.insert(
        "spotifyResults".to_string(),
        Value::ArrayValue(ArrayValue {
            values: Some(spotify_results),
        }),
    );
    image_data.insert("storyText".to_string(), result.story.to_firestore_value());

    let mut fields = HashMap::new();
    fields.insert("imageUrl".to_string(), image_url.to_firestore_value());
    fields.insert("imageData".to_string(), Value::map(image_data));
    fields.insert("createdAt".to_string(), created_at.to_firestore_value());
    fields
}

fn string_field(fields: &HashMap<String, Value>, name: &str) -> FirestoreResult<String> {
    fields
        .get(name)
        .and_then(String::from_firestore_value)
        .ok_or_else(|| FirestoreError::invalid_document(format!("missing or invalid {}", name)))
}

fn document_to_analysis(doc: &Document) -> FirestoreResult<AnalysisResult> {
    let data = doc
        .field("imageData")
        .and_then(Value::as_map)
        .ok_or_else(|| FirestoreError::invalid_document("missing imageData"))?;

    let labels = data
        .get("labels")
        .and_then(Vec::<String>::from_firestore_value)
        .unwrap_or_default();

    let dominant_emotion = data
        .get("dominantEmotion")
        .and_then(String::from_firestore_value)
        .map(|label| Emotion::from_label(&label))
        .unwrap_or_default();

    let music_recommendations = data
        .get("spotifyResults")
        .and_then(Value::as_array)
        .unwrap_or_default()
        .iter()
        .map(|entry| {
            let entry = entry
                .as_map()
                .ok_or_else(|| FirestoreError::invalid_document("spotifyResults entry is not a map"))?;
            Ok(MusicRecommendation {
                song: string_field(entry, "song")?,
                artist: string_field(entry, "artist")?,
                url: string_field(entry, "spotifyUrl")?,
            })
        })
        .collect::<FirestoreResult<Vec<_>>>()?;

    let story = data
        .get("storyText")
        .and_then(String::from_firestore_value)
        .unwrap_or_default();

    Ok(AnalysisResult {
        labels,
        dominant_emotion,
        music_recommendations,
        story,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> AnalysisResult {
        AnalysisResult {
            labels: vec!["Beach".to_string(), "Sunset".to_string()],
            dominant_emotion: Emotion::Joy,
            music_recommendations: vec![MusicRecommendation {
                song: "Clocks".to_string(),
                artist: "Coldplay".to_string(),
                url: "https://open.spotify.com/track/abc".to_string(),
            }],
            story: "The tide rolled in.".to_string(),
        }
    }

    #[test]
    fn test_document_id_is_stable_hex() {
        let id = AnalysisCacheRepository::document_id("https://i.pinimg.com/a.jpg");
        assert_eq!(id.len(), 64);
        assert!(id.chars().all(|c| c.is_ascii_hexdigit()));
        assert_eq!(id, AnalysisCacheRepository::document_id("https://i.pinimg.com/a.jpg"));
        assert_ne!(id, AnalysisCacheRepository::document_id("https://i.pinimg.com/b.jpg"));
    }

    #[test]
    fn test_fields_use_stored_layout() {
        let fields = analysis_to_fields("https://x/img.png", &sample(), Utc::now());
        let json = serde_json::to_value(&fields).unwrap();

        assert_eq!(json["imageUrl"]["stringValue"], "https://x/img.png");
        let data = &json["imageData"]["mapValue"]["fields"];
        assert_eq!(data["dominantEmotion"]["stringValue"], "joy");
        assert_eq!(data["storyText"]["stringValue"], "The tide rolled in.");
        assert_eq!(
            data["spotifyResults"]["arrayValue"]["values"][0]["mapValue"]["fields"]["spotifyUrl"]["stringValue"],
            "https://open.spotify.com/track/abc"
        );
        assert!(json["createdAt"]["timestampValue"].is_string());
    }

    #[test]
    fn test_stored_fields_read_back() {
        let doc = Document::new(analysis_to_fields("https://x/img.png", &sample(), Utc::now()));
        assert_eq!(document_to_analysis(&doc).unwrap(), sample());
    }

    #[test]
    fn test_document_with_empty_arrays() {
        let json = serde_json::json!({
            "fields": {
                "imageUrl": {"stringValue": "u"},
                "imageData": {"mapValue": {"fields": {
                    "labels": {"arrayValue": {}},
                    "dominantEmotion": {"stringValue": "neutral"},
                    "spotifyResults": {"arrayValue": {}},
                    "storyText": {"stringValue": ""}
                }}}
            }
        });
        let doc: Document = serde_json::from_value(json).unwrap();
        let result = document_to_analysis(&doc).unwrap();
        assert_eq!(result, AnalysisResult::default());
    }

    #[test]
    fn test_document_without_image_data_is_invalid() {
        let mut fields = HashMap::new();
        fields.insert("imageUrl".to_string(), "u".to_firestore_value());
        let doc = Document::new(fields);
        assert!(matches!(
            document_to_analysis(&doc),
            Err(FirestoreError::InvalidDocument(_))
        ));
    }
}
