//! Image analysis result models.
//!
//! An [`AnalysisResult`] is what the `/analyze` and `/upload` routes return
//! and what the cache stores per image URL.

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::emotion::Emotion;

/// A suggested song that was found in the music catalog.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct MusicRecommendation {
    pub song: String,
    pub artist: String,
    /// Public catalog link for the matched track
    #[serde(rename = "spotifyUrl")]
    pub url: String,
}

/// Composite analysis of one image.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct AnalysisResult {
    /// Label descriptions, in the order the vision API ranked them
    pub labels: Vec<String>,
    pub dominant_emotion: Emotion,
    pub music_recommendations: Vec<MusicRecommendation>,
    pub story: String,
}

/// Mood inputs shared by the two generation prompts.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MoodContext<'a> {
    pub emotion: Emotion,
    pub labels: &'a [String],
}

impl<'a> MoodContext<'a> {
    pub fn new(emotion: Emotion, labels: &'a [String]) -> Self {
        Self { emotion, labels }
    }

    fn preamble(&self) -> String {
        format!(
            "Detected emotion: {}. Context labels: {}.",
            self.emotion,
            self.labels.join(", ")
        )
    }

    /// Prompt asking for songs in the bolded `**Song - Artist**` form.
    pub fn recommendation_prompt(&self) -> String {
        format!(
            "{} Recommend songs matching this mood as **Song - Artist**.",
            self.preamble()
        )
    }

    /// Prompt asking for a short story in the same mood.
    pub fn story_prompt(&self) -> String {
        format!(
            "{} Write a short story that reflects this mood and setting.",
            self.preamble()
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_result_wire_shape() {
        let result = AnalysisResult {
            labels: vec!["Sky".to_string()],
            dominant_emotion: Emotion::Joy,
            music_recommendations: vec![MusicRecommendation {
                song: "Clocks".to_string(),
                artist: "Coldplay".to_string(),
                url: "https://open.spotify.com/track/1".to_string(),
            }],
            story: "Once".to_string(),
        };

        let json = serde_json::to_value(&result).unwrap();
        assert_eq!(json["dominantEmotion"], "joy");
        assert_eq!(json["musicRecommendations"][0]["spotifyUrl"], "https://open.spotify.com/track/1");
        assert_eq!(json["labels"][0], "Sky");
        assert_eq!(json["story"], "Once");
    }

    #[test]
    fn test_default_is_degraded_result() {
        let result = AnalysisResult::default();
        assert!(result.labels.is_empty());
        assert_eq!(result.dominant_emotion, Emotion::Neutral);
        assert!(result.music_recommendations.is_empty());
        assert!(result.story.is_empty());
    }

    #[test]
    fn test_prompts_embed_mood() {
        let labels = vec!["Beach".to_string(), "Sunset".to_string()];
        let ctx = MoodContext::new(Emotion::Sorrow, &labels);
        assert_eq!(
            ctx.recommendation_prompt(),
            "Detected emotion: sorrow. Context labels: Beach, Sunset. Recommend songs matching this mood as **Song - Artist**."
        );
        assert!(ctx.story_prompt().ends_with("Write a short story that reflects this mood and setting."));
    }

    #[test]
    fn test_schema_names_wire_fields() {
        let schema = serde_json::to_value(schemars::schema_for!(AnalysisResult)).unwrap();
        let props = &schema["properties"];
        assert!(props.get("dominantEmotion").is_some());
        assert!(props.get("musicRecommendations").is_some());
    }
}
