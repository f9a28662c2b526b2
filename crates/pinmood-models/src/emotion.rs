//! Face-emotion likelihoods and dominant mood derivation.

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// Ordinal likelihood reported by the vision API for a face attribute.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema, Default)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Likelihood {
    VeryUnlikely,
    Unlikely,
    Possible,
    Likely,
    VeryLikely,
    /// Reported when the service could not decide; scores like an absent field.
    /// Also absorbs any value outside the scale.
    #[default]
    #[serde(other)]
    Unknown,
}

impl Likelihood {
    /// Position on the five-point scale (VERY_UNLIKELY = 0 .. VERY_LIKELY = 4).
    pub fn score(&self) -> u8 {
        match self {
            Self::Unknown | Self::VeryUnlikely => 0,
            Self::Unlikely => 1,
            Self::Possible => 2,
            Self::Likely => 3,
            Self::VeryLikely => 4,
        }
    }
}

/// Mood label attached to an analysed image.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema, Default)]
#[serde(rename_all = "lowercase")]
pub enum Emotion {
    Joy,
    Sorrow,
    Anger,
    Surprise,
    #[default]
    Neutral,
}

impl Emotion {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Joy => "joy",
            Self::Sorrow => "sorrow",
            Self::Anger => "anger",
            Self::Surprise => "surprise",
            Self::Neutral => "neutral",
        }
    }

    /// Parse a stored label. Unrecognised labels fall back to neutral.
    pub fn from_label(label: &str) -> Self {
        match label {
            "joy" => Self::Joy,
            "sorrow" => Self::Sorrow,
            "anger" => Self::Anger,
            "surprise" => Self::Surprise,
            _ => Self::Neutral,
        }
    }
}

impl std::fmt::Display for Emotion {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The four emotion likelihoods of a single detected face.
///
/// Missing fields deserialize as [`Likelihood::Unknown`], which scores 0.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct FaceLikelihoods {
    #[serde(default, rename = "joyLikelihood")]
    pub joy: Likelihood,
    #[serde(default, rename = "sorrowLikelihood")]
    pub sorrow: Likelihood,
    #[serde(default, rename = "angerLikelihood")]
    pub anger: Likelihood,
    #[serde(default, rename = "surpriseLikelihood")]
    pub surprise: Likelihood,
}

impl FaceLikelihoods {
    /// Pick the strongest emotion on this face.
    ///
    /// Ties go to the earlier emotion in the order joy, sorrow, anger,
    /// surprise. A winner scoring 0 means nothing was expressed: neutral.
    pub fn dominant(&self) -> Emotion {
        let ranked = [
            (Emotion::Joy, self.joy),
            (Emotion::Sorrow, self.sorrow),
            (Emotion::Anger, self.anger),
            (Emotion::Surprise, self.surprise),
        ];

        let mut best = ranked[0];
        for candidate in &ranked[1..] {
            // strict comparison keeps the first-listed emotion on ties
            if candidate.1.score() > best.1.score() {
                best = *candidate;
            }
        }

        if best.1.score() == 0 {
            Emotion::Neutral
        } else {
            best.0
        }
    }
}

/// Dominant emotion for an optional face; no face means neutral.
pub fn dominant_emotion(face: Option<&FaceLikelihoods>) -> Emotion {
    face.map(FaceLikelihoods::dominant).unwrap_or(Emotion::Neutral)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn face(joy: Likelihood, sorrow: Likelihood, anger: Likelihood, surprise: Likelihood) -> FaceLikelihoods {
        FaceLikelihoods { joy, sorrow, anger, surprise }
    }

    #[test]
    fn test_no_face_is_neutral() {
        assert_eq!(dominant_emotion(None), Emotion::Neutral);
    }

    #[test]
    fn test_all_very_unlikely_is_neutral() {
        use Likelihood::VeryUnlikely as V;
        assert_eq!(face(V, V, V, V).dominant(), Emotion::Neutral);
    }

    #[test]
    fn test_absent_fields_are_neutral() {
        let parsed: FaceLikelihoods = serde_json::from_str("{}").unwrap();
        assert_eq!(parsed.dominant(), Emotion::Neutral);
    }

    #[test]
    fn test_strongest_emotion_wins() {
        use Likelihood::*;
        assert_eq!(face(Unlikely, VeryLikely, Possible, Likely).dominant(), Emotion::Sorrow);
        assert_eq!(face(VeryUnlikely, VeryUnlikely, VeryUnlikely, Possible).dominant(), Emotion::Surprise);
    }

    #[test]
    fn test_ties_resolve_to_first_listed() {
        use Likelihood::*;
        assert_eq!(face(Likely, Likely, Likely, Likely).dominant(), Emotion::Joy);
        assert_eq!(face(Unlikely, Possible, Possible, Possible).dominant(), Emotion::Sorrow);
        assert_eq!(face(VeryUnlikely, Unlikely, VeryLikely, VeryLikely).dominant(), Emotion::Anger);
    }

    #[test]
    fn test_every_combination_is_deterministic() {
        use Likelihood::*;
        let scale = [VeryUnlikely, Unlikely, Possible, Likely, VeryLikely];
        for &j in &scale {
            for &s in &scale {
                for &a in &scale {
                    for &u in &scale {
                        let f = face(j, s, a, u);
                        let max = [j, s, a, u].iter().map(|l| l.score()).max().unwrap();
                        let expected = if max == 0 {
                            Emotion::Neutral
                        } else if j.score() == max {
                            Emotion::Joy
                        } else if s.score() == max {
                            Emotion::Sorrow
                        } else if a.score() == max {
                            Emotion::Anger
                        } else {
                            Emotion::Surprise
                        };
                        assert_eq!(f.dominant(), expected);
                        assert_eq!(f.dominant(), f.dominant());
                    }
                }
            }
        }
    }

    #[test]
    fn test_vision_payload_parses() {
        let json = r#"{"joyLikelihood":"VERY_LIKELY","sorrowLikelihood":"UNLIKELY","angerLikelihood":"UNKNOWN","headwearLikelihood":"POSSIBLE"}"#;
        let parsed: FaceLikelihoods = serde_json::from_str(json).unwrap();
        assert_eq!(parsed.joy, Likelihood::VeryLikely);
        assert_eq!(parsed.anger, Likelihood::Unknown);
        assert_eq!(parsed.surprise, Likelihood::Unknown);
        assert_eq!(parsed.dominant(), Emotion::Joy);
    }

    #[test]
    fn test_unknown_likelihood_is_not_an_expression() {
        let json = r#"{"joyLikelihood":"UNKNOWN","sorrowLikelihood":"VERY_UNLIKELY","angerLikelihood":"VERY_UNLIKELY","surpriseLikelihood":"VERY_UNLIKELY"}"#;
        let parsed: FaceLikelihoods = serde_json::from_str(json).unwrap();
        assert_eq!(parsed.joy, Likelihood::Unknown);
        assert_eq!(parsed.dominant(), Emotion::Neutral);

        use Likelihood::*;
        assert_eq!(face(Unknown, Unlikely, Unknown, Unknown).dominant(), Emotion::Sorrow);
    }

    #[test]
    fn test_unrecognised_likelihood_falls_back_to_unknown() {
        let parsed: Likelihood = serde_json::from_str(r#""SOMEWHAT_LIKELY""#).unwrap();
        assert_eq!(parsed, Likelihood::Unknown);
        assert_eq!(serde_json::to_string(&Likelihood::VeryLikely).unwrap(), r#""VERY_LIKELY""#);
    }

    #[test]
    fn test_emotion_labels_round_trip() {
        for e in [Emotion::Joy, Emotion::Sorrow, Emotion::Anger, Emotion::Surprise, Emotion::Neutral] {
            assert_eq!(Emotion::from_label(e.as_str()), e);
        }
        assert_eq!(Emotion::from_label("melancholy"), Emotion::Neutral);
    }
}
