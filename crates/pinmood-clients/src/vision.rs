//! Google Cloud Vision client (REST `images:annotate`).

use std::time::Duration;

use async_trait::async_trait;
use base64::Engine;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use tracing::debug;

use pinmood_models::{dominant_emotion, Emotion, FaceLikelihoods};

use crate::error::{ClientError, ClientResult};
use crate::http::{build_client, decode, env_or, require_env, DEFAULT_TIMEOUT};

const SERVICE: &str = "vision";

/// Labels requested per image.
pub const MAX_LABELS: u32 = 5;
/// Faces requested per image.
pub const MAX_FACES: u32 = 1;

/// Image to annotate.
#[derive(Debug, Clone)]
pub enum ImageSource {
    /// Publicly reachable URL, fetched by the service.
    Url(String),
    /// Raw image bytes, sent inline.
    Bytes(Vec<u8>),
}

/// What the pipeline needs from an annotation.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ImageAnnotation {
    /// Label descriptions in ranked order
    pub labels: Vec<String>,
    /// Likelihoods of the first detected face
    pub face: Option<FaceLikelihoods>,
}

impl ImageAnnotation {
    pub fn dominant_emotion(&self) -> Emotion {
        dominant_emotion(self.face.as_ref())
    }
}

/// Image labelling and face detection.
#[async_trait]
pub trait ImageAnnotator: Send + Sync {
    async fn annotate(&self, image: &ImageSource) -> ClientResult<ImageAnnotation>;
}

// ============================================================================
// Wire types
// ============================================================================

#[derive(Debug, Serialize)]
struct AnnotateRequest {
    requests: Vec<AnnotateImageRequest>,
}

#[derive(Debug, Serialize)]
struct AnnotateImageRequest {
    image: WireImage,
    features: Vec<Feature>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct WireImage {
    #[serde(skip_serializing_if = "Option::is_none")]
    source: Option<WireImageSource>,
    #[serde(skip_serializing_if = "Option::is_none")]
    content: Option<String>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct WireImageSource {
    image_uri: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct Feature {
    #[serde(rename = "type")]
    kind: &'static str,
    max_results: u32,
}

#[derive(Debug, Deserialize)]
struct AnnotateResponse {
    #[serde(default)]
    responses: Vec<AnnotateImageResponse>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct AnnotateImageResponse {
    #[serde(default)]
    label_annotations: Vec<LabelAnnotation>,
    #[serde(default)]
    face_annotations: Vec<FaceLikelihoods>,
    error: Option<Status>,
}

#[derive(Debug, Deserialize)]
struct LabelAnnotation {
    #[serde(default)]
    description: String,
}

#[derive(Debug, Deserialize, Serialize)]
struct Status {
    #[serde(default)]
    code: i32,
    #[serde(default)]
    message: String,
}

impl WireImage {
    fn from_source(source: &ImageSource) -> Self {
        match source {
            ImageSource::Url(url) => Self {
                source: Some(WireImageSource {
                    image_uri: url.clone(),
                }),
                content: None,
            },
            ImageSource::Bytes(bytes) => Self {
                source: None,
                content: Some(base64::engine::general_purpose::STANDARD.encode(bytes)),
            },
        }
    }
}

// ============================================================================
// Client
// ============================================================================

/// Vision client configuration.
#[derive(Debug, Clone)]
pub struct VisionConfig {
    pub api_key: String,
    /// API root, e.g. `https://vision.googleapis.com/v1`
    pub base_url: String,
    pub timeout: Duration,
}

impl VisionConfig {
    /// Create config from environment variables.
    pub fn from_env() -> ClientResult<Self> {
        Ok(Self {
            api_key: require_env("GOOGLE_VISION_API_KEY")?,
            base_url: env_or("VISION_API_URL", "https://vision.googleapis.com/v1"),
            timeout: DEFAULT_TIMEOUT,
        })
    }
}

pub struct VisionClient {
    http: Client,
    config: VisionConfig,
}

impl VisionClient {
    pub fn new(config: VisionConfig) -> ClientResult<Self> {
        Ok(Self {
            http: build_client(config.timeout)?,
            config,
        })
    }

    /// Create from environment variables.
    pub fn from_env() -> ClientResult<Self> {
        Self::new(VisionConfig::from_env()?)
    }
}

#[async_trait]
impl ImageAnnotator for VisionClient {
    async fn annotate(&self, image: &ImageSource) -> ClientResult<ImageAnnotation> {
        let url = format!("{}/images:annotate", self.config.base_url.trim_end_matches('/'));
        let request = AnnotateRequest {
            requests: vec![AnnotateImageRequest {
                image: WireImage::from_source(image),
                features: vec![
                    Feature {
                        kind: "LABEL_DETECTION",
                        max_results: MAX_LABELS,
                    },
                    Feature {
                        kind: "FACE_DETECTION",
                        max_results: MAX_FACES,
                    },
                ],
            }],
        };

        let response = self
            .http
            .post(&url)
            .query(&[("key", self.config.api_key.as_str())])
            .json(&request)
            .send()
            .await?;

        let body: AnnotateResponse = decode(SERVICE, response).await?;
        let first = body
            .responses
            .into_iter()
            .next()
            .ok_or_else(|| ClientError::invalid_response(SERVICE, "no annotation in response"))?;

        // per-image failures come back inside a 200
        if let Some(status) = first.error.filter(|s| s.code != 0) {
            return Err(ClientError::Upstream {
                service: SERVICE,
                status: 200,
                body: serde_json::to_string(&status).unwrap_or(status.message),
            });
        }

        let annotation = ImageAnnotation {
            labels: first
                .label_annotations
                .into_iter()
                .map(|l| l.description)
                .collect(),
            face: first.face_annotations.into_iter().next(),
        };
        debug!(labels = annotation.labels.len(), face = annotation.face.is_some(), "Image annotated");

        Ok(annotation)
    }
}
