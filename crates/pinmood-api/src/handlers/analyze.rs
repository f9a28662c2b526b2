//! Pin analysis by image URL.

use axum::extract::{Query, State};
use axum::Json;
use serde::Deserialize;
use tracing::{error, info};

use pinmood_models::AnalysisResult;

use crate::error::{ApiError, ApiResult};
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct AnalyzeQuery {
    #[serde(rename = "imageUrl")]
    pub image_url: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AnalyzeRequest {
    #[serde(default)]
    pub image_url: Option<String>,
    /// Accepted for compatibility; analyses are not per-user.
    #[serde(default)]
    pub user_id: Option<String>,
}

/// `GET /analyze?imageUrl=...`
pub async fn analyze_pin_query(
    State(state): State<AppState>,
    Query(query): Query<AnalyzeQuery>,
) -> ApiResult<Json<AnalysisResult>> {
    analyze(&state, query.image_url).await
}

/// `POST /analyze` with `{imageUrl, userId}`.
pub async fn analyze_pin(
    State(state): State<AppState>,
    body: Option<Json<AnalyzeRequest>>,
) -> ApiResult<Json<AnalysisResult>> {
    let image_url = body.and_then(|Json(request)| request.image_url);
    analyze(&state, image_url).await
}

async fn analyze(state: &AppState, image_url: Option<String>) -> ApiResult<Json<AnalysisResult>> {
    // blank URLs are rejected, but the cache is keyed on the URL exactly as sent
    let image_url = image_url
        .filter(|u| !u.trim().is_empty())
        .ok_or_else(|| ApiError::bad_request("Image URL is required"))?;

    info!(image_url = %image_url, "Analyzing pin");

    let result = state.pipeline.analyze_url(&image_url).await.map_err(|e| {
        error!(image_url = %image_url, "Pin analysis failed: {}", e);
        ApiError::upstream("Failed to analyze pin", e.detail())
    })?;

    Ok(Json(result))
}
