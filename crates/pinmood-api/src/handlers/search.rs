//! Direct catalog search.

use axum::extract::{Query, State};
use axum::Json;
use serde::Deserialize;
use tracing::error;

use pinmood_models::MusicRecommendation;

use crate::error::{ApiError, ApiResult};
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct SearchQuery {
    pub query: Option<String>,
}

/// `GET /search?query=...`: the single best track match.
pub async fn search_track(
    State(state): State<AppState>,
    Query(params): Query<SearchQuery>,
) -> ApiResult<Json<MusicRecommendation>> {
    let query = params
        .query
        .filter(|q| !q.trim().is_empty())
        .ok_or_else(|| ApiError::bad_request("Missing query parameter"))?;

    let track = state.catalog.search_track(&query).await.map_err(|e| {
        error!(query = %query, "Spotify search failed: {}", e);
        ApiError::upstream("Failed to search Spotify", e.detail())
    })?;

    match track {
        Some(track) => Ok(Json(MusicRecommendation {
            song: track.name,
            artist: track.artist,
            url: track.url,
        })),
        None => Err(ApiError::not_found(format!("No track found for '{}'", query))),
    }
}
