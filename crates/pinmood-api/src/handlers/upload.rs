//! Analysis of an uploaded image.

use axum::extract::{Multipart, State};
use axum::Json;
use tracing::{error, info};

use pinmood_models::AnalysisResult;

use crate::error::{ApiError, ApiResult};
use crate::state::AppState;

/// Multipart field carrying the image.
pub const IMAGE_FIELD: &str = "image";

/// `POST /upload` with multipart field `image`. Results are not cached.
pub async fn upload_image(
    State(state): State<AppState>,
    mut multipart: Multipart,
) -> ApiResult<Json<AnalysisResult>> {
    let mut image = None;

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| ApiError::bad_request(format!("Invalid multipart body: {}", e)))?
    {
        if field.name() == Some(IMAGE_FIELD) {
            let bytes = field
                .bytes()
                .await
                .map_err(|e| ApiError::bad_request(format!("Failed to read upload: {}", e)))?;
            image = Some(bytes);
            break;
        }
    }

    let image = image
        .filter(|bytes| !bytes.is_empty())
        .ok_or_else(|| ApiError::bad_request("No image uploaded"))?;

    info!(size = image.len(), "Analyzing uploaded image");

    let result = state
        .pipeline
        .analyze_upload(image.to_vec())
        .await
        .map_err(|e| {
            error!("Upload analysis failed: {}", e);
            ApiError::upstream("Failed to analyze image", e.detail())
        })?;

    Ok(Json(result))
}
