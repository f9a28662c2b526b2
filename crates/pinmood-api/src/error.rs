//! API error types.
//!
//! Every error renders as `{"message": ..., "error": ...}`; `error` carries
//! the vendor's response body when a third-party call failed.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Serialize;
use thiserror::Error;

pub type ApiResult<T> = Result<T, ApiError>;

#[derive(Debug, Error)]
pub enum ApiError {
    #[error("Bad request: {0}")]
    BadRequest(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Rate limited")]
    RateLimited,

    /// A third-party call failed; `detail` is what the vendor said.
    #[error("{message}: {detail}")]
    Upstream {
        message: String,
        detail: serde_json::Value,
    },
}

impl ApiError {
    pub fn bad_request(msg: impl Into<String>) -> Self {
        Self::BadRequest(msg.into())
    }

    pub fn not_found(msg: impl Into<String>) -> Self {
        Self::NotFound(msg.into())
    }

    pub fn upstream(message: impl Into<String>, detail: serde_json::Value) -> Self {
        Self::Upstream {
            message: message.into(),
            detail,
        }
    }

    fn status_code(&self) -> StatusCode {
        match self {
            ApiError::BadRequest(_) => StatusCode::BAD_REQUEST,
            ApiError::NotFound(_) => StatusCode::NOT_FOUND,
            ApiError::RateLimited => StatusCode::TOO_MANY_REQUESTS,
            ApiError::Upstream { .. } => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

#[derive(Serialize)]
struct ErrorResponse {
    message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    error: Option<serde_json::Value>,
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status_code();

        let body = match self {
            ApiError::BadRequest(message) | ApiError::NotFound(message) => ErrorResponse {
                message,
                error: None,
            },
            ApiError::RateLimited => ErrorResponse {
                message: "Rate limit exceeded. Please try again later.".to_string(),
                error: None,
            },
            ApiError::Upstream { message, detail } => ErrorResponse {
                message,
                error: Some(detail),
            },
        };

        (status, Json(body)).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::to_bytes;

    async fn render(err: ApiError) -> (StatusCode, serde_json::Value) {
        let response = err.into_response();
        let status = response.status();
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        (status, serde_json::from_slice(&bytes).unwrap())
    }

    #[tokio::test]
    async fn test_bad_request_has_message_only() {
        let (status, body) = render(ApiError::bad_request("Image URL is required")).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body, serde_json::json!({"message": "Image URL is required"}));
    }

    #[tokio::test]
    async fn test_rate_limited_is_429() {
        let (status, body) = render(ApiError::RateLimited).await;
        assert_eq!(status, StatusCode::TOO_MANY_REQUESTS);
        assert!(body.get("error").is_none());
    }

    #[tokio::test]
    async fn test_upstream_passes_detail_through() {
        let detail = serde_json::json!({"error": {"code": 403, "message": "denied"}});
        let (status, body) = render(ApiError::upstream("Failed to analyze pin", detail.clone())).await;
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(body["message"], "Failed to analyze pin");
        assert_eq!(body["error"], detail);
    }
}
