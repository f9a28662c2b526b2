//! Pinterest sign-in and pin listing.

use axum::extract::{Query, State};
use axum::response::Redirect;
use axum::Json;
use serde::Deserialize;
use tracing::{error, info, warn};

use crate::error::{ApiError, ApiResult};
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct CallbackQuery {
    pub code: Option<String>,
    pub state: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct PinsQuery {
    #[serde(rename = "accessToken")]
    pub access_token: Option<String>,
}

/// `GET /auth/pinterest`: send the user to the authorization page.
pub async fn pinterest_sign_in(State(state): State<AppState>) -> Redirect {
    let oauth_state = state.oauth_states.issue().await;
    Redirect::to(&state.pinterest.authorize_url(&oauth_state))
}

/// `GET /auth/pinterest/callback`: finish sign-in and hand the token to the
/// frontend dashboard along with the first pin.
pub async fn pinterest_callback(
    State(state): State<AppState>,
    Query(query): Query<CallbackQuery>,
) -> ApiResult<Redirect> {
    let valid_state = match query.state.as_deref() {
        Some(s) => state.oauth_states.consume(s).await,
        None => false,
    };
    if !valid_state {
        warn!("Rejected sign-in callback with unknown state");
        return Err(ApiError::bad_request("Invalid state parameter."));
    }

    let code = query
        .code
        .filter(|c| !c.is_empty())
        .ok_or_else(|| ApiError::bad_request("Authorization code not found."))?;

    let oauth_failed = |e: pinmood_clients::ClientError| {
        error!("Pinterest OAuth failed: {}", e);
        ApiError::upstream("OAuth process failed", e.detail())
    };

    let access_token = state.pinterest.exchange_code(&code).await.map_err(oauth_failed)?;
    let account = state
        .pinterest
        .user_account(&access_token)
        .await
        .map_err(oauth_failed)?;

    let pins = state.pinterest.all_pins(&access_token).await;
    info!(
        username = account.username.as_deref().unwrap_or(""),
        pins = pins.len(),
        "Pinterest sign-in complete"
    );

    let first_pin = pins.first().map(|p| p.id.as_str()).unwrap_or("");
    let target = format!(
        "{}/dashboard?accessToken={}&pinId={}",
        state.config.frontend_url,
        urlencoding::encode(&access_token),
        urlencoding::encode(first_pin),
    );

    Ok(Redirect::to(&target))
}

/// `GET /pinterest/pins?accessToken=...`: one page of the user's pins.
pub async fn list_pins(
    State(state): State<AppState>,
    Query(query): Query<PinsQuery>,
) -> ApiResult<Json<serde_json::Value>> {
    let access_token = query
        .access_token
        .filter(|t| !t.is_empty())
        .ok_or_else(|| ApiError::bad_request("Access token missing"))?;

    let page = state
        .pinterest
        .pins_page(&access_token, None)
        .await
        .map_err(|e| {
            error!("Failed to fetch pins: {}", e);
            ApiError::upstream("Failed to fetch pins", e.detail())
        })?;

    Ok(Json(page))
}
