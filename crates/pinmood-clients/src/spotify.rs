//! Spotify catalog client.
//!
//! Authenticates with the client-credentials flow and caches the bearer
//! token in a [`TokenSlot`] shared by every search.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use tracing::{debug, warn};

use crate::error::{ClientError, ClientResult};
use crate::http::{build_client, decode, env_or, require_env, DEFAULT_TIMEOUT};
use crate::token::TokenSlot;

const SERVICE: &str = "spotify";

/// Best catalog match for a search.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Track {
    pub name: String,
    /// First listed artist
    pub artist: String,
    /// Public `open.spotify.com` link
    pub url: String,
}

/// Top-1 track search against a music catalog.
#[async_trait]
pub trait TrackCatalog: Send + Sync {
    /// Search for a track. `Ok(None)` when nothing matched.
    ///
    /// Failing to obtain credentials is reported as [`ClientError::Auth`].
    async fn search_track(&self, query: &str) -> ClientResult<Option<Track>>;
}

// ============================================================================
// Wire types
// ============================================================================

#[derive(Debug, Deserialize)]
struct TokenResponse {
    access_token: String,
    expires_in: u64,
}

#[derive(Debug, Deserialize)]
struct SearchResponse {
    tracks: Option<TrackPage>,
}

#[derive(Debug, Deserialize)]
struct TrackPage {
    #[serde(default)]
    items: Vec<TrackItem>,
}

#[derive(Debug, Deserialize)]
struct TrackItem {
    name: String,
    #[serde(default)]
    artists: Vec<ArtistItem>,
    #[serde(default)]
    external_urls: ExternalUrls,
}

#[derive(Debug, Deserialize)]
struct ArtistItem {
    name: String,
}

#[derive(Debug, Default, Deserialize)]
struct ExternalUrls {
    spotify: Option<String>,
}

impl TrackItem {
    fn into_track(self) -> Option<Track> {
        Some(Track {
            name: self.name,
            artist: self.artists.into_iter().next().map(|a| a.name).unwrap_or_default(),
            url: self.external_urls.spotify?,
        })
    }
}

// ============================================================================
// Client
// ============================================================================

/// Spotify client configuration.
#[derive(Debug, Clone)]
pub struct SpotifyConfig {
    pub client_id: String,
    pub client_secret: String,
    /// Accounts service root, e.g. `https://accounts.spotify.com`
    pub accounts_url: String,
    /// Web API root, e.g. `https://api.spotify.com/v1`
    pub api_url: String,
    pub timeout: Duration,
}

impl SpotifyConfig {
    /// Create config from environment variables.
    pub fn from_env() -> ClientResult<Self> {
        Ok(Self {
            client_id: require_env("SPOTIFY_CLIENT_ID")?,
            client_secret: require_env("SPOTIFY_CLIENT_SECRET")?,
            accounts_url: env_or("SPOTIFY_ACCOUNTS_URL", "https://accounts.spotify.com"),
            api_url: env_or("SPOTIFY_API_URL", "https://api.spotify.com/v1"),
            timeout: DEFAULT_TIMEOUT,
        })
    }
}

pub struct SpotifyClient {
    http: Client,
    config: SpotifyConfig,
    token: TokenSlot,
}

impl SpotifyClient {
    pub fn new(config: SpotifyConfig) -> ClientResult<Self> {
        Ok(Self {
            http: build_client(config.timeout)?,
            config,
            token: TokenSlot::default(),
        })
    }

    /// Create from environment variables.
    pub fn from_env() -> ClientResult<Self> {
        Self::new(SpotifyConfig::from_env()?)
    }

    /// Current bearer token, exchanging client credentials when needed.
    pub async fn access_token(&self) -> ClientResult<String> {
        self.token
            .get_or_refresh(|| self.request_token())
            .await
            .map_err(|e| ClientError::auth(SERVICE, e))
    }

    async fn request_token(&self) -> ClientResult<(String, Duration)> {
        let url = format!("{}/api/token", self.config.accounts_url.trim_end_matches('/'));

        let response = self
            .http
            .post(&url)
            .basic_auth(&self.config.client_id, Some(&self.config.client_secret))
            .form(&[("grant_type", "client_credentials")])
            .send()
            .await?;

        let token: TokenResponse = decode(SERVICE, response).await?;
        debug!(expires_in = token.expires_in, "Obtained Spotify access token");
        Ok((token.access_token, Duration::from_secs(token.expires_in)))
    }
}

#[async_trait]
impl TrackCatalog for SpotifyClient {
    async fn search_track(&self, query: &str) -> ClientResult<Option<Track>> {
        let token = self.access_token().await?;
        let url = format!("{}/search", self.config.api_url.trim_end_matches('/'));

        let response = self
            .http
            .get(&url)
            .bearer_auth(token)
            .query(&[("q", query), ("type", "track"), ("limit", "1")])
            .send()
            .await?;

        // a revoked token is dropped so the next search exchanges again
        if response.status() == reqwest::StatusCode::UNAUTHORIZED {
            warn!("Spotify rejected the cached token");
            self.token.clear().await;
        }

        let body: SearchResponse = decode(SERVICE, response).await?;
        Ok(body
            .tracks
            .and_then(|page| page.items.into_iter().next())
            .and_then(TrackItem::into_track))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{body_string, header, method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn client(server: &MockServer) -> SpotifyClient {
        SpotifyClient::new(SpotifyConfig {
            client_id: "id".to_string(),
            client_secret: "secret".to_string(),
            accounts_url: server.uri(),
            api_url: format!("{}/v1", server.uri()),
            timeout: Duration::from_secs(5),
        })
        .unwrap()
    }

    async fn mount_token(server: &MockServer, expected_calls: u64) {
        Mock::given(method("POST"))
            .and(path("/api/token"))
            // base64("id:secret")
            .and(header("authorization", "Basic aWQ6c2VjcmV0"))
            .and(body_string("grant_type=client_credentials"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "access_token": "tok",
                "token_type": "Bearer",
                "expires_in": 3600
            })))
            .expect(expected_calls)
            .mount(server)
            .await;
    }

    fn track_page(items: serde_json::Value) -> serde_json::Value {
        serde_json::json!({"tracks": {"items": items}})
    }

    #[tokio::test]
    async fn test_search_returns_first_track() {
        let server = MockServer::start().await;
        mount_token(&server, 1).await;
        Mock::given(method("GET"))
            .and(path("/v1/search"))
            .and(header("authorization", "Bearer tok"))
            .and(query_param("q", "Clocks Coldplay"))
            .and(query_param("type", "track"))
            .and(query_param("limit", "1"))
            .respond_with(ResponseTemplate::new(200).set_body_json(track_page(serde_json::json!([{
                "name": "Clocks",
                "artists": [{"name": "Coldplay"}, {"name": "Other"}],
                "external_urls": {"spotify": "https://open.spotify.com/track/0BCPKOYdS2jbQ8iyB56Zns"}
            }]))))
            .mount(&server)
            .await;

        let track = client(&server).search_track("Clocks Coldplay").await.unwrap().unwrap();
        assert_eq!(
            track,
            Track {
                name: "Clocks".to_string(),
                artist: "Coldplay".to_string(),
                url: "https://open.spotify.com/track/0BCPKOYdS2jbQ8iyB56Zns".to_string(),
            }
        );
    }

    #[tokio::test]
    async fn test_no_items_is_none() {
        let server = MockServer::start().await;
        mount_token(&server, 1).await;
        Mock::given(method("GET"))
            .and(path("/v1/search"))
            .respond_with(ResponseTemplate::new(200).set_body_json(track_page(serde_json::json!([]))))
            .mount(&server)
            .await;

        assert!(client(&server).search_track("nothing").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_token_reused_across_searches() {
        let server = MockServer::start().await;
        mount_token(&server, 1).await;
        Mock::given(method("GET"))
            .and(path("/v1/search"))
            .respond_with(ResponseTemplate::new(200).set_body_json(track_page(serde_json::json!([]))))
            .expect(3)
            .mount(&server)
            .await;

        let client = client(&server);
        for query in ["a", "b", "c"] {
            client.search_track(query).await.unwrap();
        }
    }

    #[tokio::test]
    async fn test_token_failure_is_auth_error() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/api/token"))
            .respond_with(ResponseTemplate::new(400).set_body_json(serde_json::json!({
                "error": "invalid_client"
            })))
            .mount(&server)
            .await;

        let err = client(&server).search_track("x").await.unwrap_err();
        assert!(err.is_auth());
        assert_eq!(err.detail()["error"], "invalid_client");
    }

    #[tokio::test]
    async fn test_search_failure_is_not_auth_error() {
        let server = MockServer::start().await;
        mount_token(&server, 1).await;
        Mock::given(method("GET"))
            .and(path("/v1/search"))
            .respond_with(ResponseTemplate::new(503))
            .mount(&server)
            .await;

        let err = client(&server).search_track("x").await.unwrap_err();
        assert!(!err.is_auth());
        assert!(matches!(err, ClientError::Upstream { status: 503, .. }));
    }

    #[tokio::test]
    async fn test_rejected_token_is_dropped() {
        let server = MockServer::start().await;
        mount_token(&server, 2).await;
        Mock::given(method("GET"))
            .and(path("/v1/search"))
            .respond_with(ResponseTemplate::new(401))
            .up_to_n_times(1)
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/v1/search"))
            .respond_with(ResponseTemplate::new(200).set_body_json(track_page(serde_json::json!([]))))
            .mount(&server)
            .await;

        let client = client(&server);
        let err = client.search_track("x").await.unwrap_err();
        assert!(matches!(err, ClientError::Upstream { status: 401, .. }));
        assert!(client.search_track("x").await.unwrap().is_none());
    }
}
