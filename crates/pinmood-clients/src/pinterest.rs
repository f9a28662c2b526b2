//! Pinterest OAuth and pins client (API v5).

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use tracing::{debug, info, warn};

use pinmood_models::{Pin, PinPage, UserAccount};

use crate::error::{ClientError, ClientResult};
use crate::http::{build_client, decode, env_or, require_env, DEFAULT_TIMEOUT};

const SERVICE: &str = "pinterest";

/// Scopes requested at sign-in.
pub const OAUTH_SCOPES: &str = "user_accounts:read,pins:read,boards:read";
/// Pins requested per page.
pub const PAGE_SIZE: u32 = 25;
/// Pin fields requested from the pins endpoint.
pub const PIN_FIELDS: &str = "id,title,description,media";

/// Pinterest operations used by sign-in and the pins listing.
#[async_trait]
pub trait PinterestApi: Send + Sync {
    /// Authorization page URL carrying `state`.
    fn authorize_url(&self, state: &str) -> String;

    /// Exchange an authorization code for an access token.
    async fn exchange_code(&self, code: &str) -> ClientResult<String>;

    async fn user_account(&self, access_token: &str) -> ClientResult<UserAccount>;

    /// One page of pins, as returned by the API.
    async fn pins_page(
        &self,
        access_token: &str,
        bookmark: Option<&str>,
    ) -> ClientResult<serde_json::Value>;

    /// Follow bookmarks until the last page.
    ///
    /// A failing page ends the walk; the pins collected so far are kept.
    async fn all_pins(&self, access_token: &str) -> Vec<Pin> {
        let mut pins = Vec::new();
        let mut bookmark: Option<String> = None;

        loop {
            let page = match self.pins_page(access_token, bookmark.as_deref()).await {
                Ok(raw) => match serde_json::from_value::<PinPage>(raw) {
                    Ok(page) => page,
                    Err(e) => {
                        warn!("Unreadable pins page: {}", e);
                        break;
                    }
                },
                Err(e) => {
                    warn!("Stopped fetching pins: {}", e);
                    break;
                }
            };

            let next = page.next_bookmark().map(str::to_string);
            pins.extend(page.items);

            match next {
                Some(b) if bookmark.as_deref() != Some(b.as_str()) => bookmark = Some(b),
                _ => break,
            }
        }

        info!(count = pins.len(), "Fetched Pinterest pins");
        pins
    }
}

#[derive(Debug, Deserialize)]
struct TokenResponse {
    access_token: String,
}

/// Pinterest client configuration.
#[derive(Debug, Clone)]
pub struct PinterestConfig {
    pub client_id: String,
    pub client_secret: String,
    pub redirect_uri: String,
    /// API root, e.g. `https://api.pinterest.com/v5`
    pub api_url: String,
    /// Authorization page, e.g. `https://www.pinterest.com/oauth/`
    pub oauth_url: String,
    pub timeout: Duration,
}

impl PinterestConfig {
    /// Create config from environment variables.
    pub fn from_env() -> ClientResult<Self> {
        Ok(Self {
            client_id: require_env("PINTEREST_CLIENT_ID")?,
            client_secret: require_env("PINTEREST_CLIENT_SECRET")?,
            redirect_uri: env_or(
                "PINTEREST_REDIRECT_URI",
                "http://localhost:5001/auth/pinterest/callback",
            ),
            api_url: env_or("PINTEREST_API_URL", "https://api.pinterest.com/v5"),
            oauth_url: env_or("PINTEREST_OAUTH_URL", "https://www.pinterest.com/oauth/"),
            timeout: DEFAULT_TIMEOUT,
        })
    }
}

pub struct PinterestClient {
    http: Client,
    config: PinterestConfig,
}

impl PinterestClient {
    pub fn new(config: PinterestConfig) -> ClientResult<Self> {
        Ok(Self {
            http: build_client(config.timeout)?,
            config,
        })
    }

    /// Create from environment variables.
    pub fn from_env() -> ClientResult<Self> {
        Self::new(PinterestConfig::from_env()?)
    }

    fn endpoint(&self, path: &str) -> String {
        format!("{}/{}", self.config.api_url.trim_end_matches('/'), path)
    }
}

#[async_trait]
impl PinterestApi for PinterestClient {
    fn authorize_url(&self, state: &str) -> String {
        format!(
            "{}?response_type=code&client_id={}&redirect_uri={}&scope={}&state={}",
            self.config.oauth_url,
            urlencoding::encode(&self.config.client_id),
            urlencoding::encode(&self.config.redirect_uri),
            OAUTH_SCOPES,
            urlencoding::encode(state),
        )
    }

    async fn exchange_code(&self, code: &str) -> ClientResult<String> {
        let response = self
            .http
            .post(self.endpoint("oauth/token"))
            .basic_auth(&self.config.client_id, Some(&self.config.client_secret))
            .form(&[
                ("grant_type", "authorization_code"),
                ("redirect_uri", self.config.redirect_uri.as_str()),
                ("code", code),
            ])
            .send()
            .await?;

        let token: TokenResponse = decode(SERVICE, response).await?;
        if token.access_token.is_empty() {
            return Err(ClientError::invalid_response(SERVICE, "empty access_token"));
        }
        debug!("Exchanged Pinterest authorization code");
        Ok(token.access_token)
    }

    async fn user_account(&self, access_token: &str) -> ClientResult<UserAccount> {
        let response = self
            .http
            .get(self.endpoint("user_account"))
            .bearer_auth(access_token)
            .send()
            .await?;

        decode(SERVICE, response).await
    }

    async fn pins_page(
        &self,
        access_token: &str,
        bookmark: Option<&str>,
    ) -> ClientResult<serde_json::Value> {
        let page_size = PAGE_SIZE.to_string();
        let mut query = vec![("page_size", page_size.as_str()), ("fields", PIN_FIELDS)];
        if let Some(bookmark) = bookmark {
            query.push(("bookmark", bookmark));
        }

        let response = self
            .http
            .get(self.endpoint("pins"))
            .bearer_auth(access_token)
            .query(&query)
            .send()
            .await?;

        decode(SERVICE, response).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{body_string_contains, header, method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn config(server: &MockServer) -> PinterestConfig {
        PinterestConfig {
            client_id: "cid".to_string(),
            client_secret: "csecret".to_string(),
            redirect_uri: "http://localhost:5001/auth/pinterest/callback".to_string(),
            api_url: format!("{}/v5", server.uri()),
            oauth_url: "https://www.pinterest.com/oauth/".to_string(),
            timeout: Duration::from_secs(5),
        }
    }

    #[tokio::test]
    async fn test_authorize_url() {
        let server = MockServer::start().await;
        let client = PinterestClient::new(config(&server)).unwrap();

        assert_eq!(
            client.authorize_url("abc123"),
            "https://www.pinterest.com/oauth/?response_type=code&client_id=cid\
             &redirect_uri=http%3A%2F%2Flocalhost%3A5001%2Fauth%2Fpinterest%2Fcallback\
             &scope=user_accounts:read,pins:read,boards:read&state=abc123"
        );
    }

    #[tokio::test]
    async fn test_exchange_code() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/v5/oauth/token"))
            // base64("cid:csecret")
            .and(header("authorization", "Basic Y2lkOmNzZWNyZXQ="))
            .and(body_string_contains("grant_type=authorization_code"))
            .and(body_string_contains("code=the-code"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "access_token": "pina_token",
                "token_type": "bearer",
                "expires_in": 2592000
            })))
            .expect(1)
            .mount(&server)
            .await;

        let client = PinterestClient::new(config(&server)).unwrap();
        assert_eq!(client.exchange_code("the-code").await.unwrap(), "pina_token");
    }

    #[tokio::test]
    async fn test_user_account() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/v5/user_account"))
            .and(header("authorization", "Bearer pina_token"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "username": "moodboard",
                "account_type": "PINNER"
            })))
            .mount(&server)
            .await;

        let client = PinterestClient::new(config(&server)).unwrap();
        let account = client.user_account("pina_token").await.unwrap();
        assert_eq!(account.username.as_deref(), Some("moodboard"));
    }

    #[tokio::test]
    async fn test_all_pins_follows_bookmarks() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/v5/pins"))
            .and(query_param("bookmark", "page2"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "items": [{"id": "3"}],
                "bookmark": null
            })))
            .expect(1)
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/v5/pins"))
            .and(query_param("page_size", "25"))
            .and(query_param("fields", "id,title,description,media"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "items": [{"id": "1", "title": "Sunset"}, {"id": "2"}],
                "bookmark": "page2"
            })))
            .expect(1)
            .mount(&server)
            .await;

        let client = PinterestClient::new(config(&server)).unwrap();
        let ids: Vec<String> = client
            .all_pins("pina_token")
            .await
            .into_iter()
            .map(|p| p.id)
            .collect();
        assert_eq!(ids, vec!["1", "2", "3"]);
    }

    #[tokio::test]
    async fn test_all_pins_keeps_pages_before_failure() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/v5/pins"))
            .and(query_param("bookmark", "page2"))
            .respond_with(ResponseTemplate::new(500))
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/v5/pins"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "items": [{"id": "1"}],
                "bookmark": "page2"
            })))
            .mount(&server)
            .await;

        let client = PinterestClient::new(config(&server)).unwrap();
        let pins = client.all_pins("pina_token").await;
        assert_eq!(pins.len(), 1);
    }
}
