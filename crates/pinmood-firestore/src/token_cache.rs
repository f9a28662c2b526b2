//! Access-token caching for Firestore authentication.
//!
//! Tokens come from an [`AccessTokenSource`] (a GCP service account in
//! production, a fixed token against the emulator) and are reused until
//! shortly before they expire. Refreshes are single-flight: concurrent
//! callers wait on the write lock and pick up the token the first one
//! fetched.

use std::sync::Arc;
use std::time::{Duration, Instant};

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use gcp_auth::TokenProvider;
use tokio::sync::RwLock;
use tracing::{debug, warn};

use crate::error::{FirestoreError, FirestoreResult};

/// Refresh tokens this long before they expire.
const TOKEN_REFRESH_MARGIN: Duration = Duration::from_secs(60);

/// OAuth scope for Firestore/Datastore access.
pub const FIRESTORE_SCOPE: &str = "https://www.googleapis.com/auth/datastore";

/// A bearer token and the moment it stops being accepted.
#[derive(Debug, Clone)]
pub struct IssuedToken {
    pub value: String,
    pub expires_at: DateTime<Utc>,
}

/// Something that can mint Firestore bearer tokens.
#[async_trait]
pub trait AccessTokenSource: Send + Sync {
    async fn fetch(&self) -> FirestoreResult<IssuedToken>;
}

/// Service-account backed token source.
pub struct GcpTokenSource {
    provider: Arc<dyn TokenProvider>,
}

impl GcpTokenSource {
    pub fn new(provider: Arc<dyn TokenProvider>) -> Self {
        Self { provider }
    }
}

#[async_trait]
impl AccessTokenSource for GcpTokenSource {
    async fn fetch(&self) -> FirestoreResult<IssuedToken> {
        let token = self
            .provider
            .token(&[FIRESTORE_SCOPE])
            .await
            .map_err(|e| FirestoreError::auth_error(format!("Failed to obtain auth token: {}", e)))?;

        Ok(IssuedToken {
            value: token.as_str().to_string(),
            expires_at: token.expires_at(),
        })
    }
}

/// Fixed token, used against the Firestore emulator which accepts "owner".
pub struct StaticTokenSource(pub String);

#[async_trait]
impl AccessTokenSource for StaticTokenSource {
    async fn fetch(&self) -> FirestoreResult<IssuedToken> {
        Ok(IssuedToken {
            value: self.0.clone(),
            expires_at: Utc::now() + chrono::Duration::days(365),
        })
    }
}

struct CachedToken {
    access_token: String,
    expires_at: Instant,
}

impl CachedToken {
    fn from_issued(issued: IssuedToken) -> Self {
        // an already-expired token gets `now`, which forces a refresh next time
        let ttl = (issued.expires_at - Utc::now()).to_std().unwrap_or(Duration::ZERO);
        Self {
            access_token: issued.value,
            expires_at: Instant::now() + ttl,
        }
    }

    fn is_fresh(&self) -> bool {
        Instant::now() + TOKEN_REFRESH_MARGIN < self.expires_at
    }

    fn is_usable(&self) -> bool {
        Instant::now() < self.expires_at
    }
}

/// Thread-safe token cache with single-flight refresh.
pub struct TokenCache {
    source: Arc<dyn AccessTokenSource>,
    cache: RwLock<Option<CachedToken>>,
}

impl TokenCache {
    pub fn new(source: Arc<dyn AccessTokenSource>) -> Self {
        Self {
            source,
            cache: RwLock::new(None),
        }
    }

    /// Drop the cached token, e.g. after the server reported it expired.
    pub async fn invalidate(&self) {
        *self.cache.write().await = None;
    }

    /// Return a fresh token, fetching one if needed.
    ///
    /// If the fetch fails while the cached token has not expired yet, the
    /// cached token is returned instead of the error.
    pub async fn get_token(&self) -> FirestoreResult<String> {
        {
            let cache = self.cache.read().await;
            if let Some(cached) = cache.as_ref().filter(|c| c.is_fresh()) {
                return Ok(cached.access_token.clone());
            }
        }

        let mut cache = self.cache.write().await;
        if let Some(cached) = cache.as_ref().filter(|c| c.is_fresh()) {
            return Ok(cached.access_token.clone());
        }

        match self.source.fetch().await {
            Ok(issued) => {
                let fresh = CachedToken::from_issued(issued);
                let token = fresh.access_token.clone();
                *cache = Some(fresh);
                debug!("Refreshed Firestore auth token");
                Ok(token)
            }
            Err(e) => match cache.as_ref().filter(|c| c.is_usable()) {
                Some(cached) => {
                    warn!("Token refresh failed, using existing token: {}", e);
                    Ok(cached.access_token.clone())
                }
                None => Err(e),
            },
        }
    }
}
