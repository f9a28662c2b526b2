//! Process-wide bearer token slot.
//!
//! Holds at most one token. Readers share the read lock while the token is
//! fresh; a refresh takes the write lock and re-checks, so callers racing on
//! an expired token trigger a single exchange.

use std::future::Future;
use std::time::{Duration, Instant};

use tokio::sync::RwLock;
use tracing::{debug, warn};

use crate::error::ClientResult;

/// Tokens are treated as stale this long before their real expiry.
pub const REFRESH_MARGIN: Duration = Duration::from_secs(30);

struct SlotToken {
    value: String,
    expires_at: Instant,
}

impl SlotToken {
    fn is_fresh(&self, margin: Duration) -> bool {
        Instant::now() + margin < self.expires_at
    }

    fn is_usable(&self) -> bool {
        Instant::now() < self.expires_at
    }
}

pub struct TokenSlot {
    inner: RwLock<Option<SlotToken>>,
    margin: Duration,
}

impl Default for TokenSlot {
    fn default() -> Self {
        Self::new(REFRESH_MARGIN)
    }
}

impl TokenSlot {
    pub fn new(margin: Duration) -> Self {
        Self {
            inner: RwLock::new(None),
            margin,
        }
    }

    /// Return the stored token, or run `refresh` to get a new one.
    ///
    /// `refresh` yields the token and its lifetime. When it fails and the
    /// stored token has not expired yet, the stored token is returned.
    pub async fn get_or_refresh<F, Fut>(&self, refresh: F) -> ClientResult<String>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = ClientResult<(String, Duration)>>,
    {
        {
            let slot = self.inner.read().await;
            if let Some(token) = slot.as_ref().filter(|t| t.is_fresh(self.margin)) {
                return Ok(token.value.clone());
            }
        }

        let mut slot = self.inner.write().await;
        if let Some(token) = slot.as_ref().filter(|t| t.is_fresh(self.margin)) {
            return Ok(token.value.clone());
        }

        match refresh().await {
            Ok((value, ttl)) => {
                debug!(ttl_secs = ttl.as_secs(), "Stored new bearer token");
                *slot = Some(SlotToken {
                    value: value.clone(),
                    expires_at: Instant::now() + ttl,
                });
                Ok(value)
            }
            Err(e) => match slot.as_ref().filter(|t| t.is_usable()) {
                Some(token) => {
                    warn!("Token refresh failed, reusing current token: {}", e);
                    Ok(token.value.clone())
                }
                None => Err(e),
            },
        }
    }

    /// Forget the stored token.
    pub async fn clear(&self) {
        *self.inner.write().await = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ClientError;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    #[tokio::test]
    async fn test_valid_token_is_reused() {
        let slot = TokenSlot::default();
        let calls = AtomicUsize::new(0);

        for _ in 0..3 {
            let token = slot
                .get_or_refresh(|| async {
                    calls.fetch_add(1, Ordering::SeqCst);
                    Ok(("t1".to_string(), Duration::from_secs(3600)))
                })
                .await
                .unwrap();
            assert_eq!(token, "t1");
        }
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_token_within_margin_is_replaced() {
        let slot = TokenSlot::default();
        slot.get_or_refresh(|| async { Ok(("old".to_string(), Duration::from_secs(10))) })
            .await
            .unwrap();

        let token = slot
            .get_or_refresh(|| async { Ok(("new".to_string(), Duration::from_secs(3600))) })
            .await
            .unwrap();
        assert_eq!(token, "new");
    }

    #[tokio::test]
    async fn test_failed_refresh_keeps_unexpired_token() {
        let slot = TokenSlot::default();
        slot.get_or_refresh(|| async { Ok(("old".to_string(), Duration::from_secs(10))) })
            .await
            .unwrap();

        let token = slot
            .get_or_refresh(|| async { Err(ClientError::config("down")) })
            .await
            .unwrap();
        assert_eq!(token, "old");
    }

    #[tokio::test]
    async fn test_failed_refresh_without_token_errors() {
        let slot = TokenSlot::default();
        let result = slot
            .get_or_refresh(|| async { Err(ClientError::config("down")) })
            .await;
        tokio_test::assert_err!(result);
    }

    #[tokio::test]
    async fn test_concurrent_callers_share_one_refresh() {
        let slot = Arc::new(TokenSlot::default());
        let calls = Arc::new(AtomicUsize::new(0));

        let tasks: Vec<_> = (0..8)
            .map(|_| {
                let slot = slot.clone();
                let calls = calls.clone();
                tokio::spawn(async move {
                    slot.get_or_refresh(|| async move {
                        calls.fetch_add(1, Ordering::SeqCst);
                        tokio::time::sleep(Duration::from_millis(20)).await;
                        Ok(("shared".to_string(), Duration::from_secs(3600)))
                    })
                    .await
                })
            })
            .collect();

        for task in tasks {
            assert_eq!(task.await.unwrap().unwrap(), "shared");
        }
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }
}
