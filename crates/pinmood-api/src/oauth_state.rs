//! Pending sign-in `state` values.
//!
//! Every authorization redirect gets its own state, so concurrent sign-ins
//! never overwrite each other. A state is accepted once, and only until it
//! expires.

use std::collections::HashMap;
use std::time::{Duration, Instant};

use tokio::sync::RwLock;
use uuid::Uuid;

/// How long a sign-in may take between redirect and callback.
pub const STATE_TTL: Duration = Duration::from_secs(10 * 60);

pub struct OAuthStateStore {
    ttl: Duration,
    pending: RwLock<HashMap<String, Instant>>,
}

impl Default for OAuthStateStore {
    fn default() -> Self {
        Self::new(STATE_TTL)
    }
}

impl OAuthStateStore {
    pub fn new(ttl: Duration) -> Self {
        Self {
            ttl,
            pending: RwLock::new(HashMap::new()),
        }
    }

    /// Issue a fresh state. Expired entries are dropped on the way.
    pub async fn issue(&self) -> String {
        let state = Uuid::new_v4().simple().to_string();
        let now = Instant::now();

        let mut pending = self.pending.write().await;
        pending.retain(|_, expires_at| *expires_at > now);
        pending.insert(state.clone(), now + self.ttl);

        state
    }

    /// Accept `state` if it was issued and has not expired. Single use.
    pub async fn consume(&self, state: &str) -> bool {
        match self.pending.write().await.remove(state) {
            Some(expires_at) => expires_at > Instant::now(),
            None => false,
        }
    }

    pub async fn pending(&self) -> usize {
        self.pending.read().await.len()
    }
}
