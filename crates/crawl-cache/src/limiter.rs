//! Minimum-interval request spacing
//!
//! Spacing state is kept in the shared cache as unix milliseconds per
//! key rather than inside the limiter, so every component using the same
//! cache observes the same schedule. `wait` suspends the calling task; it
//! never queues or drops work.

use std::sync::Arc;
use std::time::{Duration, SystemTime, UNIX_EPOCH};

use tracing::debug;

use crate::MemoryCache;

/// Task-suspending rate limiter over the shared cache.
#[derive(Clone)]
pub struct RateLimiter {
    cache: Arc<MemoryCache>,
}

impl RateLimiter {
    pub fn new(cache: Arc<MemoryCache>) -> Self {
        Self { cache }
    }

    /// Suspend until at least `min_interval` has passed since the last
    /// completed `wait` on `key`, then record the new invocation time.
    /// The timestamp is written after any suspension, so successive
    /// completions are spaced by the full interval.
    pub async fn wait(&self, key: &str, min_interval: Duration) {
        let state_key = Self::state_key(key);
        if let Some(raw) = self.cache.get(&state_key).await {
            if let Ok(last_ms) = raw.parse::<u64>() {
                let elapsed = Duration::from_millis(unix_millis().saturating_sub(last_ms));
                if elapsed < min_interval {
                    let remaining = min_interval - elapsed;
                    debug!(key, remaining_ms = remaining.as_millis() as u64, "rate limited, pausing");
                    tokio::time::sleep(remaining).await;
                }
            }
        }
        self.cache.set(state_key, unix_millis().to_string(), None).await;
    }

    // Timestamps live in their own namespace so a rate key may share its
    // name with a payload entry in the same cache.
    fn state_key(key: &str) -> String {
        format!("rate:{key}")
    }
}

fn unix_millis() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_millis() as u64
}
