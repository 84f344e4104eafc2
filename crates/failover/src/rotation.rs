//! Static ordered candidate rotation
//!
//! The model-selection counterpart of a session pool: a fixed list walked
//! front to back with no health memory. Build a fresh rotation for every
//! invocation so each one starts from the configured primary; the cursor
//! only moves forward.

use std::sync::atomic::{AtomicUsize, Ordering};

use async_trait::async_trait;
use tracing::debug;

use crate::CandidateSource;

/// Fixed, ordered candidate list with no health tracking.
///
/// Duplicates are dropped at construction (first occurrence wins), so a
/// configured primary that repeats one of the fallbacks costs nothing and
/// the loop's no-retry guarantee holds trivially.
pub struct ModelRotation {
    candidates: Vec<String>,
    cursor: AtomicUsize,
}

impl ModelRotation {
    pub fn new<I>(candidates: I) -> Self
    where
        I: IntoIterator,
        I::Item: Into<String>,
    {
        let mut deduped: Vec<String> = Vec::new();
        for candidate in candidates {
            let candidate = candidate.into();
            if !deduped.contains(&candidate) {
                deduped.push(candidate);
            }
        }
        Self {
            candidates: deduped,
            cursor: AtomicUsize::new(0),
        }
    }
}

#[async_trait]
impl CandidateSource for ModelRotation {
    type Candidate = String;

    async fn count(&self) -> usize {
        self.candidates.len()
    }

    async fn next(&self) -> Option<String> {
        let idx = self.cursor.fetch_add(1, Ordering::Relaxed);
        self.candidates.get(idx).cloned()
    }

    fn key<'a>(&self, candidate: &'a String) -> &'a str {
        candidate
    }

    async fn report_failure(&self, key: &str) {
        debug!(model = key, "candidate model unavailable");
    }
}
