//! Pool state and round-robin session selection
//!
//! Each session carries a consecutive-failure count and the time of its
//! most recent failure. A session is healthy when it has never failed
//! since its last success, or when its backoff window has elapsed.
//! Selection scans at most one full rotation from the cursor, so an
//! all-unhealthy pool answers `None` instead of spinning.

use std::path::Path;
use std::time::Duration;

use async_trait::async_trait;
use failover::CandidateSource;
use tokio::sync::Mutex;
use tokio::time::Instant;
use tracing::{debug, info, warn};

use crate::descriptor::SessionDescriptor;

/// Exclusion window after `fail_count` consecutive failures: one minute,
/// doubled per additional failure, capped at one hour. `backoff(0)` is
/// zero.
pub fn backoff(fail_count: u32) -> Duration {
    if fail_count == 0 {
        return Duration::ZERO;
    }
    let exp = (fail_count - 1).min(6);
    Duration::from_secs((60u64 << exp).min(3600))
}

/// A selected session, ready to authenticate one request.
#[derive(Debug, Clone)]
pub struct Session {
    pub id: String,
    pub token: String,
}

/// Health counts for startup logging and tests.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PoolStatus {
    pub total: usize,
    pub healthy: usize,
    pub backing_off: usize,
}

struct SessionEntry {
    token: String,
    id: String,
    fail_count: u32,
    last_failed: Option<Instant>,
}

impl SessionEntry {
    fn is_healthy(&self, now: Instant) -> bool {
        match (self.fail_count, self.last_failed) {
            (0, _) => true,
            (n, Some(failed_at)) => now.duration_since(failed_at) >= backoff(n),
            // fail_count > 0 without a timestamp cannot arise; treat as healthy.
            (_, None) => true,
        }
    }
}

struct PoolInner {
    entries: Vec<SessionEntry>,
    cursor: usize,
}

/// Shared session pool. All operations take one lock, so selection and
/// health reporting are individually atomic under concurrent use.
pub struct SessionPool {
    inner: Mutex<PoolInner>,
}

impl SessionPool {
    /// Populate the pool from `dir`, reading `*.json` descriptors in
    /// filename order. Unreadable or malformed files, descriptors marked
    /// `valid: false`, and descriptors without a token are skipped with a
    /// log line. A missing directory yields an empty pool; an unreadable
    /// one is an error.
    pub async fn load(dir: impl AsRef<Path>) -> common::Result<Self> {
        let dir = dir.as_ref();
        match tokio::fs::metadata(dir).await {
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                info!(path = %dir.display(), "sessions directory missing, starting with an empty pool");
                return Ok(Self::from_entries(Vec::new()));
            }
            Err(e) => return Err(e.into()),
            Ok(_) => {}
        }

        let mut paths = Vec::new();
        let mut dir_entries = tokio::fs::read_dir(dir).await?;
        while let Some(entry) = dir_entries.next_entry().await? {
            let path = entry.path();
            if path.extension().and_then(|e| e.to_str()) == Some("json") {
                paths.push(path);
            }
        }
        paths.sort();

        let mut entries: Vec<SessionEntry> = Vec::new();
        for path in paths {
            let contents = match tokio::fs::read_to_string(&path).await {
                Ok(c) => c,
                Err(e) => {
                    warn!(path = %path.display(), error = %e, "unreadable session file, skipping");
                    continue;
                }
            };
            let descriptor: SessionDescriptor = match serde_json::from_str(&contents) {
                Ok(d) => d,
                Err(e) => {
                    warn!(path = %path.display(), error = %e, "malformed session descriptor, skipping");
                    continue;
                }
            };
            if !descriptor.valid {
                debug!(path = %path.display(), "descriptor marked invalid, skipping");
                continue;
            }
            let Some(token) = descriptor.auth_key.filter(|t| !t.is_empty()) else {
                debug!(path = %path.display(), "descriptor has no auth key, skipping");
                continue;
            };
            let id = descriptor.session_id.unwrap_or_else(|| {
                path.file_stem()
                    .and_then(|s| s.to_str())
                    .unwrap_or("session")
                    .to_owned()
            });
            if entries.iter().any(|s| s.token == token) {
                warn!(session = %id, "duplicate session token, keeping the first");
                continue;
            }
            entries.push(SessionEntry {
                token,
                id,
                fail_count: 0,
                last_failed: None,
            });
        }

        info!(sessions = entries.len(), "session pool loaded");
        Ok(Self::from_entries(entries))
    }

    fn from_entries(entries: Vec<SessionEntry>) -> Self {
        Self {
            inner: Mutex::new(PoolInner { entries, cursor: 0 }),
        }
    }

    /// Round-robin selection starting at the cursor, skipping sessions
    /// inside their backoff window. Advances the cursor past the returned
    /// entry. `None` when the pool is empty or everything is backing off.
    pub async fn select(&self) -> Option<Session> {
        let mut inner = self.inner.lock().await;
        let n = inner.entries.len();
        if n == 0 {
            return None;
        }
        let now = Instant::now();
        for offset in 0..n {
            let idx = (inner.cursor + offset) % n;
            if !inner.entries[idx].is_healthy(now) {
                continue;
            }
            inner.cursor = (idx + 1) % n;
            let entry = &inner.entries[idx];
            return Some(Session {
                id: entry.id.clone(),
                token: entry.token.clone(),
            });
        }
        debug!("no healthy session available");
        None
    }

    /// Reset the matching session to healthy. Unknown tokens are ignored.
    pub async fn report_success(&self, token: &str) {
        let mut inner = self.inner.lock().await;
        if let Some(entry) = inner.entries.iter_mut().find(|e| e.token == token) {
            if entry.fail_count > 0 {
                debug!(session = %entry.id, "session recovered");
            }
            entry.fail_count = 0;
            entry.last_failed = None;
        }
    }

    /// Record a failure for the matching session, extending its backoff
    /// window. Unknown tokens are ignored.
    pub async fn report_failure(&self, token: &str) {
        let mut inner = self.inner.lock().await;
        match inner.entries.iter_mut().find(|e| e.token == token) {
            Some(entry) => {
                entry.fail_count += 1;
                entry.last_failed = Some(Instant::now());
                warn!(
                    session = %entry.id,
                    fail_count = entry.fail_count,
                    backoff_secs = backoff(entry.fail_count).as_secs(),
                    "session failed, backing off"
                );
            }
            None => debug!("failure reported for a token not in the pool"),
        }
    }

    /// Health counts at this instant.
    pub async fn status(&self) -> PoolStatus {
        let inner = self.inner.lock().await;
        let now = Instant::now();
        let total = inner.entries.len();
        let healthy = inner.entries.iter().filter(|e| e.is_healthy(now)).count();
        PoolStatus {
            total,
            healthy,
            backing_off: total - healthy,
        }
    }
}

#[async_trait]
impl CandidateSource for SessionPool {
    type Candidate = Session;

    async fn count(&self) -> usize {
        self.inner.lock().await.entries.len()
    }

    async fn next(&self) -> Option<Session> {
        SessionPool::select(self).await
    }

    fn key<'a>(&self, candidate: &'a Session) -> &'a str {
        &candidate.token
    }

    async fn report_success(&self, key: &str) {
        SessionPool::report_success(self, key).await;
    }

    async fn report_failure(&self, key: &str) {
        SessionPool::report_failure(self, key).await;
    }
}

#[cfg(test)]
mod tests {
    use failover::{ErrorClass, FailoverError, with_failover};

    use super::*;

    #[derive(Debug, thiserror::Error)]
    enum CallError {
        #[error("session rejected")]
        Rejected,
        #[error("request bug")]
        Bug,
    }

    fn classify(err: &CallError) -> ErrorClass {
        match err {
            CallError::Rejected => ErrorClass::ResourceInvalid,
            CallError::Bug => ErrorClass::Fatal,
        }
    }

    /// Write descriptor files and load a pool from them. The TempDir is
    /// returned so it outlives the test body.
    async fn pool_from(files: &[(&str, &str)]) -> (tempfile::TempDir, SessionPool) {
        let dir = tempfile::tempdir().unwrap();
        for (name, contents) in files {
            std::fs::write(dir.path().join(name), contents).unwrap();
        }
        let pool = SessionPool::load(dir.path()).await.unwrap();
        (dir, pool)
    }

    fn descriptor(token: &str) -> String {
        format!(r#"{{"auth_key": "{token}"}}"#)
    }

    #[test]
    fn backoff_starts_at_one_minute_and_doubles() {
        assert_eq!(backoff(0), Duration::ZERO);
        assert_eq!(backoff(1), Duration::from_secs(60));
        assert_eq!(backoff(2), Duration::from_secs(120));
        assert_eq!(backoff(6), Duration::from_secs(1920));
    }

    #[test]
    fn backoff_is_monotonic_and_capped() {
        let mut previous = Duration::ZERO;
        for fail_count in 0..=20 {
            let window = backoff(fail_count);
            assert!(window >= previous, "backoff decreased at {fail_count}");
            assert!(window <= Duration::from_secs(3600));
            previous = window;
        }
        assert_eq!(backoff(7), Duration::from_secs(3600));
        assert_eq!(backoff(20), Duration::from_secs(3600));
    }

    #[tokio::test]
    async fn load_reads_descriptors_in_filename_order() {
        let (_dir, pool) = pool_from(&[
            ("b.json", &descriptor("token-b")),
            ("a.json", &descriptor("token-a")),
        ])
        .await;

        assert_eq!(pool.select().await.unwrap().token, "token-a");
        assert_eq!(pool.select().await.unwrap().token, "token-b");
    }

    #[tokio::test]
    async fn load_skips_invalid_and_malformed_descriptors() {
        let (_dir, pool) = pool_from(&[
            ("a.json", r#"{"auth_key": "t1", "valid": false}"#),
            ("b.json", "not json at all"),
            ("c.json", r#"{"session_id": "no-token"}"#),
            ("d.json", r#"{"auth_key": ""}"#),
            ("e.json", &descriptor("t2")),
            ("notes.txt", "ignored entirely"),
        ])
        .await;

        let status = pool.status().await;
        assert_eq!(status.total, 1);
        assert_eq!(pool.select().await.unwrap().token, "t2");
    }

    #[tokio::test]
    async fn load_missing_directory_yields_empty_pool() {
        let dir = tempfile::tempdir().unwrap();
        let pool = SessionPool::load(dir.path().join("absent")).await.unwrap();
        assert_eq!(pool.status().await.total, 0);
        assert!(pool.select().await.is_none());
    }

    #[tokio::test]
    async fn load_defaults_id_to_file_stem() {
        let (_dir, pool) = pool_from(&[("alpha.json", &descriptor("t1"))]).await;
        assert_eq!(pool.select().await.unwrap().id, "alpha");
    }

    #[tokio::test]
    async fn load_keeps_first_of_duplicate_tokens() {
        let (_dir, pool) = pool_from(&[
            ("a.json", r#"{"auth_key": "same", "session_id": "first"}"#),
            ("b.json", r#"{"auth_key": "same", "session_id": "second"}"#),
        ])
        .await;

        assert_eq!(pool.status().await.total, 1);
        assert_eq!(pool.select().await.unwrap().id, "first");
    }

    #[tokio::test]
    async fn round_robin_cycles_through_sessions() {
        let (_dir, pool) = pool_from(&[
            ("a.json", &descriptor("ta")),
            ("b.json", &descriptor("tb")),
            ("c.json", &descriptor("tc")),
        ])
        .await;

        let picks: Vec<String> = [
            pool.select().await.unwrap().token,
            pool.select().await.unwrap().token,
            pool.select().await.unwrap().token,
            pool.select().await.unwrap().token,
        ]
        .into();
        assert_eq!(picks, vec!["ta", "tb", "tc", "ta"]);
    }

    #[tokio::test]
    async fn selection_skips_sessions_in_backoff() {
        let (_dir, pool) = pool_from(&[
            ("a.json", &descriptor("ta")),
            ("b.json", &descriptor("tb")),
            ("c.json", &descriptor("tc")),
        ])
        .await;

        pool.report_failure("tb").await;

        for _ in 0..4 {
            let picked = pool.select().await.unwrap();
            assert_ne!(picked.token, "tb");
        }
        let status = pool.status().await;
        assert_eq!(status.healthy, 2);
        assert_eq!(status.backing_off, 1);
    }

    #[tokio::test]
    async fn empty_pool_selects_none() {
        let (_dir, pool) = pool_from(&[]).await;
        assert!(pool.select().await.is_none());
    }

    #[tokio::test]
    async fn fully_backed_off_pool_selects_none() {
        let (_dir, pool) = pool_from(&[
            ("a.json", &descriptor("ta")),
            ("b.json", &descriptor("tb")),
        ])
        .await;

        pool.report_failure("ta").await;
        pool.report_failure("tb").await;

        assert!(pool.select().await.is_none());
    }

    #[tokio::test]
    async fn success_after_failure_restores_eligibility() {
        let (_dir, pool) = pool_from(&[("a.json", &descriptor("ta"))]).await;

        pool.report_failure("ta").await;
        assert!(pool.select().await.is_none());

        pool.report_success("ta").await;
        assert_eq!(pool.select().await.unwrap().token, "ta");
        assert_eq!(pool.status().await.healthy, 1);
    }

    #[tokio::test]
    async fn feedback_for_unknown_token_is_ignored() {
        let (_dir, pool) = pool_from(&[("a.json", &descriptor("ta"))]).await;

        pool.report_failure("stranger").await;
        pool.report_success("stranger").await;

        let status = pool.status().await;
        assert_eq!(status.total, 1);
        assert_eq!(status.healthy, 1);
    }

    #[tokio::test(start_paused = true)]
    async fn backoff_window_expires_with_time() {
        let (_dir, pool) = pool_from(&[("a.json", &descriptor("ta"))]).await;

        pool.report_failure("ta").await;
        assert!(pool.select().await.is_none());

        tokio::time::advance(Duration::from_secs(59)).await;
        assert!(pool.select().await.is_none());

        tokio::time::advance(Duration::from_secs(1)).await;
        assert_eq!(pool.select().await.unwrap().token, "ta");
    }

    #[tokio::test(start_paused = true)]
    async fn repeated_failures_double_the_window() {
        let (_dir, pool) = pool_from(&[("a.json", &descriptor("ta"))]).await;

        pool.report_failure("ta").await;
        pool.report_failure("ta").await;

        tokio::time::advance(Duration::from_secs(119)).await;
        assert!(pool.select().await.is_none());

        tokio::time::advance(Duration::from_secs(1)).await;
        assert!(pool.select().await.is_some());
    }

    #[tokio::test]
    async fn failover_success_after_two_rejections() {
        let (_dir, pool) = pool_from(&[
            ("a.json", &descriptor("ta")),
            ("b.json", &descriptor("tb")),
            ("c.json", &descriptor("tc")),
        ])
        .await;

        let result = with_failover(&pool, classify, |session: Session| async move {
            if session.token == "tc" {
                Ok(session.id)
            } else {
                Err(CallError::Rejected)
            }
        })
        .await;

        assert_eq!(result.unwrap(), "c");
        let status = pool.status().await;
        assert_eq!(status.healthy, 1);
        assert_eq!(status.backing_off, 2);
    }

    #[tokio::test(start_paused = true)]
    async fn failover_exhaustion_penalizes_each_session_once() {
        let (_dir, pool) = pool_from(&[
            ("a.json", &descriptor("ta")),
            ("b.json", &descriptor("tb")),
            ("c.json", &descriptor("tc")),
        ])
        .await;

        let result = with_failover(&pool, classify, |_session: Session| async move {
            Err::<(), _>(CallError::Rejected)
        })
        .await;

        match result.unwrap_err() {
            FailoverError::Exhausted { tried, .. } => {
                assert_eq!(tried, vec!["ta", "tb", "tc"]);
            }
            other => panic!("expected Exhausted, got: {other:?}"),
        }
        assert_eq!(pool.status().await.backing_off, 3);

        // A single failure each means a 60s window; if anything were
        // double-counted the window would be 120s and this would still be
        // empty.
        tokio::time::advance(Duration::from_secs(60)).await;
        assert_eq!(pool.status().await.healthy, 3);
    }

    #[tokio::test]
    async fn failover_fatal_leaves_health_untouched() {
        let (_dir, pool) = pool_from(&[
            ("a.json", &descriptor("ta")),
            ("b.json", &descriptor("tb")),
        ])
        .await;

        let result = with_failover(&pool, classify, |_session: Session| async move {
            Err::<(), _>(CallError::Bug)
        })
        .await;

        assert!(matches!(
            result.unwrap_err(),
            FailoverError::Fatal(CallError::Bug)
        ));
        let status = pool.status().await;
        assert_eq!(status.healthy, 2);
        assert_eq!(status.backing_off, 0);
    }
}
