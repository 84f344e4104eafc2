//! Shared fixtures for the crawler tests.

use std::sync::Arc;
use std::time::Duration;

use common::Secret;
use groq_client::GroqClient;
use session_pool::SessionPool;
use tempfile::TempDir;

use crate::config::Config;
use crate::crawl::Crawler;

pub(crate) fn test_config(fallback_token: &str) -> Config {
    Config {
        eitaa_token: Secret::from(fallback_token),
        groq_api_key: Secret::from("gk-test"),
        sessions_dir: "unused".into(),
        groq_model: "test-model".into(),
        request_interval: Duration::ZERO,
        message_seen_ttl: Duration::from_secs(86_400),
        channel_seen_ttl: None,
    }
}

/// A crawler whose session pool holds `sessions` (id, token pairs) and
/// whose platform and model clients both point at the mock server.
pub(crate) async fn test_crawler(
    sessions: &[(&str, &str)],
    server_url: &str,
    fallback_token: &str,
) -> (TempDir, Crawler) {
    let dir = TempDir::new().unwrap();
    for (id, token) in sessions {
        let contents = format!(r#"{{"auth_key": "{token}", "session_id": "{id}"}}"#);
        std::fs::write(dir.path().join(format!("{id}.json")), contents).unwrap();
    }
    let pool = SessionPool::load(dir.path()).await.unwrap();

    let mut crawler = Crawler::new(test_config(fallback_token), Arc::new(pool));
    crawler.groq = GroqClient::new(Secret::from("gk-test"), "test-model").with_base_url(server_url);
    crawler.platform_base_url = Some(server_url.to_owned());
    (dir, crawler)
}

/// Chat completion body carrying the given assistant `content`.
pub(crate) fn completion(content: &str) -> String {
    serde_json::json!({
        "choices": [{"message": {"role": "assistant", "content": content}}]
    })
    .to_string()
}
