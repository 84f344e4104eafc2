//! Channel message fetching
//!
//! Each fetched message is marked seen before its text is handed on, so a
//! message is processed at most once per marker lifetime even when fetches
//! overlap between runs.

use tracing::debug;

use crate::crawl::{Crawler, with_sessions};

/// Messages requested per channel fetch.
const FETCH_LIMIT: u32 = 50;

const RATE_KEY: &str = "eitaa:messages";

fn seen_key(id: i64) -> String {
    format!("eitaa:msg:seen:{id}")
}

/// Texts of the channel's messages that have not been seen before.
/// Blank and id-less messages are dropped.
pub async fn fetch_new(crawler: &Crawler, channel: &str) -> anyhow::Result<Vec<String>> {
    crawler
        .limiter
        .wait(RATE_KEY, crawler.config.request_interval)
        .await;

    let channel_name = channel.to_owned();
    let fetched = with_sessions(crawler, move |client| {
        let channel = channel_name.clone();
        async move { client.channel_messages(&channel, FETCH_LIMIT).await }
    })
    .await?;
    let Some(messages) = fetched else {
        return Ok(Vec::new());
    };

    let mut texts = Vec::new();
    let mut seen = 0usize;
    for message in messages {
        let Some(id) = message.id else {
            continue;
        };
        let fresh = crawler
            .cache
            .set_if_absent(seen_key(id), "1", Some(crawler.config.message_seen_ttl))
            .await;
        if !fresh {
            seen += 1;
            continue;
        }
        if let Some(text) = message.text.filter(|t| !t.trim().is_empty()) {
            texts.push(text);
        }
    }
    debug!(channel, new = texts.len(), seen, "channel messages fetched");
    Ok(texts)
}

#[cfg(test)]
mod tests {
    use mockito::Matcher;

    use crate::testutil::test_crawler;

    use super::*;

    #[tokio::test]
    async fn fetch_drops_messages_without_ids() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("GET", "/channel/shop/messages")
            .match_query(Matcher::UrlEncoded("limit".into(), "50".into()))
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(
                r#"[{"id": 1, "text": "priced at 10,000"},
                    {"text": "no id, no marker"}]"#,
            )
            .create_async()
            .await;
        let (_dir, crawler) = test_crawler(&[("s1", "tok-1")], &server.url(), "fb").await;

        let texts = fetch_new(&crawler, "shop").await.unwrap();

        assert_eq!(texts, vec!["priced at 10,000"]);
    }

    #[tokio::test]
    async fn fetch_filters_messages_already_seen() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("GET", "/channel/shop/messages")
            .match_query(Matcher::Any)
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(r#"[{"id": 1, "text": "a"}, {"id": 2, "text": "b"}]"#)
            .expect(2)
            .create_async()
            .await;
        let (_dir, crawler) = test_crawler(&[("s1", "tok-1")], &server.url(), "fb").await;

        let first = fetch_new(&crawler, "shop").await.unwrap();
        assert_eq!(first, vec!["a", "b"]);

        let second = fetch_new(&crawler, "shop").await.unwrap();
        assert!(second.is_empty(), "seen markers must filter the second pass");
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn fetch_skips_blank_texts_but_marks_them_seen() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("GET", "/channel/shop/messages")
            .match_query(Matcher::Any)
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(r#"[{"id": 1, "text": "   "}, {"id": 2}, {"id": 3, "text": "kept"}]"#)
            .create_async()
            .await;
        let (_dir, crawler) = test_crawler(&[("s1", "tok-1")], &server.url(), "fb").await;

        let texts = fetch_new(&crawler, "shop").await.unwrap();

        assert_eq!(texts, vec!["kept"]);
        assert!(crawler.cache.exists("eitaa:msg:seen:1").await);
        assert!(crawler.cache.exists("eitaa:msg:seen:2").await);
    }

    #[tokio::test]
    async fn exhausted_sessions_yield_no_messages() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("GET", "/channel/shop/messages")
            .match_query(Matcher::Any)
            .with_status(401)
            .with_body("invalid session")
            .expect(2)
            .create_async()
            .await;
        let (_dir, crawler) = test_crawler(&[("s1", "tok-1")], &server.url(), "fb").await;

        let texts = fetch_new(&crawler, "shop").await.unwrap();

        assert!(texts.is_empty());
        assert_eq!(crawler.pool.status().await.backing_off, 1);
        mock.assert_async().await;
    }
}
