//! Channel discovery
//!
//! Trending topics feed a model prompt that yields search tags; searching
//! the tags surfaces candidate channels. A seen marker per channel makes
//! discovery emit each channel once per marker lifetime.

use std::time::Duration;

use anyhow::Context;
use eitaa_client::Message;
use serde_json::Value;
use tracing::{debug, info, warn};

use crate::crawl::{Crawler, with_sessions};
use crate::prompts;

const TRENDS_CACHE_KEY: &str = "eitaa:trends";
const TRENDS_TTL: Duration = Duration::from_secs(3600);
const HASHTAGS_CACHE_KEY: &str = "eitaa:hashtags";
const HASHTAGS_TTL: Duration = Duration::from_secs(7200);

const TRENDS_RATE_KEY: &str = "eitaa:trends";
const SEARCH_RATE_KEY: &str = "eitaa:search";

/// Messages requested per tag search.
const SEARCH_LIMIT: u32 = 50;

fn seen_key(channel: &str) -> String {
    format!("eitaa:channel:seen:{channel}")
}

/// Channels not sighted before, in tag-search order.
pub async fn discover_channels(crawler: &Crawler) -> anyhow::Result<Vec<String>> {
    let Some(trends) = fetch_trends(crawler).await? else {
        warn!("trends unavailable, skipping discovery");
        return Ok(Vec::new());
    };
    let tags = derive_tags(crawler, &trends).await?;

    let mut channels = Vec::new();
    for tag in &tags {
        let Some(found) = search_tag(crawler, tag).await? else {
            continue;
        };
        for message in found {
            let Some(channel) = message.channel.filter(|c| !c.is_empty()) else {
                continue;
            };
            let first_sighting = crawler
                .cache
                .set_if_absent(seen_key(&channel), "1", crawler.config.channel_seen_ttl)
                .await;
            if first_sighting {
                channels.push(channel);
            }
        }
    }
    info!(tags = tags.len(), channels = channels.len(), "discovery finished");
    Ok(channels)
}

async fn fetch_trends(crawler: &Crawler) -> anyhow::Result<Option<Value>> {
    if let Some(cached) = crawler.cache.get(TRENDS_CACHE_KEY).await {
        debug!("trends served from cache");
        return Ok(Some(
            serde_json::from_str(&cached).context("decoding cached trends")?,
        ));
    }
    crawler
        .limiter
        .wait(TRENDS_RATE_KEY, crawler.config.request_interval)
        .await;
    let Some(trends) = with_sessions(crawler, |client| async move { client.trends().await }).await?
    else {
        return Ok(None);
    };
    crawler
        .cache
        .set(TRENDS_CACHE_KEY, trends.to_string(), Some(TRENDS_TTL))
        .await;
    Ok(Some(trends))
}

/// Search tags for the current trends, cached for two hours. The model is
/// asked for a JSON array; stray plain-text answers are split on newlines
/// and commas instead.
async fn derive_tags(crawler: &Crawler, trends: &Value) -> anyhow::Result<Vec<String>> {
    if let Some(cached) = crawler.cache.get(HASHTAGS_CACHE_KEY).await {
        debug!("hashtags served from cache");
        return Ok(serde_json::from_str(&cached).context("decoding cached hashtags")?);
    }
    let answer = crawler
        .groq
        .chat(&prompts::hashtags(&trends.to_string()))
        .await
        .context("deriving search hashtags")?;
    let tags = normalize_tags(&answer);
    if tags.is_empty() {
        warn!(answer = %answer, "no usable tags in the model answer");
        return Ok(tags);
    }
    crawler
        .cache
        .set(
            HASHTAGS_CACHE_KEY,
            serde_json::to_string(&tags)?,
            Some(HASHTAGS_TTL),
        )
        .await;
    debug!(tags = tags.len(), "search tags derived");
    Ok(tags)
}

async fn search_tag(crawler: &Crawler, tag: &str) -> anyhow::Result<Option<Vec<Message>>> {
    crawler
        .limiter
        .wait(SEARCH_RATE_KEY, crawler.config.request_interval)
        .await;
    let query = tag.to_owned();
    with_sessions(crawler, move |client| {
        let query = query.clone();
        async move { client.search_messages(&query, SEARCH_LIMIT).await }
    })
    .await
    .with_context(|| format!("searching messages for tag {tag}"))
}

pub(crate) fn normalize_tags(answer: &str) -> Vec<String> {
    let cleaned = prompts::strip_code_fences(answer);
    let raw: Vec<String> = serde_json::from_str(cleaned)
        .unwrap_or_else(|_| cleaned.split(['\n', ',']).map(str::to_owned).collect());
    raw.into_iter()
        .map(|tag| tag.trim().to_owned())
        .filter(|tag| !tag.is_empty())
        .collect()
}
