//! Request plumbing for the Bot API

use std::time::Duration;

use serde_json::Value;
use tracing::debug;

use crate::error::{Error, Result};
use crate::types::{Message, messages_from};

const BASE_URL: &str = "https://eitaayar.ir/api";

/// Per-request timeout. Together with the pool size this bounds the
/// worst-case duration of one failover invocation.
pub const REQUEST_TIMEOUT: Duration = Duration::from_secs(10);

/// Client bound to one session token.
pub struct EitaaClient {
    http: reqwest::Client,
    token: String,
    base_url: String,
}

impl EitaaClient {
    pub fn new(token: impl Into<String>) -> Self {
        Self {
            http: reqwest::Client::new(),
            token: token.into(),
            base_url: BASE_URL.to_owned(),
        }
    }

    /// Point the client at a different API root (tests, mirrors).
    pub fn with_base_url(mut self, url: &str) -> Self {
        self.base_url = url.trim_end_matches('/').to_owned();
        self
    }

    /// Currently trending topics, kept as raw JSON for downstream
    /// prompting.
    pub async fn trends(&self) -> Result<Value> {
        let url = format!("{}/trends", self.base_url);
        let response = self
            .http
            .get(&url)
            .bearer_auth(&self.token)
            .timeout(REQUEST_TIMEOUT)
            .send()
            .await?;
        Self::json_body(response).await
    }

    /// Search messages across channels.
    pub async fn search_messages(&self, query: &str, limit: u32) -> Result<Vec<Message>> {
        debug!(query, limit, "searching messages");
        let url = format!("{}/search", self.base_url);
        let response = self
            .http
            .get(&url)
            .bearer_auth(&self.token)
            .timeout(REQUEST_TIMEOUT)
            .query(&[("q", query), ("limit", &limit.to_string())])
            .send()
            .await?;
        let values: Vec<Value> = Self::json_body(response).await?;
        Ok(messages_from(values))
    }

    /// Recent messages from one channel.
    pub async fn channel_messages(&self, username: &str, limit: u32) -> Result<Vec<Message>> {
        debug!(channel = username, limit, "fetching channel messages");
        let url = format!("{}/channel/{username}/messages", self.base_url);
        let response = self
            .http
            .get(&url)
            .bearer_auth(&self.token)
            .timeout(REQUEST_TIMEOUT)
            .query(&[("limit", limit)])
            .send()
            .await?;
        let values: Vec<Value> = Self::json_body(response).await?;
        Ok(messages_from(values))
    }

    async fn json_body<T: serde::de::DeserializeOwned>(response: reqwest::Response) -> Result<T> {
        let status = response.status();
        if !status.is_success() {
            let message = response.text().await.unwrap_or_default();
            return Err(Error::Api {
                status: status.as_u16(),
                message,
            });
        }
        Ok(response.json().await?)
    }
}
