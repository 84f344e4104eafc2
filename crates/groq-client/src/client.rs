//! Chat completion client with model failover

use std::time::Duration;

use common::Secret;
use failover::{FailoverError, ModelRotation, with_failover};
use tracing::debug;

use crate::error::{Error, Result, classify};
use crate::types::{ChatMessage, ChatRequest, ChatResponse};

const BASE_URL: &str = "https://api.groq.com/openai/v1";

/// Primary model used when nothing is configured.
pub const DEFAULT_MODEL: &str = "llama-3.1-8b-instant";

/// Fallbacks tried in order when the preceding model is unavailable.
const FALLBACK_MODELS: &[&str] = &["llama3-13b-8192", "llama3-7b-4096", "llama3-3b-4096"];

/// Low temperature: every prompt in this system wants a deterministic,
/// parseable answer, not prose variety.
const TEMPERATURE: f64 = 0.2;

/// Completions take longer than plain API reads.
const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

pub struct GroqClient {
    http: reqwest::Client,
    api_key: Secret<String>,
    base_url: String,
    models: Vec<String>,
}

impl GroqClient {
    /// Build a client whose rotation starts at `primary_model` and falls
    /// back through the fixed candidates.
    pub fn new(api_key: Secret<String>, primary_model: impl Into<String>) -> Self {
        let mut models = vec![primary_model.into()];
        models.extend(FALLBACK_MODELS.iter().map(|m| m.to_string()));
        Self {
            http: reqwest::Client::new(),
            api_key,
            base_url: BASE_URL.to_owned(),
            models,
        }
    }

    /// Point the client at a different API root (tests, proxies).
    pub fn with_base_url(mut self, url: &str) -> Self {
        self.base_url = url.trim_end_matches('/').to_owned();
        self
    }

    /// One-shot user prompt. Walks the model rotation until a candidate
    /// answers; the rotation is rebuilt per call, so every invocation
    /// starts from the primary.
    pub async fn chat(&self, prompt: &str) -> Result<String> {
        let rotation = ModelRotation::new(self.models.iter().cloned());
        let result = with_failover(&rotation, classify, |model: String| {
            let request = ChatRequest {
                model,
                messages: vec![ChatMessage::user(prompt)],
                temperature: TEMPERATURE,
            };
            async move { self.complete(request).await }
        })
        .await;

        match result {
            Ok(text) => Ok(text),
            Err(FailoverError::Fatal(err)) => Err(err),
            Err(FailoverError::Exhausted { tried, last_error }) => Err(Error::ModelsExhausted {
                tried,
                last: last_error.map(Box::new),
            }),
        }
    }

    async fn complete(&self, request: ChatRequest) -> Result<String> {
        debug!(model = %request.model, "chat completion request");
        let url = format!("{}/chat/completions", self.base_url);
        let response = self
            .http
            .post(&url)
            .bearer_auth(self.api_key.expose())
            .timeout(REQUEST_TIMEOUT)
            .json(&request)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let message = response.text().await.unwrap_or_default();
            return Err(Error::Api {
                status: status.as_u16(),
                message,
            });
        }

        let completion: ChatResponse = response.json().await?;
        completion
            .choices
            .into_iter()
            .next()
            .map(|choice| choice.message.content)
            .ok_or(Error::EmptyResponse)
    }
}
