//! Crawl orchestration and shared state
//!
//! Every platform call goes through [`with_sessions`]: the pool-backed
//! failover loop, then a single attempt with the configured fallback token
//! once the pool is exhausted. Exhaustion empties the step; only fatal
//! platform errors and model errors abort a run.

use std::future::Future;
use std::sync::Arc;

use anyhow::Context;
use crawl_cache::{MemoryCache, RateLimiter};
use eitaa_client::EitaaClient;
use failover::{ErrorClass, FailoverError, with_failover};
use groq_client::GroqClient;
use session_pool::{Session, SessionPool};
use tracing::{debug, info, warn};

use crate::config::Config;
use crate::extract::{self, Product};
use crate::{classify, discovery, messages};

/// Shared state for crawl runs, wired once in `main`.
pub struct Crawler {
    pub pool: Arc<SessionPool>,
    pub cache: Arc<MemoryCache>,
    pub limiter: RateLimiter,
    pub groq: GroqClient,
    pub config: Config,
    /// Test override for the platform API root.
    pub platform_base_url: Option<String>,
}

impl Crawler {
    pub fn new(config: Config, pool: Arc<SessionPool>) -> Self {
        let cache = Arc::new(MemoryCache::new());
        let limiter = RateLimiter::new(cache.clone());
        let groq = GroqClient::new(config.groq_api_key.clone(), config.groq_model.clone());
        Self {
            pool,
            cache,
            limiter,
            groq,
            config,
            platform_base_url: None,
        }
    }

    fn platform_client(&self, token: &str) -> EitaaClient {
        let client = EitaaClient::new(token);
        match &self.platform_base_url {
            Some(url) => client.with_base_url(url),
            None => client,
        }
    }
}

/// Run `op` against pool sessions until one succeeds, falling back to the
/// configured token when the pool is exhausted. `None` means the step
/// produced nothing usable; only fatal errors surface as `Err`.
///
/// The fallback is skipped when the pool already tried the same token,
/// and its failure never burns pool health.
pub async fn with_sessions<T, F, Fut>(crawler: &Crawler, mut op: F) -> anyhow::Result<Option<T>>
where
    F: FnMut(EitaaClient) -> Fut,
    Fut: Future<Output = eitaa_client::Result<T>>,
{
    let outcome = with_failover(
        crawler.pool.as_ref(),
        eitaa_client::classify,
        |session: Session| op(crawler.platform_client(&session.token)),
    )
    .await;

    match outcome {
        Ok(value) => Ok(Some(value)),
        Err(FailoverError::Fatal(error)) => Err(error.into()),
        Err(FailoverError::Exhausted { tried, last_error }) => {
            let fallback = crawler.config.eitaa_token.expose();
            if tried.iter().any(|token| token == fallback) {
                warn!(
                    attempts = tried.len(),
                    error = ?last_error,
                    "pool exhausted and the fallback token was already tried"
                );
                return Ok(None);
            }
            warn!(attempts = tried.len(), "pool exhausted, trying the fallback token");
            match op(crawler.platform_client(fallback)).await {
                Ok(value) => Ok(Some(value)),
                Err(error) if matches!(eitaa_client::classify(&error), ErrorClass::Fatal) => {
                    Err(error.into())
                }
                Err(error) => {
                    warn!(error = %error, "fallback token failed, step yields nothing");
                    Ok(None)
                }
            }
        }
    }
}

/// One full crawl pass: discover channels, fetch their unseen messages,
/// classify each channel, extract products from the shops.
pub async fn run(crawler: &Crawler) -> anyhow::Result<Vec<Product>> {
    let channels = discovery::discover_channels(crawler).await?;
    if channels.is_empty() {
        info!("no new channels to crawl");
        return Ok(Vec::new());
    }

    let mut products = Vec::new();
    for channel in channels {
        let texts = messages::fetch_new(crawler, &channel).await?;
        if texts.is_empty() {
            debug!(channel = %channel, "no new messages, skipping");
            continue;
        }
        let is_shop = classify::is_shop_channel(&crawler.groq, &channel, &texts)
            .await
            .with_context(|| format!("classifying channel {channel}"))?;
        if !is_shop {
            debug!(channel = %channel, "not a shop channel");
            continue;
        }
        let found = extract::products_from(&texts);
        info!(channel = %channel, products = found.len(), "shop channel crawled");
        products.extend(found);
    }
    Ok(products)
}
