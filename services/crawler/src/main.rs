//! Eitaa shop-channel crawler
//!
//! Discovers candidate channels from the platform's trending topics,
//! fetches their unseen messages through a pool of session tokens, asks a
//! language model which channels are shops, and prints the extracted
//! products to stdout as JSON.

mod classify;
mod config;
mod crawl;
mod discovery;
mod extract;
mod messages;
mod prompts;
#[cfg(test)]
mod testutil;

use std::sync::Arc;

use anyhow::{Context, Result};
use tracing::info;
use tracing_subscriber::EnvFilter;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use session_pool::SessionPool;

use crate::config::Config;
use crate::crawl::Crawler;

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();

    // JSON logs on stderr with LOG_LEVEL / RUST_LOG support; stdout
    // carries only the product report.
    tracing_subscriber::registry()
        .with(
            EnvFilter::try_from_env("LOG_LEVEL")
                .or_else(|_| EnvFilter::try_from_default_env())
                .unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with(tracing_subscriber::fmt::layer().json().with_writer(std::io::stderr))
        .init();

    info!("starting eitaa-crawler");

    let config = Config::from_env().context("loading configuration")?;

    let pool = SessionPool::load(&config.sessions_dir)
        .await
        .with_context(|| format!("loading sessions from {}", config.sessions_dir.display()))?;
    let status = pool.status().await;
    info!(sessions = status.total, healthy = status.healthy, "session pool ready");

    let crawler = Crawler::new(config, Arc::new(pool));
    let products = crawl::run(&crawler).await?;

    info!(products = products.len(), "crawl finished");
    println!("{}", serde_json::to_string_pretty(&products)?);
    Ok(())
}
