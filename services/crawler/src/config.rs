//! Environment-driven configuration
//!
//! Every knob comes from the process environment (optionally seeded from a
//! .env file before load). Secrets are wrapped in `common::Secret` so a
//! stray `{:?}` cannot leak them into logs.

use std::path::PathBuf;
use std::time::Duration;

use common::Secret;

/// Settings for one crawl run.
#[derive(Debug)]
pub struct Config {
    /// Fallback platform token, used once per step when the session pool
    /// is exhausted.
    pub eitaa_token: Secret<String>,
    pub groq_api_key: Secret<String>,
    /// Directory of session descriptor files.
    pub sessions_dir: PathBuf,
    /// Primary chat model; the fixed fallback rotation follows it.
    pub groq_model: String,
    /// Minimum spacing between platform calls sharing a rate key.
    pub request_interval: Duration,
    /// How long a message-seen marker suppresses reprocessing.
    pub message_seen_ttl: Duration,
    /// Optional expiry for channel-seen markers. `None` keeps a channel
    /// claimed for the process lifetime.
    pub channel_seen_ttl: Option<Duration>,
}

impl Config {
    /// Read the configuration from the environment. Missing or blank
    /// required variables produce a Config error naming the variable.
    pub fn from_env() -> common::Result<Self> {
        Ok(Self {
            eitaa_token: required("EITAAYAR_TOKEN")?,
            groq_api_key: required("GROQ_API_KEY")?,
            sessions_dir: std::env::var("SESSIONS_DIR")
                .map(PathBuf::from)
                .unwrap_or_else(|_| PathBuf::from("sessions")),
            groq_model: std::env::var("GROQ_MODEL")
                .unwrap_or_else(|_| groq_client::DEFAULT_MODEL.to_owned()),
            request_interval: Duration::from_secs(seconds("EITAA_REQUEST_INTERVAL_SECS", 2)?),
            message_seen_ttl: Duration::from_secs(seconds("MESSAGE_SEEN_TTL_SECS", 86_400)?),
            channel_seen_ttl: optional_seconds("CHANNEL_SEEN_TTL_SECS")?.map(Duration::from_secs),
        })
    }
}

fn required(name: &str) -> common::Result<Secret<String>> {
    match std::env::var(name) {
        Ok(value) if !value.trim().is_empty() => Ok(Secret::new(value)),
        _ => Err(common::Error::Config(format!(
            "required environment variable {name} is not set"
        ))),
    }
}

fn seconds(name: &str, default: u64) -> common::Result<u64> {
    match std::env::var(name) {
        Ok(raw) => raw.parse().map_err(|_| {
            common::Error::Config(format!(
                "{name} must be a whole number of seconds, got: {raw}"
            ))
        }),
        Err(_) => Ok(default),
    }
}

fn optional_seconds(name: &str) -> common::Result<Option<u64>> {
    match std::env::var(name) {
        Ok(raw) => raw.parse().map(Some).map_err(|_| {
            common::Error::Config(format!(
                "{name} must be a whole number of seconds, got: {raw}"
            ))
        }),
        Err(_) => Ok(None),
    }
}
