//! Error type and failover classification

use failover::ErrorClass;
use thiserror::Error;

/// Errors from Bot API calls.
#[derive(Debug, Error)]
pub enum Error {
    /// Non-2xx response from the API.
    #[error("api error ({status}): {message}")]
    Api { status: u16, message: String },

    /// Transport-level failure (connect, timeout, decode).
    #[error("http error: {0}")]
    Http(#[from] reqwest::Error),
}

/// Result alias for Bot API calls.
pub type Result<T> = std::result::Result<T, Error>;

/// Map a call failure onto the failover taxonomy.
///
/// 401 and 403 mean the session token itself was rejected, which the pool
/// must hear about. Rate limits, server trouble, and network timeouts say
/// nothing about the token, so the loop moves on without a penalty.
/// Anything else indicates a caller-side problem and must surface.
pub fn classify(err: &Error) -> ErrorClass {
    match err {
        Error::Api {
            status: 401 | 403, ..
        } => ErrorClass::ResourceInvalid,
        Error::Api {
            status: 408 | 429 | 500 | 502 | 503 | 504,
            ..
        } => ErrorClass::Transient,
        Error::Api { .. } => ErrorClass::Fatal,
        Error::Http(e) if e.is_timeout() || e.is_connect() => ErrorClass::Transient,
        Error::Http(_) => ErrorClass::Fatal,
    }
}
