//! Error type, model-availability detection, and failover classification

use failover::ErrorClass;
use thiserror::Error;

/// Errors from chat completion calls.
#[derive(Debug, Error)]
pub enum Error {
    /// Non-2xx response from the API.
    #[error("api error ({status}): {message}")]
    Api { status: u16, message: String },

    /// Transport-level failure (connect, timeout, decode).
    #[error("http error: {0}")]
    Http(#[from] reqwest::Error),

    /// The API answered 2xx but the payload carried no usable choice.
    #[error("empty completion response")]
    EmptyResponse,

    /// Every candidate model was tried. The rotation order is in the
    /// message for the operator; the last per-model error is the source.
    #[error("all models failed (tried: [{}])", tried.join(", "))]
    ModelsExhausted {
        tried: Vec<String>,
        #[source]
        last: Option<Box<Error>>,
    },
}

/// Result alias for chat completion calls.
pub type Result<T> = std::result::Result<T, Error>;

/// Body fragments that mark the model as gone rather than the request as
/// wrong. Groq reports retired or unknown models with 400/404 and one of
/// these in the message.
const MODEL_UNAVAILABLE_PATTERNS: &[&str] = &["decommissioned", "model_not_found", "does not exist"];

/// Map a chat failure onto the failover taxonomy.
///
/// A 400/404 naming a retired or unknown model burns the candidate and
/// rotation continues. Any other client error is a request bug and fails
/// the invocation outright; silently rotating past it would hide the bug
/// behind whichever model happens to answer.
pub fn classify(err: &Error) -> ErrorClass {
    match err {
        Error::Api {
            status: 400 | 404,
            message,
        } => {
            let lower = message.to_lowercase();
            if MODEL_UNAVAILABLE_PATTERNS.iter().any(|p| lower.contains(p)) {
                ErrorClass::ResourceInvalid
            } else {
                ErrorClass::Fatal
            }
        }
        Error::Api {
            status: 408 | 429 | 500 | 502 | 503 | 504,
            ..
        } => ErrorClass::Transient,
        Error::Api { .. } => ErrorClass::Fatal,
        Error::Http(e) if e.is_timeout() || e.is_connect() => ErrorClass::Transient,
        _ => ErrorClass::Fatal,
    }
}
