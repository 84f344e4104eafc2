//! Generic retry-with-failover loop
//!
//! The loop is intentionally stateless: pool health lives in the source,
//! the tried set lives on the stack of one invocation, and the operation
//! is run at most once per candidate. Exhaustion is an expected outcome
//! for pool-backed callers (every session may legitimately be in backoff)
//! and is reported with the tried-candidate list for observability.

use std::future::Future;

use tracing::{debug, warn};

use crate::{CandidateSource, ErrorClass};

/// Why a failover invocation produced no result.
#[derive(Debug, thiserror::Error)]
pub enum FailoverError<E>
where
    E: std::error::Error + 'static,
{
    /// The operation failed in a way unrelated to candidate choice.
    #[error(transparent)]
    Fatal(E),
    /// Every candidate was tried and rejected, or the source had none to
    /// offer. `last_error` is `None` only when no attempt ran at all.
    #[error("candidates exhausted (tried: [{}])", tried.join(", "))]
    Exhausted {
        tried: Vec<String>,
        #[source]
        last_error: Option<E>,
    },
}

/// Run `op` against candidates from `source` until one succeeds.
///
/// At most `max(source.count(), 1)` attempts are made. Each attempt's
/// failure is classified:
/// - [`ErrorClass::ResourceInvalid`] burns the candidate via
///   `report_failure` and moves on,
/// - [`ErrorClass::Transient`] moves on without touching health,
/// - [`ErrorClass::Fatal`] stops the loop and surfaces the error as-is.
///
/// The first success is reported back via `report_success` and returned
/// immediately. A candidate already tried in this invocation ends the
/// loop: the source has wrapped around and nothing new is left.
pub async fn with_failover<S, C, T, E, F, Fut>(
    source: &S,
    classify: C,
    mut op: F,
) -> Result<T, FailoverError<E>>
where
    S: CandidateSource + ?Sized,
    C: Fn(&E) -> ErrorClass,
    E: std::error::Error + 'static,
    F: FnMut(S::Candidate) -> Fut,
    Fut: Future<Output = Result<T, E>>,
{
    let attempts = source.count().await.max(1);
    let mut tried: Vec<String> = Vec::new();
    let mut last_error: Option<E> = None;

    for _ in 0..attempts {
        let Some(candidate) = source.next().await else {
            break;
        };
        let key = source.key(&candidate).to_owned();
        if tried.iter().any(|t| t == &key) {
            break;
        }
        tried.push(key.clone());

        match op(candidate).await {
            Ok(value) => {
                source.report_success(&key).await;
                return Ok(value);
            }
            Err(err) => match classify(&err) {
                ErrorClass::ResourceInvalid => {
                    warn!(attempt = tried.len(), error = %err, "candidate rejected, failing over");
                    source.report_failure(&key).await;
                    last_error = Some(err);
                }
                ErrorClass::Transient => {
                    debug!(attempt = tried.len(), error = %err, "transient failure, trying next candidate");
                    last_error = Some(err);
                }
                ErrorClass::Fatal => return Err(FailoverError::Fatal(err)),
            },
        }
    }

    Err(FailoverError::Exhausted { tried, last_error })
}
