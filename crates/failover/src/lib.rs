//! Failover primitives for multi-candidate resources
//!
//! One retry loop serves every candidate shape in the workspace: a
//! health-tracked session pool and a static ordered model list both
//! implement [`CandidateSource`], and [`with_failover`] drives selection,
//! invocation, outcome classification, and feedback until a candidate
//! succeeds or the source is exhausted.
//!
//! The loop never runs two attempts concurrently and never hands the same
//! candidate to the operation twice within one invocation.

pub mod invoke;
pub mod rotation;

pub use invoke::{FailoverError, with_failover};
pub use rotation::ModelRotation;

use async_trait::async_trait;

/// How a failed attempt should steer the failover loop.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorClass {
    /// The candidate itself was rejected (expired session, revoked token,
    /// decommissioned model). Report the failure and move to the next one.
    ResourceInvalid,
    /// Upstream trouble that says nothing about the candidate (rate limit,
    /// 5xx, timeout). Move on without a health penalty.
    Transient,
    /// Unrelated to candidate choice (malformed request, local bug).
    /// Propagated immediately; retrying other candidates would mask it.
    Fatal,
}

/// A supplier of candidates for [`with_failover`].
///
/// Implementations decide what "next" means: a pool skips entries in
/// backoff and advances a round-robin cursor, a static list walks in
/// order. `None` from [`next`](CandidateSource::next) signals that nothing
/// is currently usable, which the loop treats as exhaustion, not an error.
#[async_trait]
pub trait CandidateSource: Send + Sync {
    /// The resource handed to each attempt.
    type Candidate: Send;

    /// Number of candidates currently known to the source. Bounds the
    /// attempt count in [`with_failover`].
    async fn count(&self) -> usize;

    /// Produce the next candidate to try, or `None` when nothing is
    /// currently usable.
    async fn next(&self) -> Option<Self::Candidate>;

    /// Stable identifier for a candidate. Used for the within-invocation
    /// tried set and for feedback; sources with secret candidates must
    /// still return the value they recognize in `report_*`.
    fn key<'a>(&self, candidate: &'a Self::Candidate) -> &'a str;

    /// Feedback after a successful attempt. Health-tracking sources reset
    /// failure state; static sources ignore it.
    async fn report_success(&self, _key: &str) {}

    /// Feedback after an attempt whose failure was classified
    /// [`ErrorClass::ResourceInvalid`].
    async fn report_failure(&self, _key: &str) {}
}
