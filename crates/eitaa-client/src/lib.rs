//! HTTP client for the eitaayar.ir Bot API
//!
//! Thin wrapper around the three read endpoints the crawler uses (trends,
//! message search, channel messages) plus the error classification that
//! plugs platform calls into the failover loop. A client is bound to one
//! session token; the pool decides which token that is, so callers build
//! a fresh client per selected session.

pub mod client;
pub mod error;
pub mod types;

pub use client::{EitaaClient, REQUEST_TIMEOUT};
pub use error::{Error, Result, classify};
pub use types::Message;
