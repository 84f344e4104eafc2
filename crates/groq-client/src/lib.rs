//! Groq chat-completions client
//!
//! OpenAI-compatible chat endpoint with model failover: the configured
//! primary model is tried first, then a fixed list of fallbacks, driven
//! by the same failover loop as the session pool. Model availability is
//! server-side state that can change between runs (models get retired),
//! so no health is remembered between invocations; every call starts
//! from the primary.

pub mod client;
pub mod error;
pub mod types;

pub use client::{DEFAULT_MODEL, GroqClient};
pub use error::{Error, Result, classify};
pub use types::{ChatMessage, ChatRequest, ChatResponse};
