//! Shared crawl cache and request spacing
//!
//! The cache is the crawler's working memory: dedup markers for messages
//! and channels, memoized trend and hashtag results, and the rate
//! limiter's per-key timestamps all live in the same store, so the
//! components that share it observe one consistent view.

mod limiter;
mod store;

pub use limiter::RateLimiter;
pub use store::MemoryCache;
