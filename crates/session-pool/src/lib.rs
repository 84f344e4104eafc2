//! Session pool with failure-aware round-robin selection
//!
//! Loads session descriptors once at startup, hands out tokens round-robin
//! while skipping entries inside their backoff window, and takes
//! success/failure feedback from the failover loop. Session health lives
//! only in process memory; nothing is written back to the descriptor
//! directory.

mod descriptor;
pub mod pool;

pub use pool::{PoolStatus, Session, SessionPool, backoff};
