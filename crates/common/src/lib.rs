//! Shared types for the crawler workspace

mod error;
mod secret;

pub use error::{Error, Result};
pub use secret::Secret;
