//! Workspace-wide error type

use thiserror::Error;

/// Errors shared across crates.
#[derive(Error, Debug)]
pub enum Error {
    /// A required setting is missing or unusable. The message names the
    /// environment variable so the startup diagnostic can point at it.
    #[error("configuration error: {0}")]
    Config(String),

    #[error("i/o error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result alias using the shared Error.
pub type Result<T> = std::result::Result<T, Error>;
