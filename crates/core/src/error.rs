//! Unified error types for fedicomments.
//!
//! Resolution and fetch failures abort the current request only. Persistence
//! and load failures never leave the cache; they are logged and dropped there.

use crate::remote::RemoteError;

/// Unified error types for the comment aggregation core.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// Remote search failed (unreachable, timed out, or undecodable).
    #[error("RESOLUTION_FAILED: {0}")]
    Resolution(String),

    /// Status or descendant retrieval failed.
    #[error("FETCH_FAILED: {0}")]
    Fetch(String),

    /// Writing the cache file failed.
    #[error("PERSISTENCE_FAILED: {0}")]
    Persistence(String),

    /// Reading the cache file at startup failed.
    #[error("LOAD_FAILED: {0}")]
    Load(String),
}

impl Error {
    /// Build a resolution error from a failed remote search.
    pub fn resolution(err: RemoteError) -> Self {
        Error::Resolution(err.to_string())
    }

    /// Build a fetch error from a failed status or context lookup.
    pub fn fetch(err: RemoteError) -> Self {
        Error::Fetch(err.to_string())
    }
}

impl From<std::io::Error> for Error {
    fn from(err: std::io::Error) -> Self {
        Error::Persistence(err.to_string())
    }
}

impl From<serde_json::Error> for Error {
    fn from(err: serde_json::Error) -> Self {
        Error::Persistence(err.to_string())
    }
}
