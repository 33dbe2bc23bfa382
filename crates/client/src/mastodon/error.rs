//! Mastodon API client error types.

use std::sync::Arc;

use fedicomments_core::RemoteError;

/// Errors from the Mastodon API client.
#[derive(Debug, thiserror::Error)]
pub enum MastodonError {
    /// The configured instance URL is not an absolute http(s) URL.
    #[error("invalid base URL: {0}")]
    InvalidBaseUrl(String),

    /// Status id is empty or would escape its path segment.
    #[error("invalid status id: {0:?}")]
    InvalidId(String),

    /// Authentication failed (invalid or revoked token).
    #[error("authentication failed: invalid access token")]
    AuthError,

    /// The status does not exist or is not visible to the token.
    #[error("not found")]
    NotFound,

    /// Rate limited by the instance.
    #[error("rate limited: too many requests")]
    RateLimited,

    /// HTTP error response.
    #[error("HTTP error: {status}")]
    HttpError { status: u16 },

    /// Request timeout.
    #[error("request timeout")]
    Timeout,

    /// Network error.
    #[error("network error: {0}")]
    Network(Arc<reqwest::Error>),

    /// Response parse error.
    #[error("parse error: {0}")]
    Parse(String),
}

impl From<reqwest::Error> for MastodonError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() { MastodonError::Timeout } else { MastodonError::Network(Arc::new(err)) }
    }
}

impl From<MastodonError> for RemoteError {
    fn from(err: MastodonError) -> Self {
        RemoteError::new(err.to_string())
    }
}
