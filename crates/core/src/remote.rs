//! Remote API types and the client seam used by the aggregator.
//!
//! Only the fields the aggregator reads are modelled. Everything else in a
//! Mastodon payload (media, emoji, cards, mentions) is ignored on decode.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Error from any remote API call.
///
/// Transport failures, non-2xx responses and undecodable bodies all collapse
/// into this one type; the aggregator does not distinguish them.
#[derive(Debug, Clone, thiserror::Error)]
#[error("{message}")]
pub struct RemoteError {
    message: String,
}

impl RemoteError {
    pub fn new(message: impl Into<String>) -> Self {
        Self { message: message.into() }
    }
}

/// Account that authored a status.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct Account {
    pub id: String,
    #[serde(default)]
    pub username: String,
    #[serde(default)]
    pub display_name: String,
    #[serde(default)]
    pub url: String,
    #[serde(default)]
    pub avatar_static: String,
}

/// A single status (toot).
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Status {
    pub id: String,
    pub created_at: DateTime<Utc>,
    #[serde(default)]
    pub in_reply_to_id: Option<String>,
    #[serde(default)]
    pub uri: String,
    #[serde(default)]
    pub url: Option<String>,
    #[serde(default)]
    pub content: String,
    #[serde(default)]
    pub replies_count: u64,
    #[serde(default)]
    pub reblogs_count: u64,
    #[serde(default)]
    pub favourites_count: u64,
    pub account: Account,
}

/// Thread context of a status. Ancestors are not needed and not decoded.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct StatusContext {
    #[serde(default)]
    pub descendants: Vec<Status>,
}

/// Search response. Hashtag and account hits are ignored.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SearchResults {
    #[serde(default)]
    pub statuses: Vec<Status>,
}

/// Capability the aggregator consumes: search, fetch a status, fetch its replies.
#[async_trait::async_trait]
pub trait RemoteApi: Send + Sync {
    /// Full-text search for statuses matching `query`.
    async fn search(&self, query: &str) -> Result<SearchResults, RemoteError>;

    /// Fetch a single status by id.
    async fn fetch_status(&self, id: &str) -> Result<Status, RemoteError>;

    /// Fetch all replies below a status, directly or transitively.
    async fn fetch_descendants(&self, id: &str) -> Result<Vec<Status>, RemoteError>;
}
