//! Response model and the shaping filters that produce it.
//!
//! Converts raw remote statuses into the comment, author and stats
//! representation served to embedding pages, and decides which search hits
//! count as thread roots.

use std::collections::BTreeMap;
use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::remote::{Account, Status};

/// Cache lifetime advertised when no root was found.
const SHORT_LIFETIME: Duration = Duration::from_secs(60);

/// Cache lifetime advertised for an assembled thread.
const LONG_LIFETIME: Duration = Duration::from_secs(600);

/// Comment author as shown by the widget.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct Author {
    pub display_name: String,
    pub avatar: String,
    pub url: String,
}

impl From<&Account> for Author {
    /// Accounts without a display name are shown by username.
    fn from(account: &Account) -> Self {
        let display_name =
            if account.display_name.is_empty() { account.username.clone() } else { account.display_name.clone() };

        Self { display_name, avatar: account.avatar_static.clone(), url: account.url.clone() }
    }
}

/// A single reply in a thread.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Comment {
    pub author: Author,
    pub toot: String,
    pub date: DateTime<Utc>,
    pub url: String,
    pub reply_to: Option<String>,
    pub root: String,
}

/// Engagement counters for the root status.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct Stats {
    pub reblogs: u64,
    pub favs: u64,
    pub replies: u64,
    pub url: String,
    pub root: String,
}

/// Everything served for one query.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct ThreadResult {
    pub comments: BTreeMap<String, Comment>,
    pub stats: Stats,
}

impl ThreadResult {
    /// Whether a root status was found for the query.
    pub fn has_root(&self) -> bool {
        !self.stats.root.is_empty()
    }

    /// How long downstream caches may keep this result.
    pub fn cache_lifetime(&self) -> CacheLifetime {
        if self.has_root() { CacheLifetime::Long } else { CacheLifetime::Short }
    }
}

/// Cache lifetime hint for HTTP responses.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CacheLifetime {
    /// No root yet; the post may be tooted soon, so re-check quickly.
    Short,
    /// A thread was assembled.
    Long,
}

impl CacheLifetime {
    pub fn max_age(self) -> Duration {
        match self {
            CacheLifetime::Short => SHORT_LIFETIME,
            CacheLifetime::Long => LONG_LIFETIME,
        }
    }

    /// Value for a `Cache-Control` header.
    pub fn header_value(self) -> String {
        format!("max-age={}", self.max_age().as_secs())
    }
}

/// Shape descendants into comments keyed by status id, all stamped with `root`.
pub fn filter_comments(statuses: &[Status], root: &str) -> BTreeMap<String, Comment> {
    statuses
        .iter()
        .map(|status| {
            let comment = Comment {
                author: Author::from(&status.account),
                toot: status.content.clone(),
                date: status.created_at,
                url: status.uri.clone(),
                reply_to: status.in_reply_to_id.clone(),
                root: root.to_string(),
            };
            (status.id.clone(), comment)
        })
        .collect()
}

/// Shape the root status into stats. `replies` and `root` are stamped by the caller.
pub fn filter_stats(status: &Status) -> Stats {
    Stats {
        reblogs: status.reblogs_count,
        favs: status.favourites_count,
        replies: status.replies_count,
        url: status.url.clone().unwrap_or_else(|| status.uri.clone()),
        root: String::new(),
    }
}

/// Select root candidates from search hits, preserving their order.
///
/// A hit qualifies when it is not a reply and, if `owner_id` is set, was
/// authored by that account.
pub fn filter_roots(statuses: &[Status], owner_id: Option<&str>) -> Vec<String> {
    statuses
        .iter()
        .filter(|status| status.in_reply_to_id.is_none())
        .filter(|status| owner_id.is_none_or(|owner| status.account.id == owner))
        .map(|status| status.id.clone())
        .collect()
}
