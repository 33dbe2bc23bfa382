//! Mastodon API client.
//!
//! Thin reqwest wrapper over the three endpoints the aggregator needs.
//!
//! ### Endpoints
//!
//! - **Search**: `GET /api/v2/search?q=<query>&type=statuses`
//! - **Status**: `GET /api/v1/statuses/:id`
//! - **Context**: `GET /api/v1/statuses/:id/context` (descendants only are read)
//!
//! ### Behaviour
//!
//! - **Authentication**: `Authorization: Bearer <token>` on every call when a token is configured.
//! - **Timeouts**: one client-wide timeout (default 5s); a timeout is an ordinary error.
//! - **Errors**: 401/403, 404, 429 and other non-2xx statuses map to distinct
//!   [`MastodonError`] variants, which all collapse into a single `RemoteError`
//!   at the [`RemoteApi`] seam.

pub mod error;

pub use error::MastodonError;

use std::time::{Duration, Instant};

use fedicomments_core::{AppConfig, RemoteApi, RemoteError, SearchResults, Status, StatusContext};
use reqwest::header;
use serde::de::DeserializeOwned;
use url::Url;

/// Default request timeout.
const DEFAULT_TIMEOUT: Duration = Duration::from_secs(5);

/// Default user agent.
const DEFAULT_USER_AGENT: &str = concat!("fedicomments/", env!("CARGO_PKG_VERSION"));

/// Mastodon client configuration.
#[derive(Debug, Clone)]
pub struct MastodonConfig {
    /// Instance base URL, e.g. `https://mastodon.social`.
    pub base_url: String,
    /// Access token; empty for anonymous access.
    pub token: String,
    /// Request timeout (default: 5s).
    pub timeout: Duration,
    /// User-agent string (default: fedicomments/0.x).
    pub user_agent: String,
}

impl Default for MastodonConfig {
    fn default() -> Self {
        Self {
            base_url: String::new(),
            token: String::new(),
            timeout: DEFAULT_TIMEOUT,
            user_agent: DEFAULT_USER_AGENT.to_string(),
        }
    }
}

impl From<&AppConfig> for MastodonConfig {
    fn from(config: &AppConfig) -> Self {
        Self {
            base_url: config.api_url.clone(),
            token: config.api_token.clone(),
            timeout: config.timeout(),
            user_agent: config.user_agent.clone(),
        }
    }
}

/// Mastodon API client.
#[derive(Debug, Clone)]
pub struct MastodonClient {
    http: reqwest::Client,
    base_url: String,
    token: String,
}

impl MastodonClient {
    /// Create a new client with the given configuration.
    pub fn new(config: MastodonConfig) -> Result<Self, MastodonError> {
        let base = Url::parse(&config.base_url).map_err(|e| MastodonError::InvalidBaseUrl(e.to_string()))?;
        if !matches!(base.scheme(), "http" | "https") {
            return Err(MastodonError::InvalidBaseUrl(format!("unsupported scheme: {}", base.scheme())));
        }

        let http = reqwest::Client::builder()
            .timeout(config.timeout)
            .user_agent(&config.user_agent)
            .gzip(true)
            .brotli(true)
            .deflate(true)
            .build()?;

        Ok(Self { http, base_url: config.base_url.trim_end_matches('/').to_string(), token: config.token })
    }

    /// Search statuses matching `query`.
    pub async fn search_statuses(&self, query: &str) -> Result<SearchResults, MastodonError> {
        let url = self.endpoint("/api/v2/search")?;
        self.get_json(url, &[("q", query), ("type", "statuses")]).await
    }

    /// Fetch a single status.
    pub async fn status(&self, id: &str) -> Result<Status, MastodonError> {
        let url = self.endpoint(&format!("/api/v1/statuses/{}", checked_id(id)?))?;
        self.get_json(url, &[]).await
    }

    /// Fetch the thread context of a status.
    pub async fn context(&self, id: &str) -> Result<StatusContext, MastodonError> {
        let url = self.endpoint(&format!("/api/v1/statuses/{}/context", checked_id(id)?))?;
        self.get_json(url, &[]).await
    }

    fn endpoint(&self, path: &str) -> Result<Url, MastodonError> {
        Url::parse(&format!("{}{}", self.base_url, path)).map_err(|e| MastodonError::InvalidBaseUrl(e.to_string()))
    }

    async fn get_json<T: DeserializeOwned>(&self, url: Url, query: &[(&str, &str)]) -> Result<T, MastodonError> {
        let start = Instant::now();
        tracing::debug!(url = %url, "querying Mastodon API");

        let mut request = self.http.get(url.clone()).header(header::ACCEPT, "application/json");
        if !query.is_empty() {
            request = request.query(query);
        }
        if !self.token.is_empty() {
            request = request.bearer_auth(&self.token);
        }

        let response = request.send().await?;

        let status = response.status();
        tracing::debug!(url = %url, status = %status, elapsed = ?start.elapsed(), "Mastodon API response");

        if status == 401 || status == 403 {
            return Err(MastodonError::AuthError);
        }

        if status == 404 {
            return Err(MastodonError::NotFound);
        }

        if status == 429 {
            return Err(MastodonError::RateLimited);
        }

        if !status.is_success() {
            return Err(MastodonError::HttpError { status: status.as_u16() });
        }

        let bytes = response.bytes().await?;
        serde_json::from_slice(&bytes).map_err(|e| MastodonError::Parse(e.to_string()))
    }
}

/// Reject ids that are empty or could alter the request path.
fn checked_id(id: &str) -> Result<&str, MastodonError> {
    if id.is_empty() || !id.chars().all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_') {
        return Err(MastodonError::InvalidId(id.to_string()));
    }
    Ok(id)
}

#[async_trait::async_trait]
impl RemoteApi for MastodonClient {
    async fn search(&self, query: &str) -> Result<SearchResults, RemoteError> {
        Ok(self.search_statuses(query).await?)
    }

    async fn fetch_status(&self, id: &str) -> Result<Status, RemoteError> {
        Ok(self.status(id).await?)
    }

    async fn fetch_descendants(&self, id: &str) -> Result<Vec<Status>, RemoteError> {
        Ok(self.context(id).await?.descendants)
    }
}
