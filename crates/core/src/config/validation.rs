//! Configuration validation rules.
//!
//! This module provides validation logic for `AppConfig` values
//! after they have been loaded from environment, files, or defaults.

use std::net::SocketAddr;

use crate::config::AppConfig;
use thiserror::Error;

/// Configuration validation errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to load configuration: {0}")]
    LoadFailed(String),

    #[error("invalid configuration: {field} - {reason}")]
    Invalid { field: String, reason: String },

    #[error("missing required configuration: {field} ({hint})")]
    Missing { field: String, hint: String },
}

impl AppConfig {
    /// Validate configuration values after loading.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::Missing` if `api_url` is empty, and
    /// `ConfigError::Invalid` if:
    /// - `api_url` is not an absolute http(s) URL
    /// - `timeout_ms` is less than 100ms or exceeds 60 seconds
    /// - `user_agent` is empty
    /// - `bind_addr` is not a socket address
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.api_url.is_empty() {
            return Err(ConfigError::Missing {
                field: "api_url".into(),
                hint: "Set FEDICOMMENTS_API_URL environment variable".into(),
            });
        }
        match url::Url::parse(&self.api_url) {
            Ok(url) if matches!(url.scheme(), "http" | "https") => {}
            Ok(url) => {
                return Err(ConfigError::Invalid {
                    field: "api_url".into(),
                    reason: format!("unsupported scheme: {}", url.scheme()),
                });
            }
            Err(e) => return Err(ConfigError::Invalid { field: "api_url".into(), reason: e.to_string() }),
        }

        if self.timeout_ms < 100 {
            return Err(ConfigError::Invalid { field: "timeout_ms".into(), reason: "must be at least 100ms".into() });
        }
        if self.timeout_ms > 60_000 {
            return Err(ConfigError::Invalid {
                field: "timeout_ms".into(),
                reason: "must not exceed 60 seconds (60000ms)".into(),
            });
        }

        if self.user_agent.is_empty() {
            return Err(ConfigError::Invalid { field: "user_agent".into(), reason: "must not be empty".into() });
        }

        if let Err(e) = self.bind_addr.parse::<SocketAddr>() {
            return Err(ConfigError::Invalid { field: "bind_addr".into(), reason: e.to_string() });
        }

        if self.api_token.is_empty() {
            tracing::warn!("api_token is not set; only public statuses will be searchable");
        }

        Ok(())
    }
}
