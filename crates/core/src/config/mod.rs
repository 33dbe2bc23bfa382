//! Application configuration with layered loading.
//!
//! This module provides configuration management using figment for layered
//! configuration loading from multiple sources:
//!
//! 1. Environment variables (FEDICOMMENTS_*)
//! 2. TOML config file (if FEDICOMMENTS_CONFIG_FILE set)
//! 3. Built-in defaults

use std::path::PathBuf;
use std::time::Duration;

use figment::{
    Figment,
    providers::{Env, Format, Serialized, Toml},
};
use serde::{Deserialize, Deserializer, Serialize};

mod validation;

pub use validation::ConfigError;

/// Application configuration with layered loading.
///
/// Loading precedence (highest wins):
/// 1. Environment variables (FEDICOMMENTS_*)
/// 2. TOML config file (if FEDICOMMENTS_CONFIG_FILE set)
/// 3. Built-in defaults
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    /// Base URL of the Mastodon instance, e.g. `https://mastodon.social`.
    ///
    /// Set via FEDICOMMENTS_API_URL environment variable.
    #[serde(default)]
    pub api_url: String,

    /// Bearer token sent with every API call.
    ///
    /// Set via FEDICOMMENTS_API_TOKEN environment variable.
    #[serde(default, deserialize_with = "lenient_string")]
    pub api_token: String,

    /// Only statuses by this account id count as thread roots.
    ///
    /// Set via FEDICOMMENTS_OWNER_ID environment variable.
    #[serde(default, deserialize_with = "lenient_optional_string")]
    pub owner_id: Option<String>,

    /// Path of the persisted root cache.
    ///
    /// Set via FEDICOMMENTS_CACHE_PATH environment variable.
    #[serde(default = "default_cache_path")]
    pub cache_path: PathBuf,

    /// Address the HTTP server listens on.
    ///
    /// Set via FEDICOMMENTS_BIND_ADDR environment variable.
    #[serde(default = "default_bind_addr")]
    pub bind_addr: String,

    /// Remote API request timeout in milliseconds.
    ///
    /// Set via FEDICOMMENTS_TIMEOUT_MS environment variable.
    #[serde(default = "default_timeout_ms")]
    pub timeout_ms: u64,

    /// User-Agent string for API requests.
    ///
    /// Set via FEDICOMMENTS_USER_AGENT environment variable.
    #[serde(default = "default_user_agent")]
    pub user_agent: String,
}

/// Environment values that look numeric (account ids, tokens) arrive as numbers.
#[derive(Deserialize)]
#[serde(untagged)]
enum StringOrNumber {
    String(String),
    Unsigned(u64),
    Signed(i64),
}

impl From<StringOrNumber> for String {
    fn from(value: StringOrNumber) -> Self {
        match value {
            StringOrNumber::String(s) => s,
            StringOrNumber::Unsigned(n) => n.to_string(),
            StringOrNumber::Signed(n) => n.to_string(),
        }
    }
}

fn lenient_string<'de, D: Deserializer<'de>>(deserializer: D) -> Result<String, D::Error> {
    StringOrNumber::deserialize(deserializer).map(String::from)
}

fn lenient_optional_string<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Option<String>, D::Error> {
    Ok(Option::<StringOrNumber>::deserialize(deserializer)?.map(String::from))
}

fn default_cache_path() -> PathBuf {
    PathBuf::from("./fedicomments-roots.json")
}

fn default_bind_addr() -> String {
    "127.0.0.1:8080".into()
}

fn default_timeout_ms() -> u64 {
    5_000
}

fn default_user_agent() -> String {
    "fedicomments/0.1".into()
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            api_url: String::new(),
            api_token: String::new(),
            owner_id: None,
            cache_path: default_cache_path(),
            bind_addr: default_bind_addr(),
            timeout_ms: default_timeout_ms(),
            user_agent: default_user_agent(),
        }
    }
}

impl AppConfig {
    /// Timeout as Duration for use with reqwest/tokio.
    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }

    /// Owner filter, with an empty string treated as unset.
    pub fn owner_filter(&self) -> Option<&str> {
        self.owner_id.as_deref().filter(|id| !id.is_empty())
    }

    /// Load configuration from all sources with layered precedence.
    ///
    /// Priority (highest wins):
    /// 1. Environment variables prefixed with `FEDICOMMENTS_`
    /// 2. TOML file from `FEDICOMMENTS_CONFIG_FILE` (if set)
    /// 3. Built-in defaults via `Default::default()`
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if:
    /// - Configuration file cannot be read
    /// - Environment variables cannot be parsed
    /// - Validation fails after loading
    pub fn load() -> Result<Self, ConfigError> {
        let mut figment = Figment::from(Serialized::defaults(Self::default()));

        if let Ok(config_path) = std::env::var("FEDICOMMENTS_CONFIG_FILE") {
            figment = figment.merge(Toml::file(&config_path));
        }

        figment = figment.merge(
            Env::prefixed("FEDICOMMENTS_")
                .ignore(&["config_file"])
                .map(|key| key.as_str().to_lowercase().into()),
        );

        let config: Self = figment.extract().map_err(|e| ConfigError::LoadFailed(e.to_string()))?;

        config.validate()?;

        Ok(config)
    }
}
