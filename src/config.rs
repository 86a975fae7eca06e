//! Client configuration
//!
//! Defaults point at the public GitHub Pages deployment. Every field can be
//! overridden with a builder method or, through [`ClientConfig::from_env`],
//! with `RAAS_*` environment variables.

use std::env;
use std::time::Duration;

/// Base URL of the public static API
pub const DEFAULT_BASE_URL: &str = "https://maijied.github.io/roast-as-a-service/api";

/// Language used when a request does not name one
pub const DEFAULT_LANG: &str = "en";

/// Time-to-live for cached shards in hours
pub const CACHE_TTL_HOURS: u64 = 24;

/// Per-request HTTP timeout in seconds
const DEFAULT_TIMEOUT_SECS: u64 = 10;

/// Configuration for a [`RoastClient`](crate::client::RoastClient)
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientConfig {
    /// API root without trailing slash
    pub base_url: String,
    /// Language used when `RoastOptions::lang` is unset
    pub default_lang: String,
    /// Maximum age of a cached shard
    pub cache_ttl: Duration,
    /// Timeout applied to each HTTP request
    pub request_timeout: Duration,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            default_lang: DEFAULT_LANG.to_string(),
            cache_ttl: Duration::from_secs(CACHE_TTL_HOURS * 60 * 60),
            request_timeout: Duration::from_secs(DEFAULT_TIMEOUT_SECS),
        }
    }
}

impl ClientConfig {
    /// Builds a config from defaults overlaid with `RAAS_BASE_URL`,
    /// `RAAS_DEFAULT_LANG`, `RAAS_CACHE_TTL_SECS` and `RAAS_TIMEOUT_SECS`.
    ///
    /// Unparsable numeric values are ignored.
    pub fn from_env() -> Self {
        Self::from_lookup(|key| env::var(key).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let mut config = Self::default();

        if let Some(url) = lookup("RAAS_BASE_URL").filter(|v| !v.trim().is_empty()) {
            config = config.with_base_url(url);
        }
        if let Some(lang) = lookup("RAAS_DEFAULT_LANG").filter(|v| !v.trim().is_empty()) {
            config.default_lang = lang.trim().to_string();
        }
        if let Some(secs) = lookup("RAAS_CACHE_TTL_SECS").and_then(|v| v.trim().parse().ok()) {
            config.cache_ttl = Duration::from_secs(secs);
        }
        if let Some(secs) = lookup("RAAS_TIMEOUT_SECS").and_then(|v| v.trim().parse().ok()) {
            config.request_timeout = Duration::from_secs(secs);
        }

        config
    }

    /// Sets the API root; a trailing slash is stripped
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        let base_url: String = base_url.into();
        self.base_url = base_url.trim().trim_end_matches('/').to_string();
        self
    }

    pub fn with_default_lang(mut self, lang: impl Into<String>) -> Self {
        self.default_lang = lang.into();
        self
    }

    pub fn with_cache_ttl(mut self, ttl: Duration) -> Self {
        self.cache_ttl = ttl;
        self
    }

    pub fn with_request_timeout(mut self, timeout: Duration) -> Self {
        self.request_timeout = timeout;
        self
    }

    /// URL of the manifest resource
    pub fn manifest_url(&self) -> String {
        format!("{}/manifest.json", self.base_url)
    }

    /// URL of one shard of a language
    pub fn shard_url(&self, lang: &str, shard: u32) -> String {
        format!("{}/{}/roasts-{}-{}.json", self.base_url, lang, lang, shard)
    }
}
