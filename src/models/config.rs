//! Application configuration structures.

use std::fs;
use std::path::Path;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::{AppError, Result};

/// Root application configuration.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct HarvestConfig {
    /// HTTP client settings
    #[serde(default)]
    pub http: HttpConfig,

    /// Retry and backoff policy settings
    #[serde(default)]
    pub retry: RetryConfig,

    /// Pagination and concurrency settings
    #[serde(default)]
    pub harvest: HarvestSettings,

    /// Result cache settings
    #[serde(default)]
    pub cache: CacheConfig,
}

impl HarvestConfig {
    /// Load configuration from a TOML file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let content = fs::read_to_string(path)?;
        Ok(toml::from_str(&content)?)
    }

    /// Load configuration or return default if loading fails.
    pub fn load_or_default(path: impl AsRef<Path>) -> Self {
        Self::load(&path).unwrap_or_else(|e| {
            log::warn!(
                "Config load failed from {:?}: {}. Using defaults.",
                path.as_ref(),
                e
            );
            Self::default()
        })
    }

    /// Validate configuration values for basic sanity.
    pub fn validate(&self) -> Result<()> {
        if self.http.user_agent.trim().is_empty() {
            return Err(AppError::validation("http.user_agent is empty"));
        }
        if self.http.endpoint.trim().is_empty() {
            return Err(AppError::validation("http.endpoint is empty"));
        }
        if self.http.timeout_secs == 0 {
            return Err(AppError::validation("http.timeout_secs must be > 0"));
        }
        if self.retry.backoff_base_ms == 0 {
            return Err(AppError::validation("retry.backoff_base_ms must be > 0"));
        }
        if self.retry.backoff_cap_ms < self.retry.backoff_base_ms {
            return Err(AppError::validation(
                "retry.backoff_cap_ms must be >= retry.backoff_base_ms",
            ));
        }
        if self.harvest.page_limit == 0 {
            return Err(AppError::validation("harvest.page_limit must be >= 1"));
        }
        if self.harvest.concurrency == 0 {
            return Err(AppError::validation("harvest.concurrency must be >= 1"));
        }
        Ok(())
    }
}

/// HTTP client settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HttpConfig {
    /// Upstream endpoint the request builder targets
    #[serde(default = "defaults::endpoint")]
    pub endpoint: String,

    /// User-Agent header for HTTP requests
    #[serde(default = "defaults::user_agent")]
    pub user_agent: String,

    /// Per-attempt request timeout in seconds
    #[serde(default = "defaults::timeout")]
    pub timeout_secs: u64,
}

impl HttpConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self {
            endpoint: defaults::endpoint(),
            user_agent: defaults::user_agent(),
            timeout_secs: defaults::timeout(),
        }
    }
}

/// Retry and exponential backoff settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RetryConfig {
    /// Maximum retries after the initial attempt
    #[serde(default = "defaults::max_retries")]
    pub max_retries: u32,

    /// Base delay for exponential backoff, in milliseconds
    #[serde(default = "defaults::backoff_base")]
    pub backoff_base_ms: u64,

    /// Upper bound on any single backoff delay, in milliseconds
    #[serde(default = "defaults::backoff_cap")]
    pub backoff_cap_ms: u64,
}

impl RetryConfig {
    pub fn backoff_base(&self) -> Duration {
        Duration::from_millis(self.backoff_base_ms)
    }

    pub fn backoff_cap(&self) -> Duration {
        Duration::from_millis(self.backoff_cap_ms)
    }
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_retries: defaults::max_retries(),
            backoff_base_ms: defaults::backoff_base(),
            backoff_cap_ms: defaults::backoff_cap(),
        }
    }
}

/// Pagination and concurrency settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HarvestSettings {
    /// Maximum pages fetched per harvest run
    #[serde(default = "defaults::page_limit")]
    pub page_limit: u32,

    /// Maximum concurrently in-flight pipelines in `harvest_many`
    #[serde(default = "defaults::concurrency")]
    pub concurrency: usize,

    /// Delay between consecutive page requests in milliseconds
    #[serde(default = "defaults::request_delay")]
    pub request_delay_ms: u64,
}

impl Default for HarvestSettings {
    fn default() -> Self {
        Self {
            page_limit: defaults::page_limit(),
            concurrency: defaults::concurrency(),
            request_delay_ms: defaults::request_delay(),
        }
    }
}

/// Result cache settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CacheConfig {
    /// Whether normalized pages are cached at all
    #[serde(default = "defaults::cache_enabled")]
    pub enabled: bool,

    /// Time-to-live for cached pages, in seconds
    #[serde(default = "defaults::cache_ttl")]
    pub ttl_secs: u64,
}

impl CacheConfig {
    pub fn ttl(&self) -> Duration {
        Duration::from_secs(self.ttl_secs)
    }
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            enabled: defaults::cache_enabled(),
            ttl_secs: defaults::cache_ttl(),
        }
    }
}

mod defaults {
    // HTTP defaults
    pub fn endpoint() -> String {
        "https://api.example.com/search".into()
    }
    pub fn user_agent() -> String {
        "Mozilla/5.0 (compatible; harvester/0.1)".into()
    }
    pub fn timeout() -> u64 {
        30
    }

    // Retry defaults
    pub fn max_retries() -> u32 {
        5
    }
    pub fn backoff_base() -> u64 {
        1_000
    }
    pub fn backoff_cap() -> u64 {
        30_000
    }

    // Harvest defaults
    pub fn page_limit() -> u32 {
        10
    }
    pub fn concurrency() -> usize {
        4
    }
    pub fn request_delay() -> u64 {
        100
    }

    // Cache defaults
    pub fn cache_enabled() -> bool {
        true
    }
    pub fn cache_ttl() -> u64 {
        86_400
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn validate_default_config_ok() {
        assert!(HarvestConfig::default().validate().is_ok());
    }

    #[test]
    fn validate_rejects_empty_user_agent() {
        let mut config = HarvestConfig::default();
        config.http.user_agent = "  ".to_string();
        assert!(config.validate().is_err());
    }

    #[test]
    fn validate_rejects_zero_concurrency() {
        let mut config = HarvestConfig::default();
        config.harvest.concurrency = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn validate_rejects_zero_page_limit() {
        let mut config = HarvestConfig::default();
        config.harvest.page_limit = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn validate_rejects_cap_below_base() {
        let mut config = HarvestConfig::default();
        config.retry.backoff_base_ms = 5_000;
        config.retry.backoff_cap_ms = 1_000;
        assert!(config.validate().is_err());
    }

    #[test]
    fn partial_toml_fills_defaults() {
        let config: HarvestConfig = toml::from_str(
            r#"
            [retry]
            max_retries = 2
            "#,
        )
        .unwrap();
        assert_eq!(config.retry.max_retries, 2);
        assert_eq!(config.retry.backoff_base_ms, 1_000);
        assert_eq!(config.harvest.page_limit, 10);
        assert!(config.cache.enabled);
    }
}
