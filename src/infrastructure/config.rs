//! Configuration infrastructure
//!
//! Contains configuration loading and validation for the listing crawl.
//!
//! Every value has a built-in default. An optional JSON overlay
//! (`auction_scout.json` in the working directory) may override any subset
//! of sections; the file is only ever read, never written.

#![allow(clippy::uninlined_format_args)]

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tokio::fs;
use tracing::info;

use crate::crawling::backoff::{BackoffPolicy, JitterRange};
use crate::domain::PolicyFilter;
use crate::infrastructure::parsing::ParsingConfig;

/// Complete application configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub site: SiteConfig,
    pub http: HttpClientConfig,
    pub parsing: ParsingConfig,
    pub policy: PolicyConfig,
    pub crawl: CrawlConfig,
    pub output: OutputConfig,
    pub logging: LoggingConfig,
}

/// Where the listing pages live
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SiteConfig {
    pub base_url: String,
    /// Path of the listings page relative to `base_url`
    pub listings_path: String,
    pub sort_field: String,
    pub server_id: String,
}

/// HTTP client settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct HttpClientConfig {
    pub timeout_seconds: u64,
    /// One entry is picked at random for every request
    pub user_agents: Vec<String>,
    pub accept: String,
    pub accept_language: String,
    pub referer: String,
    pub cache_control: String,
}

/// Acceptance thresholds and blocklist
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PolicyConfig {
    /// Listings priced at or above this are rejected
    pub price_limit: f64,
    /// Listings rated above this are rejected
    pub rating_limit: f64,
    /// Case-insensitive substrings that reject a listing URL
    pub blocked_substrings: Vec<String>,
}

/// Crawl loop settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CrawlConfig {
    pub backoff: BackoffPolicy,
    /// Pause after every page that moved the crawl forward
    pub success_delay: JitterRange,
    /// Stop after this many empty pages in a row once data has been found
    pub max_trailing_empty_pages: Option<u32>,
    /// Hard ceiling on the number of pages visited
    pub max_pages: Option<u32>,
}

/// CSV output location
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct OutputConfig {
    pub directory: PathBuf,
    /// File name is `<prefix>_<YYYY-MM-DD_HH-MM-SS>.csv`
    pub file_prefix: String,
}

/// Logging configuration settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Log level: "error", "warn", "info", "debug", "trace"
    pub level: String,

    /// Enable JSON formatted logs
    pub json_format: bool,

    /// Enable console output
    pub console_output: bool,

    /// Enable file output
    pub file_output: bool,

    pub log_dir: PathBuf,
    pub file_name: String,
}

impl Default for SiteConfig {
    fn default() -> Self {
        Self {
            base_url: player_auctions::BASE_URL.to_string(),
            listings_path: player_auctions::LISTINGS_PATH.to_string(),
            sort_field: player_auctions::SORT_FIELD.to_string(),
            server_id: player_auctions::SERVER_ID.to_string(),
        }
    }
}

impl Default for HttpClientConfig {
    fn default() -> Self {
        Self {
            timeout_seconds: defaults::REQUEST_TIMEOUT_SECONDS,
            user_agents: defaults::USER_AGENTS.iter().map(|s| s.to_string()).collect(),
            accept: defaults::ACCEPT.to_string(),
            accept_language: defaults::ACCEPT_LANGUAGE.to_string(),
            referer: format!("{}/", player_auctions::BASE_URL),
            cache_control: defaults::CACHE_CONTROL.to_string(),
        }
    }
}

impl Default for PolicyConfig {
    fn default() -> Self {
        Self {
            price_limit: defaults::PRICE_LIMIT,
            rating_limit: defaults::RATING_LIMIT,
            blocked_substrings: defaults::BLOCKED_SUBSTRINGS.iter().map(|s| s.to_string()).collect(),
        }
    }
}

impl Default for CrawlConfig {
    fn default() -> Self {
        Self {
            backoff: BackoffPolicy::default(),
            success_delay: JitterRange::default(),
            max_trailing_empty_pages: Some(defaults::MAX_TRAILING_EMPTY_PAGES),
            max_pages: None,
        }
    }
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            directory: PathBuf::from("."),
            file_prefix: defaults::OUTPUT_FILE_PREFIX.to_string(),
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: defaults::LOG_LEVEL.to_string(),
            json_format: defaults::LOG_JSON_FORMAT,
            console_output: defaults::LOG_CONSOLE_OUTPUT,
            file_output: defaults::LOG_FILE_OUTPUT,
            log_dir: PathBuf::from(defaults::LOG_DIR),
            file_name: defaults::LOG_FILE_NAME.to_string(),
        }
    }
}

impl From<&PolicyConfig> for PolicyFilter {
    fn from(config: &PolicyConfig) -> Self {
        Self::new(config.price_limit, config.rating_limit, &config.blocked_substrings)
    }
}

/// Configuration values that cannot drive a crawl
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ConfigError {
    #[error("Invalid base URL '{url}': {reason}")]
    InvalidBaseUrl { url: String, reason: String },

    #[error("User agent pool is empty")]
    NoUserAgents,

    #[error("{field} must be a finite, positive number (got {value})")]
    InvalidLimit { field: &'static str, value: f64 },

    #[error("Backoff needs at least one attempt")]
    ZeroRetryBudget,

    #[error("Success delay range is inverted ({min_ms} ms > {max_ms} ms)")]
    InvertedJitterRange { min_ms: u64, max_ms: u64 },

    #[error("Selector list for {field} is empty")]
    EmptySelectorList { field: &'static str },

    #[error("At least one of console or file logging must be enabled")]
    NoLogOutput,

    #[error("{field} '{actual}' does not share the site origin of '{expected}'")]
    OriginMismatch {
        field: &'static str,
        expected: String,
        actual: String,
    },
}

impl AppConfig {
    /// Reject settings that would make the crawl meaningless
    pub fn validate(&self) -> Result<(), ConfigError> {
        let parse_base = |base: &String| {
            url::Url::parse(base).map_err(|e| ConfigError::InvalidBaseUrl {
                url: base.clone(),
                reason: e.to_string(),
            })
        };
        let site = parse_base(&self.site.base_url)?;
        let parsing = parse_base(&self.parsing.base_url)?;

        let mismatch = |field: &'static str, actual: &String| ConfigError::OriginMismatch {
            field,
            expected: self.site.base_url.clone(),
            actual: actual.clone(),
        };
        if parsing.origin() != site.origin() {
            return Err(mismatch("parsing.base_url", &self.parsing.base_url));
        }
        match url::Url::parse(&self.http.referer) {
            Ok(referer) if referer.origin() == site.origin() => {}
            _ => return Err(mismatch("http.referer", &self.http.referer)),
        }

        if self.http.user_agents.is_empty() {
            return Err(ConfigError::NoUserAgents);
        }

        for (field, value) in [
            ("price_limit", self.policy.price_limit),
            ("rating_limit", self.policy.rating_limit),
        ] {
            if !value.is_finite() || value <= 0.0 {
                return Err(ConfigError::InvalidLimit { field, value });
            }
        }

        if self.crawl.backoff.max_attempts == 0 {
            return Err(ConfigError::ZeroRetryBudget);
        }

        let delay = &self.crawl.success_delay;
        if delay.min_ms > delay.max_ms {
            return Err(ConfigError::InvertedJitterRange {
                min_ms: delay.min_ms,
                max_ms: delay.max_ms,
            });
        }

        if self.parsing.selectors.price.is_empty() {
            return Err(ConfigError::EmptySelectorList { field: "price" });
        }
        if self.parsing.selectors.rating.is_empty() {
            return Err(ConfigError::EmptySelectorList { field: "rating" });
        }

        if !self.logging.console_output && !self.logging.file_output {
            return Err(ConfigError::NoLogOutput);
        }

        Ok(())
    }
}

/// Configuration manager for loading settings
pub struct ConfigManager {
    pub config_path: PathBuf,
}

impl Default for ConfigManager {
    fn default() -> Self {
        Self::new()
    }
}

impl ConfigManager {
    /// Overlay file in the current working directory
    pub fn new() -> Self {
        Self {
            config_path: PathBuf::from(defaults::CONFIG_FILE_NAME),
        }
    }

    pub fn with_path(config_path: impl Into<PathBuf>) -> Self {
        Self {
            config_path: config_path.into(),
        }
    }

    /// Load configuration, falling back to defaults when no overlay exists.
    ///
    /// A present but unreadable or malformed overlay is an error; the caller
    /// decides whether to continue with defaults.
    pub async fn load_config(&self) -> Result<AppConfig> {
        if !fs::try_exists(&self.config_path).await.unwrap_or(false) {
            info!("Configuration file not found, using defaults: {:?}", self.config_path);
            return Ok(AppConfig::default());
        }

        let content = fs::read_to_string(&self.config_path)
            .await
            .with_context(|| format!("Failed to read configuration file {:?}", self.config_path))?;

        let mut overlay = serde_json::from_str::<serde_json::Value>(&content)
            .with_context(|| format!("Failed to parse configuration file {:?}", self.config_path))?;
        inherit_site_origin(&mut overlay);
        let config = serde_json::from_value::<AppConfig>(overlay)
            .with_context(|| format!("Failed to parse configuration file {:?}", self.config_path))?;

        info!("Loaded configuration from: {:?}", self.config_path);
        Ok(config)
    }

    /// Get the configuration file path
    pub fn config_path(&self) -> &Path {
        &self.config_path
    }
}

/// An overlay that moves `site.base_url` also moves the link base and the
/// referer, unless it sets them itself.
fn inherit_site_origin(overlay: &mut serde_json::Value) {
    let Some(base) = overlay.pointer("/site/base_url").and_then(serde_json::Value::as_str) else {
        return;
    };
    let base = base.trim_end_matches('/').to_string();

    if overlay.pointer("/parsing/base_url").is_none() {
        set_overlay_field(overlay, "parsing", "base_url", base.clone());
    }
    if overlay.pointer("/http/referer").is_none() {
        set_overlay_field(overlay, "http", "referer", format!("{}/", base));
    }
}

fn set_overlay_field(overlay: &mut serde_json::Value, section: &str, key: &str, value: String) {
    let Some(root) = overlay.as_object_mut() else {
        return;
    };
    let section = root
        .entry(section)
        .or_insert_with(|| serde_json::Value::Object(serde_json::Map::new()));
    if let Some(section) = section.as_object_mut() {
        section.insert(key.to_string(), serde_json::Value::String(value));
    }
}

/// PlayerAuctions OSRS account listing constants
pub mod player_auctions {
    /// Site origin, also the base for relative listing links
    pub const BASE_URL: &str = "https://www.playerauctions.com";

    /// Account listings page
    pub const LISTINGS_PATH: &str = "osrs-account/";

    /// Cheapest-reviewed listings first
    pub const SORT_FIELD: &str = "least-reviews";

    pub const SERVER_ID: &str = "5568";

    /// Query parameter names
    pub mod params {
        pub const SORT_FIELD: &str = "SortField";
        pub const PAGE_INDEX: &str = "PageIndex";
        pub const SERVER_ID: &str = "ServerId";
    }
}

/// Default crawling configuration values
pub mod defaults {
    pub const CONFIG_FILE_NAME: &str = "auction_scout.json";

    /// Default request timeout in seconds
    pub const REQUEST_TIMEOUT_SECONDS: u64 = 30;

    pub const USER_AGENTS: &[&str] = &[
        "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/91.0.4472.124 Safari/537.36",
        "Mozilla/5.0 (Macintosh; Intel Mac OS X 10_15_7) AppleWebKit/605.1.15 (KHTML, like Gecko) Version/14.1.1 Safari/605.1.15",
        "Mozilla/5.0 (Windows NT 10.0; Win64; x64; rv:89.0) Gecko/20100101 Firefox/89.0",
        "Mozilla/5.0 (X11; Linux x86_64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/91.0.4472.124 Safari/537.36",
        "Mozilla/5.0 (iPhone; CPU iPhone OS 14_6 like Mac OS X) AppleWebKit/605.1.15 (KHTML, like Gecko) Version/14.1.1 Mobile/15E148 Safari/604.1",
    ];

    pub const ACCEPT: &str = "text/html,application/xhtml+xml,application/xml;q=0.9,image/webp,*/*;q=0.8";
    pub const ACCEPT_LANGUAGE: &str = "en-US,en;q=0.5";
    pub const CACHE_CONTROL: &str = "max-age=0";

    pub const PRICE_LIMIT: f64 = 2500.0;
    pub const RATING_LIMIT: f64 = 5.0;

    pub const BLOCKED_SUBSTRINGS: &[&str] = &[
        "pure",
        "iron",
        "stake",
        "obby",
        "level-3",
        "1def",
        "ironman",
        "zerker",
        "hcim",
        "hardcore",
        "g-maul-pure",
    ];

    /// Empty pages in a row, after data was found, that end the crawl
    pub const MAX_TRAILING_EMPTY_PAGES: u32 = 5;

    pub const OUTPUT_FILE_PREFIX: &str = "pa_accounts";

    // Log configuration defaults
    /// Default log level
    pub const LOG_LEVEL: &str = "info";

    /// Default JSON format setting
    pub const LOG_JSON_FORMAT: bool = false;

    /// Default console output setting
    pub const LOG_CONSOLE_OUTPUT: bool = true;

    /// Default file output setting
    pub const LOG_FILE_OUTPUT: bool = false;

    pub const LOG_DIR: &str = "logs";
    pub const LOG_FILE_NAME: &str = "auction-scout.log";
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn defaults_validate() {
        let config = AppConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.policy.blocked_substrings.len(), 11);
        assert_eq!(config.http.user_agents.len(), 5);
        assert_eq!(config.http.referer, "https://www.playerauctions.com/");
        assert_eq!(config.crawl.backoff.max_attempts, 3);
    }

    #[test]
    fn policy_config_builds_filter() {
        let filter = PolicyFilter::from(&PolicyConfig::default());
        assert!((filter.price_limit() - 2500.0).abs() < f64::EPSILON);
        assert!((filter.rating_limit() - 5.0).abs() < f64::EPSILON);
        assert!(filter.blocked_substrings().iter().any(|s| s == "hcim"));
    }

    #[test]
    fn validation_catches_bad_values() {
        let mut config = AppConfig::default();
        config.policy.price_limit = f64::NAN;
        assert!(matches!(
            config.validate(),
            Err(ConfigError::InvalidLimit { field: "price_limit", .. })
        ));

        let mut config = AppConfig::default();
        config.http.user_agents.clear();
        assert_eq!(config.validate(), Err(ConfigError::NoUserAgents));

        let mut config = AppConfig::default();
        config.crawl.backoff.max_attempts = 0;
        assert_eq!(config.validate(), Err(ConfigError::ZeroRetryBudget));

        let mut config = AppConfig::default();
        config.policy.rating_limit = 0.0;
        assert!(matches!(
            config.validate(),
            Err(ConfigError::InvalidLimit { field: "rating_limit", .. })
        ));

        let mut config = AppConfig::default();
        config.crawl.success_delay = JitterRange { min_ms: 5, max_ms: 1 };
        assert_eq!(
            config.validate(),
            Err(ConfigError::InvertedJitterRange { min_ms: 5, max_ms: 1 })
        );

        let mut config = AppConfig::default();
        config.site.base_url = "not a url".into();
        assert!(matches!(config.validate(), Err(ConfigError::InvalidBaseUrl { .. })));
    }

    #[tokio::test]
    async fn missing_overlay_yields_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let manager = ConfigManager::with_path(dir.path().join("absent.json"));
        let config = manager.load_config().await.unwrap();
        assert!((config.policy.price_limit - 2500.0).abs() < f64::EPSILON);
    }

    #[tokio::test]
    async fn partial_overlay_keeps_other_defaults() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(
            file,
            r#"{{ "policy": {{ "price_limit": 900.0 }}, "crawl": {{ "max_pages": 4 }} }}"#
        )
        .unwrap();

        let config = ConfigManager::with_path(file.path()).load_config().await.unwrap();
        assert!((config.policy.price_limit - 900.0).abs() < f64::EPSILON);
        assert!((config.policy.rating_limit - 5.0).abs() < f64::EPSILON);
        assert_eq!(config.policy.blocked_substrings.len(), 11);
        assert_eq!(config.crawl.max_pages, Some(4));
        assert_eq!(config.crawl.max_trailing_empty_pages, Some(5));
        assert_eq!(config.site.server_id, "5568");
    }

    #[test]
    fn validation_rejects_origins_that_disagree() {
        let mut config = AppConfig::default();
        config.site.base_url = "https://mirror.example".into();
        assert!(matches!(
            config.validate(),
            Err(ConfigError::OriginMismatch { field: "parsing.base_url", .. })
        ));

        config.parsing.base_url = "https://mirror.example".into();
        assert!(matches!(
            config.validate(),
            Err(ConfigError::OriginMismatch { field: "http.referer", .. })
        ));

        config.http.referer = "https://mirror.example/osrs-account/".into();
        assert!(config.validate().is_ok());
    }

    #[tokio::test]
    async fn overlay_base_url_moves_link_base_and_referer() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, r#"{{ "site": {{ "base_url": "http://127.0.0.1:8080/" }} }}"#).unwrap();

        let config = ConfigManager::with_path(file.path()).load_config().await.unwrap();
        assert_eq!(config.parsing.base_url, "http://127.0.0.1:8080");
        assert_eq!(config.http.referer, "http://127.0.0.1:8080/");
        assert_eq!(config.http.user_agents.len(), 5);
        assert!(config.validate().is_ok());
    }

    #[tokio::test]
    async fn overlay_keeps_explicit_referer() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(
            file,
            r#"{{ "site": {{ "base_url": "http://127.0.0.1:8080" }}, "http": {{ "referer": "http://127.0.0.1:8080/home" }} }}"#
        )
        .unwrap();

        let config = ConfigManager::with_path(file.path()).load_config().await.unwrap();
        assert_eq!(config.http.referer, "http://127.0.0.1:8080/home");
        assert_eq!(config.parsing.base_url, "http://127.0.0.1:8080");
    }

    #[tokio::test]
    async fn malformed_overlay_is_an_error() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, "{{ not json").unwrap();
        assert!(ConfigManager::with_path(file.path()).load_config().await.is_err());
    }
}
