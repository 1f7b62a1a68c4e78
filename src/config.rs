//! Configuration file parser for hotfeed.toml.
//!
//! The config file is optional — a missing or empty file yields
//! `Config::default()`, which carries the aggregator's eight hot-entry
//! category feeds. Configuration is loaded once at startup and passed into
//! the harvester explicitly; nothing reads it as ambient state.

use serde::Deserialize;
use std::path::Path;
use std::time::Duration;
use thiserror::Error;

// ============================================================================
// Error Types
// ============================================================================

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    Io(#[from] std::io::Error),

    #[error("Invalid TOML in config file: {0}")]
    Parse(#[from] toml::de::Error),
}

// ============================================================================
// Configuration Structs
// ============================================================================

/// One harvest source: a display name (must match a seeded category row for
/// the article/category link to be created) and its hot-entry feed URL.
#[derive(Debug, Clone, Deserialize)]
pub struct CategorySource {
    pub name: String,
    pub url: String,
}

/// Top-level application configuration.
///
/// All fields use `#[serde(default)]` so any subset of keys can be specified.
/// Missing keys fall back to `Default::default()`.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Path to the SQLite database file.
    pub database_path: String,

    /// User-Agent header sent on every outbound request.
    pub user_agent: String,

    /// Base URL of the bookmark-count endpoint; the percent-encoded article
    /// URL is appended directly.
    pub bookmark_api: String,

    /// Per-request timeout in seconds for feed and page fetches.
    pub request_timeout_secs: u64,

    /// Fixed sleep after each processed article (outbound-call throttle).
    pub article_delay_ms: u64,

    /// Fixed sleep after each category.
    pub category_delay_ms: u64,

    /// Categories to harvest, in order.
    pub categories: Vec<CategorySource>,
}

impl Default for Config {
    fn default() -> Self {
        let categories = [
            ("総合", "https://b.hatena.ne.jp/hotentry.rss"),
            ("テクノロジー", "https://b.hatena.ne.jp/hotentry/it.rss"),
            ("エンタメ", "https://b.hatena.ne.jp/hotentry/entertainment.rss"),
            ("ビジネス", "https://b.hatena.ne.jp/hotentry/economics.rss"),
            ("スポーツ", "https://b.hatena.ne.jp/hotentry/game.rss"),
            ("科学", "https://b.hatena.ne.jp/hotentry/knowledge.rss"),
            ("健康", "https://b.hatena.ne.jp/hotentry/life.rss"),
            ("ライフスタイル", "https://b.hatena.ne.jp/hotentry/guide.rss"),
        ]
        .into_iter()
        .map(|(name, url)| CategorySource {
            name: name.to_string(),
            url: url.to_string(),
        })
        .collect();

        Self {
            database_path: "hotfeed.db".to_string(),
            user_agent:
                "Mozilla/5.0 (compatible; MyNewsAggregator/1.0; +https://mynewsaggregator.example.com)"
                    .to_string(),
            bookmark_api: "https://b.hatena.ne.jp/entry/json/".to_string(),
            request_timeout_secs: 10,
            article_delay_ms: 500,
            category_delay_ms: 2000,
            categories,
        }
    }
}

impl Config {
    /// Load configuration from a TOML file.
    ///
    /// - Missing file → `Ok(Config::default())`
    /// - Empty file → `Ok(Config::default())`
    /// - Invalid TOML → `Err(ConfigError::Parse)` with line number info
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let content = match std::fs::read_to_string(path) {
            Ok(c) => c,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                tracing::debug!(path = %path.display(), "No config file found, using defaults");
                return Ok(Self::default());
            }
            Err(e) => return Err(ConfigError::Io(e)),
        };

        if content.trim().is_empty() {
            tracing::debug!(path = %path.display(), "Config file is empty, using defaults");
            return Ok(Self::default());
        }

        let config: Config = toml::from_str(&content)?;
        tracing::info!(
            path = %path.display(),
            categories = config.categories.len(),
            "Loaded configuration"
        );
        Ok(config)
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }

    pub fn article_delay(&self) -> Duration {
        Duration::from_millis(self.article_delay_ms)
    }

    pub fn category_delay(&self) -> Duration {
        Duration::from_millis(self.category_delay_ms)
    }
}

// ============================================================================
// Tests
// ============================================================================
