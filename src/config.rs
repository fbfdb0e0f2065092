//! Configuration file parser for `trackfeed.toml`.
//!
//! The config file is optional. A missing file yields `Config::default()`,
//! which points at the default catalog and writes `tracks_feed.xml` in the
//! working directory. Unknown keys are ignored by serde, though we log a
//! warning when the file contains potential typos.
use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::time::Duration;
use thiserror::Error;

use crate::catalog::{FetchOptions, MAX_PAGE_BYTES};
use crate::feed::{Channel, SiteUrls};

// ============================================================================
// Error Types
// ============================================================================

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    Io(#[from] std::io::Error),

    #[error("Invalid TOML in config file: {0}")]
    Parse(#[from] toml::de::Error),

    /// Config file exceeds [`Config::MAX_FILE_SIZE`].
    #[error("Config file too large: {0}")]
    TooLarge(String),
}

// ============================================================================
// Defaults
// ============================================================================

pub const DEFAULT_ENDPOINT: &str = "https://music.example.com/api/tracks";
pub const DEFAULT_SITE_URL: &str = "https://music.example.com";
pub const DEFAULT_ASSET_HOST: &str = "https://cdn.music.example.com";
pub const DEFAULT_FEED_URL: &str = "https://music.example.com/feeds/tracks.xml";
pub const DEFAULT_OUTPUT_PATH: &str = "tracks_feed.xml";
pub const DEFAULT_PAGE_SIZE: usize = 50;
pub const DEFAULT_CHANNEL_TITLE: &str = "Music Library - Latest Tracks";
pub const DEFAULT_CHANNEL_DESCRIPTION: &str =
    "Newest tracks from the music library catalog, updated on every build.";

// ============================================================================
// Configuration Structs
// ============================================================================

/// Top-level converter configuration.
///
/// All fields use `#[serde(default)]` so any subset of keys can be specified.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Catalog endpoint queried with `?limit=<page_size>&page=<n>`.
    pub endpoint: String,

    /// Records requested per page. A page shorter than this ends pagination.
    pub page_size: usize,

    /// Upper bound on pages fetched. `None` = until the catalog runs out.
    pub max_pages: Option<u32>,

    /// Per-request timeout. `None` = wait indefinitely.
    pub request_timeout_secs: Option<u64>,

    /// Public site that track links and guids point into.
    pub site_url: String,

    /// Origin prefixed onto relative image paths.
    pub asset_host: String,

    /// Where the generated feed is published (the `atom:link rel="self"`).
    pub feed_url: String,

    /// Output file for the generated feed.
    pub output_path: PathBuf,

    pub channel_title: String,
    pub channel_description: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            endpoint: DEFAULT_ENDPOINT.to_string(),
            page_size: DEFAULT_PAGE_SIZE,
            max_pages: None,
            request_timeout_secs: None,
            site_url: DEFAULT_SITE_URL.to_string(),
            asset_host: DEFAULT_ASSET_HOST.to_string(),
            feed_url: DEFAULT_FEED_URL.to_string(),
            output_path: PathBuf::from(DEFAULT_OUTPUT_PATH),
            channel_title: DEFAULT_CHANNEL_TITLE.to_string(),
            channel_description: DEFAULT_CHANNEL_DESCRIPTION.to_string(),
        }
    }
}

impl Config {
    /// Maximum config file size (1 MiB).
    pub const MAX_FILE_SIZE: u64 = 1_048_576;

    const KNOWN_KEYS: [&'static str; 10] = [
        "endpoint",
        "page_size",
        "max_pages",
        "request_timeout_secs",
        "site_url",
        "asset_host",
        "feed_url",
        "output_path",
        "channel_title",
        "channel_description",
    ];

    /// Load configuration from a TOML file.
    ///
    /// - Missing file → `Ok(Config::default())`
    /// - Empty file → `Ok(Config::default())`
    /// - Invalid TOML → `Err(ConfigError::Parse)` with line number info
    /// - Unknown keys → accepted, logged as warning
    /// - `page_size = 0` → coerced to 1, logged as warning
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        match std::fs::metadata(path) {
            Ok(meta) if meta.len() > Self::MAX_FILE_SIZE => {
                return Err(ConfigError::TooLarge(format!(
                    "Config file is {} bytes (max {} bytes)",
                    meta.len(),
                    Self::MAX_FILE_SIZE
                )));
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                tracing::debug!(path = %path.display(), "No config file found, using defaults");
                return Ok(Self::default());
            }
            Err(e) => return Err(ConfigError::Io(e)),
            Ok(_) => {}
        }

        let content = match std::fs::read_to_string(path) {
            Ok(c) => c,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                // Race condition: file deleted between metadata and read
                tracing::debug!(path = %path.display(), "Config file disappeared, using defaults");
                return Ok(Self::default());
            }
            Err(e) => return Err(ConfigError::Io(e)),
        };

        if content.trim().is_empty() {
            tracing::debug!(path = %path.display(), "Config file is empty, using defaults");
            return Ok(Self::default());
        }

        if let Ok(raw) = content.parse::<toml::Table>() {
            for key in raw.keys() {
                if !Self::KNOWN_KEYS.contains(&key.as_str()) {
                    tracing::warn!(key = %key, "Unknown key in config file, ignoring");
                }
            }
        }

        let mut config: Config = toml::from_str(&content)?;
        if config.page_size == 0 {
            tracing::warn!("page_size = 0 would never fetch anything, using 1");
            config.page_size = 1;
        }

        tracing::info!(
            path = %path.display(),
            endpoint = %config.endpoint,
            page_size = config.page_size,
            "Loaded configuration"
        );
        Ok(config)
    }

    /// Pagination settings for the catalog fetch.
    pub fn fetch_options(&self) -> FetchOptions {
        FetchOptions {
            endpoint: self.endpoint.clone(),
            page_size: self.page_size,
            max_pages: self.max_pages,
            timeout: self.request_timeout_secs.map(Duration::from_secs),
            max_page_bytes: MAX_PAGE_BYTES,
        }
    }

    /// Channel metadata for the generated feed.
    pub fn channel(&self) -> Channel {
        Channel {
            title: self.channel_title.clone(),
            description: self.channel_description.clone(),
            feed_url: self.feed_url.clone(),
            urls: SiteUrls::new(self.site_url.clone(), self.asset_host.clone()),
        }
    }
}

// ============================================================================
// Tests
// ============================================================================
