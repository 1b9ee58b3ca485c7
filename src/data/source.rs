//! Fetch and clock collaborators
//!
//! The scrapers never touch the network or the system clock directly; they
//! are handed page bodies and a "now" instant by the callers in
//! `extractor` and `batch`.

use super::scrapers::with_retry;
use crate::{DugoutError, Result, SourceConfig};
use chrono::{DateTime, Utc};
use chrono_tz::Tz;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Anything that can return the body of a page by URL
pub trait PageSource: Send + Sync {
    fn fetch_page(&self, url: &str) -> Result<String>;
}

/// Blocking HTTP page source with an optional on-disk cache
pub struct HttpSource {
    client: reqwest::blocking::Client,
    retries: u32,
    /// Optional cache directory for offline HTML files
    cache_dir: Option<PathBuf>,
    /// If true, only use cache (no network requests)
    offline_only: bool,
}

impl HttpSource {
    pub fn new(user_agent: &str, timeout: Duration) -> Result<Self> {
        let client = reqwest::blocking::Client::builder()
            .user_agent(user_agent)
            .timeout(timeout)
            .build()
            .map_err(|e| DugoutError::Config(format!("Failed to create HTTP client: {}", e)))?;

        Ok(HttpSource {
            client,
            retries: 1,
            cache_dir: None,
            offline_only: false,
        })
    }

    pub fn from_config(config: &SourceConfig) -> Result<Self> {
        let mut source = Self::new(&config.user_agent, Duration::from_secs(config.timeout_secs))?
            .with_retries(config.retries)
            .offline_only(config.offline);
        if let Some(dir) = &config.cache_dir {
            source = source.with_cache(dir);
        }
        Ok(source)
    }

    /// Number of attempts per page before giving up
    pub fn with_retries(mut self, retries: u32) -> Self {
        self.retries = retries.max(1);
        self
    }

    /// Create source with a cache directory
    pub fn with_cache<P: AsRef<Path>>(mut self, cache_dir: P) -> Self {
        self.cache_dir = Some(cache_dir.as_ref().to_path_buf());
        self
    }

    /// Set offline-only mode (no network requests, cache must exist)
    pub fn offline_only(mut self, offline: bool) -> Self {
        self.offline_only = offline;
        self
    }

    /// Get the cache file path for a URL
    fn cache_path(&self, url: &str) -> Option<PathBuf> {
        self.cache_dir.as_ref().map(|dir| dir.join(cache_file_name(url)))
    }

    fn load_from_cache(&self, url: &str) -> Option<String> {
        let path = self.cache_path(url)?;
        if path.exists() {
            log::debug!("Loading from cache: {}", path.display());
            std::fs::read_to_string(&path).ok()
        } else {
            None
        }
    }

    fn save_to_cache(&self, url: &str, body: &str) -> Result<()> {
        if let Some(path) = self.cache_path(url) {
            if let Some(parent) = path.parent() {
                std::fs::create_dir_all(parent)?;
            }
            std::fs::write(&path, body)?;
            log::debug!("Saved to cache: {}", path.display());
        }
        Ok(())
    }

    fn download(&self, url: &str) -> Result<String> {
        let unavailable = |message: String| DugoutError::SourceUnavailable {
            url: url.to_string(),
            message,
        };

        let response = self
            .client
            .get(url)
            .send()
            .map_err(|e| unavailable(e.to_string()))?;

        if !response.status().is_success() {
            return Err(unavailable(format!("HTTP {}", response.status())));
        }

        response.text().map_err(|e| unavailable(e.to_string()))
    }
}

impl PageSource for HttpSource {
    fn fetch_page(&self, url: &str) -> Result<String> {
        if let Some(body) = self.load_from_cache(url) {
            return Ok(body);
        }

        if self.offline_only {
            return Err(DugoutError::SourceUnavailable {
                url: url.to_string(),
                message: "no cached copy (offline mode)".to_string(),
            });
        }

        log::debug!("Fetching {}", url);
        let body = with_retry(|| self.download(url), self.retries)?;

        if let Err(e) = self.save_to_cache(url, &body) {
            log::warn!("Failed to cache {}: {}", url, e);
        }

        Ok(body)
    }
}

/// Create a safe filename from a URL
fn cache_file_name(url: &str) -> String {
    url.replace("https://", "")
        .replace("http://", "")
        .replace(['/', '?', '&', '='], "_")
        + ".html"
}

/// Source of the "now" instant used to split played from unplayed games
pub trait Clock: Send + Sync {
    fn now(&self, zone: Tz) -> DateTime<Tz>;
}

/// Wall clock
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self, zone: Tz) -> DateTime<Tz> {
        Utc::now().with_timezone(&zone)
    }
}

/// Clock pinned to a single instant
#[derive(Debug, Clone, Copy)]
pub struct FixedClock(DateTime<Utc>);

impl FixedClock {
    pub fn new(instant: DateTime<Utc>) -> Self {
        FixedClock(instant)
    }

    /// Parse an RFC 3339 timestamp such as `2025-06-01T12:00:00-04:00`
    pub fn parse_rfc3339(s: &str) -> Result<Self> {
        DateTime::parse_from_rfc3339(s)
            .map(|dt| FixedClock(dt.with_timezone(&Utc)))
            .map_err(|e| DugoutError::Parse(format!("Invalid timestamp {}: {}", s, e)))
    }
}

impl Clock for FixedClock {
    fn now(&self, zone: Tz) -> DateTime<Tz> {
        self.0.with_timezone(&zone)
    }
}
