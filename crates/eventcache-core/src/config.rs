//! Application configuration management.
//!
//! Configuration is stored at `~/.config/eventcache/config.json` and can be
//! overridden per run through environment variables:
//!
//! - `EVENTCACHE_API_URL`: backend base URL
//! - `EVENTCACHE_STALE_MS`: default stale time in milliseconds
//! - `EVENTCACHE_GC_MS`: retention of unobserved entries in milliseconds

use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::Result;
use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::api::client::{DEFAULT_BASE_URL, REQUEST_TIMEOUT_SECS};
use crate::query::{QueryDefaults, DEFAULT_GC_TIME, DEFAULT_STALE_TIME};

/// Application name used for config/cache directory paths
const APP_NAME: &str = "eventcache";

/// Config file name
const CONFIG_FILE: &str = "config.json";

pub const ENV_API_URL: &str = "EVENTCACHE_API_URL";
pub const ENV_STALE_MS: &str = "EVENTCACHE_STALE_MS";
pub const ENV_GC_MS: &str = "EVENTCACHE_GC_MS";

#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq, Eq)]
pub struct Config {
    pub api_base_url: Option<String>,
    pub stale_time_ms: Option<u64>,
    pub gc_time_ms: Option<u64>,
    pub request_timeout_secs: Option<u64>,
    /// Persist the cache between runs (on unless set to false).
    pub persist_cache: Option<bool>,
}

impl Config {
    pub fn load() -> Result<Self> {
        Self::load_from(&Self::config_path()?)
    }

    /// Read a config file; a missing file yields the defaults.
    pub fn load_from(path: &Path) -> Result<Self> {
        if path.exists() {
            let contents = std::fs::read_to_string(path)?;
            Ok(serde_json::from_str(&contents)?)
        } else {
            Ok(Self::default())
        }
    }

    fn config_path() -> Result<PathBuf> {
        let config_dir = dirs::config_dir()
            .ok_or_else(|| anyhow::anyhow!("Could not find config directory"))?;
        Ok(config_dir.join(APP_NAME).join(CONFIG_FILE))
    }

    pub fn cache_dir(&self) -> Result<PathBuf> {
        let cache_dir = dirs::cache_dir()
            .ok_or_else(|| anyhow::anyhow!("Could not find cache directory"))?;
        Ok(cache_dir.join(APP_NAME))
    }

    /// Apply `EVENTCACHE_*` overrides from the process environment.
    pub fn apply_env(&mut self) {
        self.apply_overrides(|name| std::env::var(name).ok());
    }

    pub fn apply_overrides(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        if let Some(url) = lookup(ENV_API_URL).filter(|url| !url.trim().is_empty()) {
            self.api_base_url = Some(url);
        }
        if let Some(ms) = Self::parse_millis(ENV_STALE_MS, lookup(ENV_STALE_MS)) {
            self.stale_time_ms = Some(ms);
        }
        if let Some(ms) = Self::parse_millis(ENV_GC_MS, lookup(ENV_GC_MS)) {
            self.gc_time_ms = Some(ms);
        }
    }

    fn parse_millis(name: &str, value: Option<String>) -> Option<u64> {
        let value = value?;
        match value.trim().parse() {
            Ok(ms) => Some(ms),
            Err(_) => {
                warn!(var = name, value = %value, "Ignoring non-numeric override");
                None
            }
        }
    }

    pub fn base_url(&self) -> &str {
        self.api_base_url.as_deref().unwrap_or(DEFAULT_BASE_URL)
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs.unwrap_or(REQUEST_TIMEOUT_SECS))
    }

    pub fn persist_cache(&self) -> bool {
        self.persist_cache.unwrap_or(true)
    }

    pub fn query_defaults(&self) -> QueryDefaults {
        QueryDefaults {
            stale_time: self
                .stale_time_ms
                .map(Duration::from_millis)
                .unwrap_or(DEFAULT_STALE_TIME),
            gc_time: self
                .gc_time_ms
                .map(Duration::from_millis)
                .unwrap_or(DEFAULT_GC_TIME),
        }
    }
}
