//! Application configuration with layered loading.
//!
//! This module provides configuration management using figment for layered
//! configuration loading from multiple sources:
//!
//! 1. Environment variables (SWCACHE_*)
//! 2. TOML config file (if SWCACHE_CONFIG_FILE set)
//! 3. Built-in defaults

use std::path::{Path, PathBuf};
use std::time::Duration;

use figment::{
    Figment,
    providers::{Env, Format, Serialized, Toml},
};
use serde::{Deserialize, Serialize};

mod validation;

pub use validation::ConfigError;

/// Application configuration with layered loading.
///
/// Loading precedence (highest wins):
/// 1. Environment variables (SWCACHE_*)
/// 2. TOML config file (if SWCACHE_CONFIG_FILE set)
/// 3. Built-in defaults
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    /// Cache generation identifier.
    ///
    /// Changing it invalidates every previously stored entry on the next activation.
    /// Set via SWCACHE_CACHE_NAME environment variable.
    #[serde(default = "default_cache_name")]
    pub cache_name: String,

    /// Origin of the hosting application; only same-origin requests are intercepted.
    ///
    /// Set via SWCACHE_ORIGIN environment variable.
    #[serde(default = "default_origin")]
    pub origin: String,

    /// Paths precached on install, in order.
    #[serde(default = "default_static_assets")]
    pub static_assets: Vec<String>,

    /// Path prefixes eligible for write-through caching.
    ///
    /// Matched with `starts_with`, so the default `/` covers every path.
    #[serde(default = "default_cacheable_paths")]
    pub cacheable_paths: Vec<String>,

    /// Network timeout for page navigations, in milliseconds.
    ///
    /// `None` disables the navigation policy; navigations then use the general one.
    /// Set via SWCACHE_NAVIGATION_TIMEOUT_MS environment variable.
    #[serde(default = "default_navigation_timeout_ms")]
    pub navigation_timeout_ms: Option<u64>,

    /// Activate a freshly installed generation without waiting for open clients to close.
    #[serde(default = "default_true")]
    pub skip_waiting: bool,

    /// Take control of already open clients on activation.
    #[serde(default = "default_true")]
    pub clients_claim: bool,

    /// Path to SQLite cache database.
    ///
    /// Set via SWCACHE_DB_PATH environment variable.
    #[serde(default = "default_db_path")]
    pub db_path: PathBuf,

    /// User-Agent string for HTTP requests.
    ///
    /// Set via SWCACHE_USER_AGENT environment variable.
    #[serde(default = "default_user_agent")]
    pub user_agent: String,

    /// HTTP request timeout in milliseconds.
    ///
    /// Set via SWCACHE_TIMEOUT_MS environment variable.
    #[serde(default = "default_timeout_ms")]
    pub timeout_ms: u64,

    /// Maximum bytes to fetch per request.
    ///
    /// Set via SWCACHE_MAX_BYTES environment variable.
    #[serde(default = "default_max_bytes")]
    pub max_bytes: usize,
}

fn default_cache_name() -> String {
    "widgets-app-v1".into()
}

fn default_origin() -> String {
    "http://localhost:3000".into()
}

fn default_static_assets() -> Vec<String> {
    vec!["/".into(), "/icon-192x192.png".into(), "/icon-512x512.png".into()]
}

fn default_cacheable_paths() -> Vec<String> {
    vec!["/".into(), "/widgets".into(), "/icon-".into(), "/_next/static/".into()]
}

fn default_navigation_timeout_ms() -> Option<u64> {
    Some(10_000)
}

fn default_db_path() -> PathBuf {
    PathBuf::from("./swcache.sqlite")
}

fn default_user_agent() -> String {
    "swcache/0.1".into()
}

fn default_timeout_ms() -> u64 {
    20_000
}

fn default_max_bytes() -> usize {
    5_242_880 // 5MB
}

fn default_true() -> bool {
    true
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            cache_name: default_cache_name(),
            origin: default_origin(),
            static_assets: default_static_assets(),
            cacheable_paths: default_cacheable_paths(),
            navigation_timeout_ms: default_navigation_timeout_ms(),
            skip_waiting: true,
            clients_claim: true,
            db_path: default_db_path(),
            user_agent: default_user_agent(),
            timeout_ms: default_timeout_ms(),
            max_bytes: default_max_bytes(),
        }
    }
}

impl AppConfig {
    /// Timeout as Duration for use with reqwest/tokio.
    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }

    /// Navigation timeout, if the navigation policy is enabled.
    pub fn navigation_timeout(&self) -> Option<Duration> {
        self.navigation_timeout_ms.map(Duration::from_millis)
    }

    /// Parsed application origin.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::Invalid` if `origin` is not an absolute http(s) URL.
    pub fn origin_url(&self) -> Result<url::Url, ConfigError> {
        url::Url::parse(&self.origin)
            .map_err(|e| ConfigError::Invalid { field: "origin".into(), reason: e.to_string() })
    }

    /// Load configuration from all sources with layered precedence.
    ///
    /// Priority (highest wins):
    /// 1. Environment variables prefixed with `SWCACHE_`
    /// 2. TOML file from `SWCACHE_CONFIG_FILE` (if set)
    /// 3. Built-in defaults via `Default::default()`
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if:
    /// - Configuration file cannot be read
    /// - Environment variables cannot be parsed
    /// - Validation fails after loading
    pub fn load() -> Result<Self, ConfigError> {
        let config_file = std::env::var_os("SWCACHE_CONFIG_FILE").map(PathBuf::from);
        Self::load_from(config_file.as_deref())
    }

    /// Load configuration with an explicit TOML file instead of `SWCACHE_CONFIG_FILE`.
    ///
    /// Environment variables still override values from the file.
    ///
    /// # Errors
    ///
    /// Same as [`AppConfig::load`].
    pub fn load_from(config_file: Option<&Path>) -> Result<Self, ConfigError> {
        let mut figment = Figment::from(Serialized::defaults(Self::default()));

        if let Some(config_path) = config_file {
            figment = figment.merge(Toml::file(config_path));
        }

        figment = figment.merge(
            Env::prefixed("SWCACHE_")
                .ignore(&["config_file"])
                .map(|key| key.as_str().to_lowercase().into())
                .split("__"),
        );

        let config: Self = figment.extract().map_err(|e| ConfigError::LoadFailed(e.to_string()))?;

        config.validate()?;

        Ok(config)
    }
}
