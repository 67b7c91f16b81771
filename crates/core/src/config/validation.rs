//! Configuration validation rules.
//!
//! This module provides validation logic for `AppConfig` values
//! after they have been loaded from environment, files, or defaults.

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
    /// Returns `ConfigError::Invalid` if:
    /// - `cache_name` is empty or contains whitespace
    /// - `origin` is not a bare http(s) origin
    /// - a static asset or cacheable prefix does not start with `/`
    /// - `navigation_timeout_ms` or `timeout_ms` is outside 100ms..=5 minutes
    /// - `max_bytes` is 0 or exceeds 50MB
    /// - `user_agent` is empty
    ///
    /// Returns `ConfigError::Missing` if `static_assets` or `cacheable_paths` is empty.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.cache_name.is_empty() || self.cache_name.chars().any(char::is_whitespace) {
            return Err(ConfigError::Invalid {
                field: "cache_name".into(),
                reason: "must be a non-empty token without whitespace".into(),
            });
        }

        let origin = self.origin_url()?;
        match origin.scheme() {
            "http" | "https" => {}
            scheme => {
                return Err(ConfigError::Invalid { field: "origin".into(), reason: format!("unsupported scheme: {scheme}") });
            }
        }
        if origin.path() != "/" || origin.query().is_some() || origin.fragment().is_some() {
            return Err(ConfigError::Invalid {
                field: "origin".into(),
                reason: "must be scheme://host[:port] without path or query".into(),
            });
        }

        if self.static_assets.is_empty() {
            return Err(ConfigError::Missing {
                field: "static_assets".into(),
                hint: "list at least the root document \"/\"".into(),
            });
        }
        if let Some(bad) = self.static_assets.iter().find(|p| !p.starts_with('/')) {
            return Err(ConfigError::Invalid {
                field: "static_assets".into(),
                reason: format!("{bad:?} must be an absolute path starting with '/'"),
            });
        }

        if self.cacheable_paths.is_empty() {
            return Err(ConfigError::Missing {
                field: "cacheable_paths".into(),
                hint: "list the path prefixes eligible for write-through".into(),
            });
        }
        if let Some(bad) = self.cacheable_paths.iter().find(|p| !p.starts_with('/')) {
            return Err(ConfigError::Invalid {
                field: "cacheable_paths".into(),
                reason: format!("{bad:?} must start with '/'"),
            });
        }

        if let Some(nav) = self.navigation_timeout_ms {
            if nav < 100 {
                return Err(ConfigError::Invalid {
                    field: "navigation_timeout_ms".into(),
                    reason: "must be at least 100ms".into(),
                });
            }
            if nav > 300_000 {
                return Err(ConfigError::Invalid {
                    field: "navigation_timeout_ms".into(),
                    reason: "must not exceed 5 minutes (300000ms)".into(),
                });
            }
        }

        if self.timeout_ms < 100 {
            return Err(ConfigError::Invalid { field: "timeout_ms".into(), reason: "must be at least 100ms".into() });
        }
        if self.timeout_ms > 300_000 {
            return Err(ConfigError::Invalid {
                field: "timeout_ms".into(),
                reason: "must not exceed 5 minutes (300000ms)".into(),
            });
        }

        if self.max_bytes == 0 {
            return Err(ConfigError::Invalid { field: "max_bytes".into(), reason: "must be greater than 0".into() });
        }
        if self.max_bytes > 50 * 1024 * 1024 {
            return Err(ConfigError::Invalid { field: "max_bytes".into(), reason: "must not exceed 50MB".into() });
        }

        if self.user_agent.is_empty() {
            return Err(ConfigError::Invalid { field: "user_agent".into(), reason: "must not be empty".into() });
        }

        for asset in &self.static_assets {
            if !self.is_cacheable_path(asset) {
                tracing::warn!(
                    asset = %asset,
                    "static asset is precached but not covered by cacheable_paths; \
                     it will never be refreshed"
                );
            }
        }

        Ok(())
    }

    /// Whether `path` starts with one of the configured write-through prefixes.
    ///
    /// With `/` in the list every same-origin path qualifies.
    pub fn is_cacheable_path(&self, path: &str) -> bool {
        self.cacheable_paths
            .iter()
            .any(|prefix| path.starts_with(prefix.as_str()))
    }
}
