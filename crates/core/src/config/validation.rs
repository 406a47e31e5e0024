//! Configuration validation rules.
//!
//! This module provides validation logic for `WorkerConfig` values
//! after they have been loaded from environment, files, or defaults.

use crate::config::WorkerConfig;
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

impl ConfigError {
    fn invalid(field: &str, reason: impl Into<String>) -> Self {
        Self::Invalid { field: field.into(), reason: reason.into() }
    }
}

impl WorkerConfig {
    /// Validate configuration values after loading.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::Missing` for an empty generation tag and
    /// `ConfigError::Invalid` if:
    /// - both generation tags are equal
    /// - `scope` is not an absolute http(s) URL
    /// - an image extension is empty or not alphanumeric
    /// - `max_bytes` is 0 or exceeds 100MB
    /// - `timeout_ms` is less than 100ms or exceeds 5 minutes
    /// - `user_agent` is empty
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.cache_version.trim().is_empty() {
            return Err(ConfigError::Missing {
                field: "cache_version".into(),
                hint: "Set UNO_SW_CACHE_VERSION or leave unset for the built-in tag".into(),
            });
        }
        if self.image_cache.trim().is_empty() {
            return Err(ConfigError::Missing {
                field: "image_cache".into(),
                hint: "Set UNO_SW_IMAGE_CACHE or leave unset for the built-in tag".into(),
            });
        }
        if self.cache_version == self.image_cache {
            return Err(ConfigError::invalid("image_cache", "must differ from cache_version"));
        }

        let scope = self.scope_url()?;
        if !matches!(scope.scheme(), "http" | "https") {
            return Err(ConfigError::invalid("scope", format!("unsupported scheme: {}", scope.scheme())));
        }

        if self.image_extensions.is_empty() {
            return Err(ConfigError::invalid("image_extensions", "must not be empty"));
        }
        if let Some(bad) = self
            .image_extensions
            .iter()
            .find(|ext| ext.is_empty() || !ext.chars().all(|c| c.is_ascii_alphanumeric()))
        {
            return Err(ConfigError::invalid("image_extensions", format!("invalid extension: {bad:?}")));
        }

        if self.root_document.trim().is_empty() {
            return Err(ConfigError::invalid("root_document", "must not be empty"));
        }

        if self.max_bytes == 0 {
            return Err(ConfigError::invalid("max_bytes", "must be greater than 0"));
        }
        if self.max_bytes > 100 * 1024 * 1024 {
            return Err(ConfigError::invalid("max_bytes", "must not exceed 100MB"));
        }

        if self.timeout_ms < 100 {
            return Err(ConfigError::invalid("timeout_ms", "must be at least 100ms"));
        }
        if self.timeout_ms > 300_000 {
            return Err(ConfigError::invalid("timeout_ms", "must not exceed 5 minutes (300000ms)"));
        }

        if self.user_agent.is_empty() {
            return Err(ConfigError::invalid("user_agent", "must not be empty"));
        }

        if self.precache_assets.is_empty() {
            tracing::warn!("precache_assets is empty; navigations will have no offline fallback");
        }

        Ok(())
    }
}
