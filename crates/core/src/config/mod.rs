//! Worker configuration with layered loading.
//!
//! The cache tags, precache list and image extensions are compile-time
//! constants; [`WorkerConfig::default`] is built from them. Hosts that want to
//! override them (the `uno-sw` binary does) load through figment:
//!
//! 1. Environment variables (UNO_SW_*)
//! 2. TOML config file (if UNO_SW_CONFIG_FILE set)
//! 3. Built-in defaults
//!
//! The worker library itself never reads the environment; it receives a
//! `WorkerConfig` at construction.

use std::path::PathBuf;
use std::time::Duration;

use figment::{
    Figment,
    providers::{Env, Format, Serialized, Toml},
};
use serde::{Deserialize, Serialize};
use url::Url;

mod validation;

pub use validation::ConfigError;

/// Tag of the current general-purpose generation. Bump to invalidate every
/// previously cached general asset on the next activation.
pub const CACHE_VERSION: &str = "uno-pwa-v2";

/// Tag of the current image generation.
pub const IMAGE_CACHE: &str = "uno-images-v1";

/// Paths fetched eagerly at install time, relative to the scope.
pub const PRECACHE_ASSETS: &[&str] = &[
    "./",
    "./index.html",
    "./manifest.webmanifest",
    "./icons/icon-192.png",
    "./icons/icon-512.png",
];

/// URL path suffixes treated as images when destination metadata is missing.
pub const IMAGE_EXTENSIONS: &[&str] = &["png", "jpg", "jpeg", "svg", "webp"];

/// Document served to navigations when the network is down.
pub const ROOT_DOCUMENT: &str = "index.html";

/// Worker configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WorkerConfig {
    /// Current general-purpose generation tag.
    #[serde(default = "default_cache_version")]
    pub cache_version: String,

    /// Current image generation tag.
    #[serde(default = "default_image_cache")]
    pub image_cache: String,

    /// Ordered precache list, resolved against `scope`.
    #[serde(default = "default_precache_assets")]
    pub precache_assets: Vec<String>,

    /// Image extension suffixes, matched case-sensitively.
    #[serde(default = "default_image_extensions")]
    pub image_extensions: Vec<String>,

    /// Navigation fallback document, resolved against `scope`.
    #[serde(default = "default_root_document")]
    pub root_document: String,

    /// Base URL the worker controls; relative paths resolve against it.
    ///
    /// Set via UNO_SW_SCOPE environment variable.
    #[serde(default = "default_scope")]
    pub scope: String,

    /// Path to SQLite cache database.
    ///
    /// Set via UNO_SW_DB_PATH environment variable.
    #[serde(default = "default_db_path")]
    pub db_path: PathBuf,

    /// User-Agent string for network requests.
    #[serde(default = "default_user_agent")]
    pub user_agent: String,

    /// Maximum bytes to fetch per request.
    #[serde(default = "default_max_bytes")]
    pub max_bytes: usize,

    /// HTTP request timeout in milliseconds.
    #[serde(default = "default_timeout_ms")]
    pub timeout_ms: u64,
}

fn default_cache_version() -> String {
    CACHE_VERSION.into()
}

fn default_image_cache() -> String {
    IMAGE_CACHE.into()
}

fn default_precache_assets() -> Vec<String> {
    PRECACHE_ASSETS.iter().map(|p| p.to_string()).collect()
}

fn default_image_extensions() -> Vec<String> {
    IMAGE_EXTENSIONS.iter().map(|e| e.to_string()).collect()
}

fn default_root_document() -> String {
    ROOT_DOCUMENT.into()
}

fn default_scope() -> String {
    "http://localhost:8080/".into()
}

fn default_db_path() -> PathBuf {
    PathBuf::from("./uno-sw-cache.sqlite")
}

fn default_user_agent() -> String {
    "uno-sw/0.1".into()
}

fn default_max_bytes() -> usize {
    20 * 1024 * 1024
}

fn default_timeout_ms() -> u64 {
    30_000
}

impl Default for WorkerConfig {
    fn default() -> Self {
        Self {
            cache_version: default_cache_version(),
            image_cache: default_image_cache(),
            precache_assets: default_precache_assets(),
            image_extensions: default_image_extensions(),
            root_document: default_root_document(),
            scope: default_scope(),
            db_path: default_db_path(),
            user_agent: default_user_agent(),
            max_bytes: default_max_bytes(),
            timeout_ms: default_timeout_ms(),
        }
    }
}

impl WorkerConfig {
    /// Timeout as Duration for use with reqwest/tokio.
    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }

    /// The parsed scope URL.
    pub fn scope_url(&self) -> Result<Url, ConfigError> {
        Url::parse(&self.scope).map_err(|e| ConfigError::Invalid { field: "scope".into(), reason: e.to_string() })
    }

    /// Resolve a scope-relative path such as `./index.html`.
    pub fn resolve(&self, path: &str) -> Result<Url, ConfigError> {
        self.scope_url()?
            .join(path)
            .map_err(|e| ConfigError::Invalid { field: "scope".into(), reason: format!("cannot resolve {path}: {e}") })
    }

    /// Generation names that survive activation.
    pub fn current_generations(&self) -> [&str; 2] {
        [self.cache_version.as_str(), self.image_cache.as_str()]
    }

    /// Load configuration from all sources with layered precedence.
    ///
    /// Priority (highest wins):
    /// 1. Environment variables prefixed with `UNO_SW_`
    /// 2. TOML file from `UNO_SW_CONFIG_FILE` (if set)
    /// 3. Built-in defaults via `Default::default()`
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if a source cannot be read or parsed, or if
    /// validation fails after loading.
    pub fn load() -> Result<Self, ConfigError> {
        let mut figment = Figment::from(Serialized::defaults(Self::default()));

        if let Ok(config_path) = std::env::var("UNO_SW_CONFIG_FILE") {
            figment = figment.merge(Toml::file(&config_path));
        }

        figment = figment.merge(
            Env::prefixed("UNO_SW_")
                .ignore(&["CONFIG_FILE"])
                .map(|key| key.as_str().to_lowercase().into())
                .split("__"),
        );

        let config: Self = figment.extract().map_err(|e| ConfigError::LoadFailed(e.to_string()))?;

        config.validate()?;

        Ok(config)
    }
}
