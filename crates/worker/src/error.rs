//! Structured errors for the worker.

use uno_core::Error;
use uno_core::config::ConfigError;

use crate::lifecycle::WorkerState;

/// Errors surfaced to the host.
///
/// Runtime network failures never appear here for the caching policies; they
/// are converted to cached or synthetic responses. Only install, activation
/// and navigation without a cached shell can fail.
#[derive(Debug, thiserror::Error)]
pub enum WorkerError {
    /// A precache asset could not be fetched.
    #[error("INSTALL_FAILED: {path}: {source}")]
    Install { path: String, source: Error },

    /// A precache asset answered with a non-success status.
    #[error("INSTALL_FAILED: {path}: status {status}")]
    InstallStatus { path: String, status: u16 },

    /// Activation attempted before a completed install.
    #[error("NOT_INSTALLED: cannot activate from state {state:?}")]
    NotInstalled { state: WorkerState },

    /// The network failed and no app shell was cached.
    #[error("NAVIGATION_FAILED: {0}")]
    Navigation(#[source] Error),

    /// Cache store operation failed outside a request path.
    #[error(transparent)]
    Cache(#[from] Error),

    #[error("CONFIG_ERROR: {0}")]
    Config(#[from] ConfigError),
}
