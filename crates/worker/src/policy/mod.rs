//! The three request policies.
//!
//! Each lives in its own file as an `impl ServiceWorker` block; the helpers
//! here are shared by them and by background tasks, which cannot borrow the
//! worker.

pub mod image;
pub mod navigation;
pub mod stale;

use uno_core::{CacheStore, Network, Request};

use crate::resolution::Resolution;

/// Look `request` up in generation `cache_name`.
///
/// A store failure is logged and treated as a miss so the request can still
/// be answered.
pub(crate) async fn lookup(store: &dyn CacheStore, cache_name: &str, request: &Request) -> Resolution {
    match store.match_request(cache_name, request).await {
        Ok(Some(response)) => {
            tracing::debug!(url = %request.url, cache = cache_name, "cache hit");
            Resolution::Found(response)
        }
        Ok(None) => {
            tracing::debug!(url = %request.url, cache = cache_name, "cache miss");
            Resolution::Absent
        }
        Err(err) => {
            tracing::warn!(url = %request.url, cache = cache_name, error = %err, "cache lookup failed");
            Resolution::Absent
        }
    }
}

/// Fetch `request` from the network.
pub(crate) async fn fetch(network: &dyn Network, request: &Request) -> Resolution {
    Resolution::from_fetch(network.fetch(request).await)
}
