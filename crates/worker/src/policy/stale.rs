//! Stale-while-revalidate against the general generation.
//!
//! The network fetch starts before the cache lookup and runs as a detached
//! task. A cache hit is returned without waiting for it; a miss waits for the
//! network and falls back to a synthetic 503.

use std::sync::Arc;

use tokio::sync::oneshot;
use uno_core::{CacheStore, Error, Network, Request, Response};

use super::lookup;
use crate::resolution::{Resolution, is_cacheable};
use crate::worker::ServiceWorker;

impl ServiceWorker {
    pub(crate) async fn stale_while_revalidate(&self, request: &Request) -> Response {
        let (tx, rx) = oneshot::channel();
        self.background.spawn(
            "revalidate",
            revalidate(
                Arc::clone(&self.store),
                Arc::clone(&self.network),
                self.config.cache_version.clone(),
                request.clone(),
                tx,
            ),
        );

        if let Resolution::Found(cached) = lookup(self.store.as_ref(), &self.config.cache_version, request).await {
            return cached;
        }

        let fresh = rx
            .await
            .unwrap_or_else(|_| Resolution::NetworkError(Error::Network("revalidation task ended early".into())));
        fresh.into_response().unwrap_or_else(Response::service_unavailable)
    }
}

/// Fetch `request` and hand the outcome to whoever is still listening, then
/// store an eligible response. The store happens after the hand-off so it
/// never delays the caller.
async fn revalidate(
    store: Arc<dyn CacheStore>, network: Arc<dyn Network>, cache_name: String, request: Request,
    tx: oneshot::Sender<Resolution>,
) -> Result<(), Error> {
    let response = match network.fetch(&request).await {
        Ok(response) => response,
        Err(err) => {
            tracing::debug!(url = %request.url, error = %err, "revalidation fetch failed");
            // Nobody listening means the caller was served from cache.
            let _ = tx.send(Resolution::NetworkError(err));
            return Ok(());
        }
    };

    let copy = is_cacheable(&request, &response).then(|| response.clone());
    let _ = tx.send(Resolution::Found(response));

    if let Some(copy) = copy {
        store.put(&cache_name, &request, &copy).await?;
        tracing::debug!(url = %request.url, cache = %cache_name, "revalidated");
    }
    Ok(())
}
