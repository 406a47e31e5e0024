//! Cache-first policy for images, against the image generation.
//!
//! A stored image is served forever (until its generation is rotated away)
//! with no network traffic at all.

use uno_core::{Request, Response};

use super::{fetch, lookup};
use crate::resolution::{Resolution, is_cacheable};
use crate::worker::ServiceWorker;

impl ServiceWorker {
    pub(crate) async fn cache_first_image(&self, request: &Request) -> Response {
        let cache_name = &self.config.image_cache;
        if let Resolution::Found(cached) = lookup(self.store.as_ref(), cache_name, request).await {
            return cached;
        }

        match fetch(self.network.as_ref(), request).await {
            Resolution::Found(response) => {
                if is_cacheable(request, &response)
                    && let Err(err) = self.store.put(cache_name, request, &response).await
                {
                    tracing::warn!(url = %request.url, cache = %cache_name, error = %err, "image cache write failed");
                }
                response
            }
            other => other.into_response().unwrap_or_else(Response::service_unavailable),
        }
    }
}
