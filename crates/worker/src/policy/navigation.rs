//! Navigation policy: network first, cached app shell when offline.
//!
//! Never writes to the cache.

use uno_core::{Request, Response};

use super::lookup;
use crate::error::WorkerError;
use crate::resolution::Resolution;
use crate::worker::ServiceWorker;

impl ServiceWorker {
    pub(crate) async fn navigate(&self, request: &Request) -> Result<Response, WorkerError> {
        let err = match self.network.fetch(request).await {
            Ok(response) => return Ok(response),
            Err(err) => err,
        };

        tracing::debug!(url = %request.url, error = %err, "navigation offline, trying cached shell");
        let shell = Request::get(self.root_document.clone());
        match lookup(self.store.as_ref(), &self.config.cache_version, &shell).await {
            Resolution::Found(response) => Ok(response),
            _ => Err(WorkerError::Navigation(err)),
        }
    }
}
