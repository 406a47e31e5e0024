//! The worker instance and its per-request dispatch.

use std::sync::Arc;

use tokio::sync::watch;
use url::Url;
use uno_core::config::ConfigError;
use uno_core::{CacheStore, Network, Request, Response, WorkerConfig};

use crate::background::Background;
use crate::error::WorkerError;
use crate::lifecycle::{LoggingRegistration, Registration, WorkerState};
use crate::router::{ImageMatcher, Route, classify};

/// One installed version of the offline cache worker.
///
/// Holds no per-request state: concurrent calls to [`handle_fetch`] share only
/// the cache store.
///
/// [`handle_fetch`]: ServiceWorker::handle_fetch
pub struct ServiceWorker {
    pub(crate) config: Arc<WorkerConfig>,
    pub(crate) images: ImageMatcher,
    pub(crate) root_document: Url,
    pub(crate) store: Arc<dyn CacheStore>,
    pub(crate) network: Arc<dyn Network>,
    pub(crate) registration: Arc<dyn Registration>,
    pub(crate) state: watch::Sender<WorkerState>,
    pub(crate) background: Background,
}

impl ServiceWorker {
    /// Build a worker from a validated configuration and its two collaborators.
    pub fn new(
        config: WorkerConfig, store: Arc<dyn CacheStore>, network: Arc<dyn Network>,
    ) -> Result<Self, WorkerError> {
        config.validate()?;

        let images = ImageMatcher::new(&config.image_extensions)
            .map_err(|e| ConfigError::Invalid { field: "image_extensions".into(), reason: e.to_string() })?;
        let root_document = config.resolve(&config.root_document)?;
        let (state, _) = watch::channel(WorkerState::Parsed);

        Ok(Self {
            config: Arc::new(config),
            images,
            root_document,
            store,
            network,
            registration: Arc::new(LoggingRegistration),
            state,
            background: Background::default(),
        })
    }

    /// Replace the host registration that receives lifecycle signals.
    pub fn with_registration(mut self, registration: Arc<dyn Registration>) -> Self {
        self.registration = registration;
        self
    }

    pub fn config(&self) -> &WorkerConfig {
        &self.config
    }

    /// Current lifecycle state.
    pub fn state(&self) -> WorkerState {
        *self.state.borrow()
    }

    /// Watch lifecycle transitions.
    pub fn subscribe(&self) -> watch::Receiver<WorkerState> {
        self.state.subscribe()
    }

    /// Wait for in-flight background refreshes to finish.
    ///
    /// Never needed for correctness; responses do not depend on it.
    pub async fn settle(&self) {
        self.background.settle().await;
    }

    /// Which policy would answer `request`.
    pub fn route(&self, request: &Request) -> Route {
        classify(request, &self.images)
    }

    /// Answer an intercepted request.
    ///
    /// Image and stale-while-revalidate requests always produce a response.
    /// A navigation fails only when the network is down and no app shell was
    /// ever cached.
    pub async fn handle_fetch(&self, request: &Request) -> Result<Response, WorkerError> {
        let route = self.route(request);
        tracing::debug!(method = %request.method, url = %request.url, route = route.as_str(), "intercepted");

        match route {
            Route::Navigation => self.navigate(request).await,
            Route::Image => Ok(self.cache_first_image(request).await),
            Route::StaleWhileRevalidate => Ok(self.stale_while_revalidate(request).await),
        }
    }
}
