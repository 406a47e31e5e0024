//! Install and activate.
//!
//! Install precaches the app shell into the general generation; activate
//! deletes every generation whose tag is no longer current. Both report to the
//! host through [`Registration`].

use async_trait::async_trait;
use futures_util::future::{try_join, try_join_all};
use uno_core::{Request, Response};

use crate::error::WorkerError;
use crate::worker::ServiceWorker;

/// Lifecycle position of a worker instance.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WorkerState {
    Parsed,
    Installing,
    Installed,
    Activating,
    Activated,
    /// Install failed; the previous version keeps serving.
    Redundant,
}

/// Host-side signals emitted during the lifecycle.
#[async_trait]
pub trait Registration: Send + Sync {
    /// Replace any waiting older instance now instead of when its consumers
    /// disconnect.
    async fn skip_waiting(&self);

    /// Start controlling every already-open consumer.
    async fn claim_clients(&self);
}

/// Registration that only records the signals in the log.
#[derive(Debug, Default, Clone, Copy)]
pub struct LoggingRegistration;

#[async_trait]
impl Registration for LoggingRegistration {
    async fn skip_waiting(&self) {
        tracing::info!("skip waiting requested");
    }

    async fn claim_clients(&self) {
        tracing::info!("claiming open clients");
    }
}

impl ServiceWorker {
    fn set_state(&self, state: WorkerState) {
        let previous = self.state.send_replace(state);
        tracing::info!(from = ?previous, to = ?state, "worker state");
    }

    /// Precache every asset into the general generation.
    ///
    /// Asks the host to supersede any waiting instance at the same time.
    /// Fails if any asset cannot be fetched or answers with a non-success
    /// status; in that case nothing is stored and the worker turns redundant.
    pub async fn install(&self) -> Result<(), WorkerError> {
        self.set_state(WorkerState::Installing);

        let skip = async {
            self.registration.skip_waiting().await;
            Ok::<(), WorkerError>(())
        };
        match try_join(skip, self.precache()).await {
            Ok(((), count)) => {
                tracing::info!(cache = %self.config.cache_version, assets = count, "precache complete");
                self.set_state(WorkerState::Installed);
                Ok(())
            }
            Err(err) => {
                tracing::warn!(error = %err, "install failed");
                self.set_state(WorkerState::Redundant);
                Err(err)
            }
        }
    }

    async fn precache(&self) -> Result<usize, WorkerError> {
        let cache_name = &self.config.cache_version;
        self.store.open(cache_name).await?;

        let requests = self
            .config
            .precache_assets
            .iter()
            .map(|path| -> Result<_, WorkerError> { Ok((path.as_str(), Request::get(self.config.resolve(path)?))) })
            .collect::<Result<Vec<_>, _>>()?;

        let fetched: Vec<(Request, Response)> = try_join_all(requests.into_iter().map(|(path, request)| async move {
            let response = match self.network.fetch(&request).await {
                Ok(response) => response,
                Err(source) => return Err(WorkerError::Install { path: path.to_string(), source }),
            };
            if !response.ok() {
                return Err(WorkerError::InstallStatus { path: path.to_string(), status: response.status.as_u16() });
            }
            tracing::debug!(path, url = %request.url, "precached");
            Ok((request, response))
        }))
        .await?;

        self.store.put_all(cache_name, &fetched).await?;
        Ok(fetched.len())
    }

    /// Delete every generation that is neither the current general tag nor
    /// the current image tag, then claim open clients.
    ///
    /// Returns the deleted generation names. Refuses with
    /// [`WorkerError::NotInstalled`] unless an install has completed, so a
    /// failed install never purges the generations still serving.
    pub async fn activate(&self) -> Result<Vec<String>, WorkerError> {
        let previous = self.state();
        self.ensure_installed(previous).await?;
        self.set_state(WorkerState::Activating);

        let result = self.purge_stale_generations().await;
        let stale = match result {
            Ok(stale) => stale,
            Err(err) => {
                tracing::warn!(error = %err, "activation failed");
                self.set_state(previous);
                return Err(err);
            }
        };

        self.registration.claim_clients().await;
        self.set_state(WorkerState::Activated);
        Ok(stale)
    }

    async fn ensure_installed(&self, state: WorkerState) -> Result<(), WorkerError> {
        let installed = match state {
            WorkerState::Installed | WorkerState::Activated => true,
            // A fresh instance over a store that an earlier install populated.
            WorkerState::Parsed => {
                let shell = Request::get(self.root_document.clone());
                self.store.match_request(&self.config.cache_version, &shell).await?.is_some()
            }
            WorkerState::Installing | WorkerState::Activating | WorkerState::Redundant => false,
        };

        if installed {
            Ok(())
        } else {
            tracing::warn!(state = ?state, cache = %self.config.cache_version, "activation refused");
            Err(WorkerError::NotInstalled { state })
        }
    }

    async fn purge_stale_generations(&self) -> Result<Vec<String>, WorkerError> {
        let current = self.config.current_generations();
        let stale: Vec<String> = self
            .store
            .cache_names()
            .await?
            .into_iter()
            .filter(|name| !current.contains(&name.as_str()))
            .collect();

        try_join_all(stale.iter().map(|name| self.store.delete(name))).await?;

        for name in &stale {
            tracing::info!(cache = %name, "deleted stale generation");
        }
        Ok(stale)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{RecordingRegistration, precache_urls, stub_precache, test_config, test_worker};
    use std::sync::Arc;
    use uno_core::CacheStore;

    #[tokio::test]
    async fn test_install_precaches_every_asset() {
        let (worker, store, network) = test_worker().await;
        stub_precache(&network);

        worker.install().await.unwrap();

        assert_eq!(worker.state(), WorkerState::Installed);
        assert_eq!(store.keys("uno-pwa-v2").await.unwrap(), precache_urls());
        let shell = Request::parse("https://app.test/index.html").unwrap();
        let cached = store.match_request("uno-pwa-v2", &shell).await.unwrap().unwrap();
        assert_eq!(&cached.body[..], b"<html>shell</html>");
    }

    #[tokio::test]
    async fn test_install_twice_is_idempotent() {
        let (worker, store, network) = test_worker().await;
        stub_precache(&network);

        worker.install().await.unwrap();
        worker.install().await.unwrap();

        let keys = store.keys("uno-pwa-v2").await.unwrap();
        assert_eq!(keys, precache_urls());
        assert_eq!(store.cache_names().await.unwrap(), vec!["uno-pwa-v2"]);
    }

    #[tokio::test]
    async fn test_install_failure_stores_nothing() {
        let (worker, store, network) = test_worker().await;
        stub_precache(&network);
        network.fail("https://app.test/icons/icon-512.png");

        let err = worker.install().await.unwrap_err();

        assert!(matches!(err, WorkerError::Install { ref path, .. } if path == "./icons/icon-512.png"));
        assert_eq!(worker.state(), WorkerState::Redundant);
        assert!(store.keys("uno-pwa-v2").await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_install_rejects_error_status() {
        let (worker, store, network) = test_worker().await;
        stub_precache(&network);
        network.respond("https://app.test/manifest.webmanifest", 404, "");

        let err = worker.install().await.unwrap_err();

        assert!(matches!(err, WorkerError::InstallStatus { status: 404, .. }));
        assert!(store.keys("uno-pwa-v2").await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_install_signals_skip_waiting() {
        let (worker, _, network) = test_worker().await;
        let registration = Arc::new(RecordingRegistration::default());
        let worker = worker.with_registration(registration.clone());
        stub_precache(&network);

        worker.install().await.unwrap();

        assert_eq!(registration.skip_waiting_calls(), 1);
        assert_eq!(registration.claim_calls(), 0);
    }

    #[tokio::test]
    async fn test_activate_deletes_stale_generations() {
        let (worker, store, network) = test_worker().await;
        for name in ["uno-pwa-v1", "uno-images-v0", "uno-pwa-v2", "uno-images-v1"] {
            store.open(name).await.unwrap();
        }
        stub_precache(&network);
        worker.install().await.unwrap();

        let deleted = worker.activate().await.unwrap();

        assert_eq!(deleted, vec!["uno-pwa-v1", "uno-images-v0"]);
        assert_eq!(store.cache_names().await.unwrap(), vec!["uno-pwa-v2", "uno-images-v1"]);
        assert_eq!(worker.state(), WorkerState::Activated);
    }

    #[tokio::test]
    async fn test_activate_claims_after_purge() {
        let (worker, store, network) = test_worker().await;
        let registration = Arc::new(RecordingRegistration::default());
        let worker = worker.with_registration(registration.clone());
        store.open("legacy-cache").await.unwrap();
        stub_precache(&network);
        worker.install().await.unwrap();

        let mut states = worker.subscribe();
        worker.activate().await.unwrap();

        assert_eq!(registration.claim_calls(), 1);
        assert_eq!(store.cache_names().await.unwrap(), vec!["uno-pwa-v2"]);
        assert!(states.has_changed().unwrap());
        assert_eq!(*states.borrow_and_update(), WorkerState::Activated);
    }

    #[tokio::test]
    async fn test_install_then_activate_rotates_version() {
        let (worker, store, network) = test_worker().await;
        stub_precache(&network);
        store.open("uno-pwa-v1").await.unwrap();
        let old = Request::parse("https://app.test/index.html").unwrap();
        store
            .put("uno-pwa-v1", &old, &Response::new(http::StatusCode::OK, "old shell"))
            .await
            .unwrap();

        worker.install().await.unwrap();
        let deleted = worker.activate().await.unwrap();

        assert_eq!(deleted, vec!["uno-pwa-v1"]);
        assert!(store.match_request("uno-pwa-v1", &old).await.unwrap().is_none());
        let shell = store.match_request("uno-pwa-v2", &old).await.unwrap().unwrap();
        assert_eq!(&shell.body[..], b"<html>shell</html>");
    }

    #[tokio::test]
    async fn test_failed_install_keeps_previous_version() {
        let (worker, store, network) = test_worker().await;
        let registration = Arc::new(RecordingRegistration::default());
        let worker = worker.with_registration(registration.clone());
        let shell = Request::parse("https://app.test/index.html").unwrap();
        store
            .put("uno-pwa-v1", &shell, &Response::new(http::StatusCode::OK, "old shell"))
            .await
            .unwrap();
        stub_precache(&network);
        network.fail("https://app.test/icons/icon-512.png");
        assert!(worker.install().await.is_err());

        let err = worker.activate().await.unwrap_err();

        assert!(matches!(err, WorkerError::NotInstalled { state: WorkerState::Redundant }));
        assert_eq!(worker.state(), WorkerState::Redundant);
        assert_eq!(registration.claim_calls(), 0);
        assert!(store.cache_names().await.unwrap().contains(&"uno-pwa-v1".to_string()));
        let old = store.match_request("uno-pwa-v1", &shell).await.unwrap().unwrap();
        assert_eq!(&old.body[..], b"old shell");
    }

    #[tokio::test]
    async fn test_activate_before_install_is_refused() {
        let (worker, store, _) = test_worker().await;
        store.open("uno-pwa-v1").await.unwrap();

        let err = worker.activate().await.unwrap_err();

        assert!(matches!(err, WorkerError::NotInstalled { state: WorkerState::Parsed }));
        assert_eq!(worker.state(), WorkerState::Parsed);
        assert_eq!(store.cache_names().await.unwrap(), vec!["uno-pwa-v1"]);
    }

    #[tokio::test]
    async fn test_fresh_instance_activates_over_completed_install() {
        let (worker, store, network) = test_worker().await;
        stub_precache(&network);
        worker.install().await.unwrap();
        store.open("uno-pwa-v1").await.unwrap();

        let fresh = ServiceWorker::new(test_config(), store.clone(), network.clone()).unwrap();
        let deleted = fresh.activate().await.unwrap();

        assert_eq!(deleted, vec!["uno-pwa-v1"]);
        assert_eq!(fresh.state(), WorkerState::Activated);
    }
}
