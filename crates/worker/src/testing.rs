//! Test doubles shared by the worker's unit tests.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use http::StatusCode;
use uno_core::{CacheDb, CacheStore, Error, Network, Request, RequestMode, Response, WorkerConfig};

use crate::lifecycle::Registration;
use crate::worker::ServiceWorker;

#[derive(Debug, Clone)]
enum Scripted {
    Respond(StatusCode, String),
    Fail,
    Hang,
}

/// Network double answering from a per-URL script.
///
/// Unscripted URLs fail like an unreachable origin.
#[derive(Debug, Default)]
pub struct StubNetwork {
    script: Mutex<HashMap<String, Scripted>>,
    calls: Mutex<HashMap<String, usize>>,
    offline: AtomicBool,
}

impl StubNetwork {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn respond(&self, url: &str, status: u16, body: &str) {
        let status = StatusCode::from_u16(status).unwrap();
        self.script.lock().unwrap().insert(url.to_string(), Scripted::Respond(status, body.to_string()));
    }

    pub fn fail(&self, url: &str) {
        self.script.lock().unwrap().insert(url.to_string(), Scripted::Fail);
    }

    pub fn hang(&self, url: &str) {
        self.script.lock().unwrap().insert(url.to_string(), Scripted::Hang);
    }

    /// Every subsequent fetch fails, scripted or not.
    pub fn go_offline(&self) {
        self.offline.store(true, Ordering::SeqCst);
    }

    pub fn calls(&self, url: &str) -> usize {
        self.calls.lock().unwrap().get(url).copied().unwrap_or(0)
    }

    pub fn total_calls(&self) -> usize {
        self.calls.lock().unwrap().values().sum()
    }
}

#[async_trait]
impl Network for StubNetwork {
    async fn fetch(&self, request: &Request) -> Result<Response, Error> {
        let url = request.url.as_str().to_string();
        *self.calls.lock().unwrap().entry(url.clone()).or_default() += 1;

        if self.offline.load(Ordering::SeqCst) {
            return Err(Error::Network(format!("{url}: offline")));
        }

        let scripted = self.script.lock().unwrap().get(&url).cloned();
        match scripted {
            Some(Scripted::Respond(status, body)) => {
                let mut response = Response::new(status, body);
                response.url = Some(request.url.clone());
                Ok(response)
            }
            Some(Scripted::Hang) => std::future::pending().await,
            Some(Scripted::Fail) | None => Err(Error::Network(format!("{url}: connection refused"))),
        }
    }
}

/// Registration double counting the signals it receives.
#[derive(Debug, Default)]
pub struct RecordingRegistration {
    skip_waiting: AtomicUsize,
    claim: AtomicUsize,
}

impl RecordingRegistration {
    pub fn skip_waiting_calls(&self) -> usize {
        self.skip_waiting.load(Ordering::SeqCst)
    }

    pub fn claim_calls(&self) -> usize {
        self.claim.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl Registration for RecordingRegistration {
    async fn skip_waiting(&self) {
        self.skip_waiting.fetch_add(1, Ordering::SeqCst);
    }

    async fn claim_clients(&self) {
        self.claim.fetch_add(1, Ordering::SeqCst);
    }
}

/// Store double over an in-memory [`CacheDb`] whose writes or lookups can be
/// switched to fail.
pub struct FlakyStore {
    inner: CacheDb,
    fail_puts: AtomicBool,
    fail_lookups: AtomicBool,
}

impl FlakyStore {
    pub async fn new() -> Arc<Self> {
        Arc::new(Self {
            inner: CacheDb::open_in_memory().await.unwrap(),
            fail_puts: AtomicBool::new(false),
            fail_lookups: AtomicBool::new(false),
        })
    }

    pub fn fail_puts(&self) {
        self.fail_puts.store(true, Ordering::SeqCst);
    }

    pub fn fail_lookups(&self) {
        self.fail_lookups.store(true, Ordering::SeqCst);
    }

    fn write_guard(&self) -> Result<(), Error> {
        if self.fail_puts.load(Ordering::SeqCst) {
            return Err(Error::InvalidInput("store is read-only".into()));
        }
        Ok(())
    }
}

#[async_trait]
impl CacheStore for FlakyStore {
    async fn open(&self, name: &str) -> Result<(), Error> {
        CacheStore::open(&self.inner, name).await
    }

    async fn match_request(&self, name: &str, request: &Request) -> Result<Option<Response>, Error> {
        if self.fail_lookups.load(Ordering::SeqCst) {
            return Err(Error::CorruptSnapshot("truncated row".into()));
        }
        self.inner.match_request(name, request).await
    }

    async fn put(&self, name: &str, request: &Request, response: &Response) -> Result<(), Error> {
        self.write_guard()?;
        self.inner.put(name, request, response).await
    }

    async fn put_all(&self, name: &str, entries: &[(Request, Response)]) -> Result<(), Error> {
        self.write_guard()?;
        self.inner.put_all(name, entries).await
    }

    async fn keys(&self, name: &str) -> Result<Vec<String>, Error> {
        self.inner.keys(name).await
    }

    async fn cache_names(&self) -> Result<Vec<String>, Error> {
        self.inner.cache_names().await
    }

    async fn delete(&self, name: &str) -> Result<bool, Error> {
        self.inner.delete(name).await
    }
}

pub fn test_config() -> WorkerConfig {
    WorkerConfig { scope: "https://app.test/".into(), ..WorkerConfig::default() }
}

pub async fn test_worker() -> (ServiceWorker, Arc<CacheDb>, Arc<StubNetwork>) {
    let store = Arc::new(CacheDb::open_in_memory().await.unwrap());
    let network = StubNetwork::new();
    let worker = ServiceWorker::new(test_config(), store.clone(), network.clone()).unwrap();
    (worker, store, network)
}

pub async fn flaky_worker() -> (ServiceWorker, Arc<FlakyStore>, Arc<StubNetwork>) {
    let store = FlakyStore::new().await;
    let network = StubNetwork::new();
    let worker = ServiceWorker::new(test_config(), store.clone(), network.clone()).unwrap();
    (worker, store, network)
}

/// Precache URLs in install order.
pub fn precache_urls() -> Vec<String> {
    [
        "https://app.test/",
        "https://app.test/index.html",
        "https://app.test/manifest.webmanifest",
        "https://app.test/icons/icon-192.png",
        "https://app.test/icons/icon-512.png",
    ]
    .into_iter()
    .map(String::from)
    .collect()
}

/// Script a successful answer for every precached asset.
pub fn stub_precache(network: &StubNetwork) {
    network.respond("https://app.test/", 200, "<html>root</html>");
    network.respond("https://app.test/index.html", 200, "<html>shell</html>");
    network.respond("https://app.test/manifest.webmanifest", 200, r#"{"name":"uno"}"#);
    network.respond("https://app.test/icons/icon-192.png", 200, "icon-192");
    network.respond("https://app.test/icons/icon-512.png", 200, "icon-512");
}

pub fn get(url: &str) -> Request {
    Request::parse(url).unwrap()
}

pub fn navigation(url: &str) -> Request {
    get(url).with_mode(RequestMode::Navigate)
}
