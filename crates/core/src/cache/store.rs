//! Platform cache store contract.
//!
//! The worker only ever touches cache generations through [`CacheStore`], so
//! tests and alternative hosts can supply their own storage.

use async_trait::async_trait;

use super::connection::CacheDb;
use super::hash::request_key;
use super::snapshots::Snapshot;
use crate::{Error, Request, Response};

/// Durable, named key-value store of response snapshots.
///
/// Implementations must be safe to share between concurrently running request
/// handlers; individual reads and writes are atomic.
#[async_trait]
pub trait CacheStore: Send + Sync {
    /// Open a generation, creating it if absent.
    async fn open(&self, name: &str) -> Result<(), Error>;

    /// Stored response for `request` in generation `name`, if any.
    async fn match_request(&self, name: &str, request: &Request) -> Result<Option<Response>, Error>;

    /// Store `response` as the snapshot for `request`'s identity.
    async fn put(&self, name: &str, request: &Request, response: &Response) -> Result<(), Error>;

    /// Store every pair, or none of them.
    async fn put_all(&self, name: &str, entries: &[(Request, Response)]) -> Result<(), Error>;

    /// Request URLs stored in a generation.
    async fn keys(&self, name: &str) -> Result<Vec<String>, Error>;

    /// Names of all existing generations.
    async fn cache_names(&self) -> Result<Vec<String>, Error>;

    /// Delete a generation. Returns whether it existed.
    async fn delete(&self, name: &str) -> Result<bool, Error>;
}

#[async_trait]
impl CacheStore for CacheDb {
    async fn open(&self, name: &str) -> Result<(), Error> {
        self.open_generation(name).await
    }

    async fn match_request(&self, name: &str, request: &Request) -> Result<Option<Response>, Error> {
        let Some(snapshot) = self.get_snapshot(name, &request_key(request)).await? else {
            return Ok(None);
        };

        if let Some(captured) = snapshot.vary()?
            && !super::vary::matches(&captured, request)
        {
            tracing::debug!(url = %request.url, cache = name, "stored entry varies from request");
            return Ok(None);
        }

        snapshot.to_response().map(Some)
    }

    async fn put(&self, name: &str, request: &Request, response: &Response) -> Result<(), Error> {
        let snapshot = Snapshot::capture(request, response)?;
        self.upsert_snapshot(name, &snapshot).await
    }

    async fn put_all(&self, name: &str, entries: &[(Request, Response)]) -> Result<(), Error> {
        let snapshots = entries
            .iter()
            .map(|(request, response)| Snapshot::capture(request, response))
            .collect::<Result<Vec<_>, _>>()?;
        self.upsert_snapshots(name, snapshots).await
    }

    async fn keys(&self, name: &str) -> Result<Vec<String>, Error> {
        self.snapshot_urls(name).await
    }

    async fn cache_names(&self) -> Result<Vec<String>, Error> {
        self.generation_names().await
    }

    async fn delete(&self, name: &str) -> Result<bool, Error> {
        self.delete_generation(name).await
    }
}
