//! Snapshot storage within a cache generation.
//!
//! A snapshot is the stored copy of a response for one request identity in
//! one generation. Writes are upserts: a fresher response for the same
//! identity replaces the old one, last write wins.

use super::connection::CacheDb;
use super::generations::ensure_generation;
use super::vary::VaryCapture;
use crate::{Error, Request, Response};
use bytes::Bytes;
use http::{HeaderMap, HeaderName, HeaderValue, StatusCode};
use serde::{Deserialize, Serialize};
use tokio_rusqlite::params;
use tokio_rusqlite::rusqlite;

/// A stored response snapshot.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Snapshot {
    pub hash: String,
    pub method: String,
    pub url: String,
    pub status_code: u16,
    pub headers_json: String,
    pub vary_json: Option<String>,
    pub body: Vec<u8>,
    pub response_url: Option<String>,
    pub stored_at: String,
}

impl Snapshot {
    /// Copy `response` into a snapshot keyed by `request`'s identity.
    pub fn capture(request: &Request, response: &Response) -> Result<Self, Error> {
        // Values are kept as raw bytes: header values need not be UTF-8.
        let headers: Vec<(&str, &[u8])> = response
            .headers
            .iter()
            .map(|(name, value)| (name.as_str(), value.as_bytes()))
            .collect();
        let vary_json = super::vary::capture(request, response)?
            .map(|captured| serde_json::to_string(&captured))
            .transpose()?;

        Ok(Self {
            hash: super::hash::request_key(request),
            method: request.method.as_str().to_string(),
            url: request.identity_url().to_string(),
            status_code: response.status.as_u16(),
            headers_json: serde_json::to_string(&headers)?,
            vary_json,
            body: response.body.to_vec(),
            response_url: response.url.as_ref().map(|u| u.to_string()),
            stored_at: chrono::Utc::now().to_rfc3339(),
        })
    }

    /// Rebuild the response this snapshot was taken from.
    pub fn to_response(&self) -> Result<Response, Error> {
        let status = StatusCode::from_u16(self.status_code)
            .map_err(|e| Error::CorruptSnapshot(format!("status {}: {e}", self.status_code)))?;

        let pairs: Vec<(String, Vec<u8>)> = serde_json::from_str(&self.headers_json)?;
        let mut headers = HeaderMap::with_capacity(pairs.len());
        for (name, value) in pairs {
            let name = HeaderName::from_bytes(name.as_bytes())
                .map_err(|e| Error::CorruptSnapshot(format!("header name {name}: {e}")))?;
            let value = HeaderValue::from_bytes(&value)
                .map_err(|e| Error::CorruptSnapshot(format!("header {name}: {e}")))?;
            headers.append(name, value);
        }

        let url = self
            .response_url
            .as_deref()
            .map(url::Url::parse)
            .transpose()
            .map_err(|e| Error::CorruptSnapshot(format!("response url: {e}")))?;

        Ok(Response { status, headers, body: Bytes::from(self.body.clone()), url })
    }

    /// Request header values this snapshot varies on, if any.
    pub fn vary(&self) -> Result<Option<VaryCapture>, Error> {
        self.vary_json
            .as_deref()
            .map(|json| serde_json::from_str(json))
            .transpose()
            .map_err(Error::from)
    }
}

const UPSERT_SNAPSHOT: &str = "INSERT INTO snapshots (
        cache_name, hash, method, url, status_code,
        headers_json, vary_json, body, response_url, stored_at
    ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10)
    ON CONFLICT(cache_name, hash) DO UPDATE SET
        method = excluded.method,
        url = excluded.url,
        status_code = excluded.status_code,
        headers_json = excluded.headers_json,
        vary_json = excluded.vary_json,
        body = excluded.body,
        response_url = excluded.response_url,
        stored_at = excluded.stored_at";

fn write_snapshot(conn: &rusqlite::Connection, cache_name: &str, snapshot: &Snapshot) -> rusqlite::Result<()> {
    conn.execute(
        UPSERT_SNAPSHOT,
        params![
            cache_name,
            &snapshot.hash,
            &snapshot.method,
            &snapshot.url,
            snapshot.status_code,
            &snapshot.headers_json,
            &snapshot.vary_json,
            &snapshot.body,
            &snapshot.response_url,
            &snapshot.stored_at,
        ],
    )?;
    Ok(())
}

impl CacheDb {
    /// Insert or replace a snapshot, creating the generation if it is missing.
    pub async fn upsert_snapshot(&self, cache_name: &str, snapshot: &Snapshot) -> Result<(), Error> {
        let cache_name = cache_name.to_string();
        let snapshot = snapshot.clone();
        self.conn
            .call(move |conn| -> Result<(), Error> {
                let tx = conn.transaction()?;
                ensure_generation(&tx, &cache_name)?;
                write_snapshot(&tx, &cache_name, &snapshot)?;
                tx.commit()?;
                Ok(())
            })
            .await
            .map_err(Error::from)
    }

    /// Insert or replace many snapshots atomically: either all are stored or
    /// none are.
    pub async fn upsert_snapshots(&self, cache_name: &str, snapshots: Vec<Snapshot>) -> Result<(), Error> {
        let cache_name = cache_name.to_string();
        self.conn
            .call(move |conn| -> Result<(), Error> {
                let tx = conn.transaction()?;
                ensure_generation(&tx, &cache_name)?;
                for snapshot in &snapshots {
                    write_snapshot(&tx, &cache_name, snapshot)?;
                }
                tx.commit()?;
                Ok(())
            })
            .await
            .map_err(Error::from)
    }

    /// Get a snapshot by identity hash.
    ///
    /// Returns None if the generation or the entry doesn't exist.
    pub async fn get_snapshot(&self, cache_name: &str, hash: &str) -> Result<Option<Snapshot>, Error> {
        let cache_name = cache_name.to_string();
        let hash = hash.to_string();
        self.conn
            .call(move |conn| -> Result<Option<Snapshot>, Error> {
                let mut stmt = conn.prepare(
                    "SELECT hash, method, url, status_code, headers_json, vary_json,
                            body, response_url, stored_at
                     FROM snapshots WHERE cache_name = ?1 AND hash = ?2",
                )?;

                let result = stmt.query_row(params![cache_name, hash], |row| {
                    Ok(Snapshot {
                        hash: row.get(0)?,
                        method: row.get(1)?,
                        url: row.get(2)?,
                        status_code: row.get(3)?,
                        headers_json: row.get(4)?,
                        vary_json: row.get(5)?,
                        body: row.get(6)?,
                        response_url: row.get(7)?,
                        stored_at: row.get(8)?,
                    })
                });

                match result {
                    Ok(s) => Ok(Some(s)),
                    Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
                    Err(e) => Err(e.into()),
                }
            })
            .await
            .map_err(Error::from)
    }

    /// Request URLs stored in a generation, oldest entry first.
    pub async fn snapshot_urls(&self, cache_name: &str) -> Result<Vec<String>, Error> {
        let cache_name = cache_name.to_string();
        self.conn
            .call(move |conn| -> Result<Vec<String>, Error> {
                let mut stmt = conn.prepare("SELECT url FROM snapshots WHERE cache_name = ?1 ORDER BY rowid ASC")?;
                let urls = stmt
                    .query_map(params![cache_name], |row| row.get(0))?
                    .collect::<Result<Vec<String>, _>>()?;
                Ok(urls)
            })
            .await
            .map_err(Error::from)
    }
}
