//! Response values returned to the host and stored as snapshots.

use bytes::Bytes;
use http::{HeaderMap, StatusCode};
use url::Url;

/// A response, either fresh from the network, read back from a cache
/// generation, or synthesized by the worker.
///
/// The body is reference counted, so cloning a response to both store and
/// return it does not copy the payload.
#[derive(Debug, Clone)]
pub struct Response {
    pub status: StatusCode,
    pub headers: HeaderMap,
    pub body: Bytes,
    /// Final URL after redirects; `None` for synthetic responses.
    pub url: Option<Url>,
}

impl Response {
    /// A response with the given status and body and no headers.
    pub fn new(status: StatusCode, body: impl Into<Bytes>) -> Self {
        Self { status, headers: HeaderMap::new(), body: body.into(), url: None }
    }

    /// The synthetic empty 503 answered when neither cache nor network has a
    /// result.
    pub fn service_unavailable() -> Self {
        Self::new(StatusCode::SERVICE_UNAVAILABLE, Bytes::new())
    }

    /// Status in the 200-299 range.
    pub fn ok(&self) -> bool {
        self.status.is_success()
    }

    /// Whether the worker built this response rather than the network.
    pub fn is_synthetic(&self) -> bool {
        self.url.is_none() && self.status == StatusCode::SERVICE_UNAVAILABLE && self.body.is_empty()
    }
}
