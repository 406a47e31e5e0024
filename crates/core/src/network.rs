//! Platform network stack contract.

use async_trait::async_trait;

use crate::{Error, Request, Response};

/// Issues a request and returns whatever the server answered.
///
/// Any HTTP status is a successful resolution. Implementations fail only when
/// no response was obtained at all (DNS, connect, TLS, timeout, body limits).
#[async_trait]
pub trait Network: Send + Sync {
    async fn fetch(&self, request: &Request) -> Result<Response, Error>;
}
