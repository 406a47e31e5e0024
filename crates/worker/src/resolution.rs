//! Outcome of consulting one source (cache or network) for a request.

use http::{Method, StatusCode};
use uno_core::{Error, Request, Response};

/// What a cache lookup or network fetch produced.
///
/// Keeping network failure as its own variant lets each policy decide, in
/// plain sight, to treat it like a miss.
#[derive(Debug)]
pub enum Resolution {
    Found(Response),
    Absent,
    NetworkError(Error),
}

impl Resolution {
    /// Wrap a network result.
    pub fn from_fetch(result: Result<Response, Error>) -> Self {
        match result {
            Ok(response) => Self::Found(response),
            Err(err) => Self::NetworkError(err),
        }
    }

    /// The response, if any. A network error counts as absence.
    pub fn into_response(self) -> Option<Response> {
        match self {
            Self::Found(response) => Some(response),
            Self::Absent => None,
            Self::NetworkError(err) => {
                tracing::debug!(error = %err, "network failure treated as no result");
                None
            }
        }
    }

    pub fn is_found(&self) -> bool {
        matches!(self, Self::Found(_))
    }
}

/// Only a `GET` answered with exactly 200 may be written to a generation.
pub fn is_cacheable(request: &Request, response: &Response) -> bool {
    request.method == Method::GET && response.status == StatusCode::OK
}
