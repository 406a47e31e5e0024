//! Request identity hashing.

use sha2::{Digest, Sha256};

use crate::Request;

/// Compute the identity key for a request/method pair.
///
/// The URL is expected to be fragment-free (see [`Request::identity_url`]).
pub fn compute_cache_key(method: &str, url: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(method.as_bytes());
    hasher.update(b"\n");
    hasher.update(url.as_bytes());
    hex::encode(hasher.finalize())
}

/// Identity key of an intercepted request.
pub fn request_key(request: &Request) -> String {
    compute_cache_key(request.method.as_str(), request.identity_url().as_str())
}
