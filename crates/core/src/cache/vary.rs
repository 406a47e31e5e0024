//! `Vary` handling for request identity.
//!
//! The identity hash covers method and URL only. When a stored response
//! carries `Vary`, the named request header values are captured at put time
//! and a later lookup only hits if the incoming request presents the same
//! values.

use http::header::VARY;

use crate::{Error, Request, Response};

/// Request header values a stored response varies on, as (lowercase name, value).
pub type VaryCapture = Vec<(String, Option<String>)>;

/// Header names listed in the response's `Vary` headers.
///
/// `Vary: *` makes a response unmatchable, so it is rejected outright.
fn vary_header_names(response: &Response) -> Result<Vec<String>, Error> {
    let mut names = Vec::new();
    for value in response.headers.get_all(VARY) {
        let value = String::from_utf8_lossy(value.as_bytes());
        for name in value.split(',').map(str::trim).filter(|n| !n.is_empty()) {
            if name == "*" {
                return Err(Error::InvalidInput("responses with Vary: * cannot be cached".into()));
            }
            let name = name.to_ascii_lowercase();
            if !names.contains(&name) {
                names.push(name);
            }
        }
    }
    Ok(names)
}

/// Capture the request side of the response's `Vary` headers.
///
/// Returns `None` when the response does not vary.
pub fn capture(request: &Request, response: &Response) -> Result<Option<VaryCapture>, Error> {
    let names = vary_header_names(response)?;
    if names.is_empty() {
        return Ok(None);
    }
    Ok(Some(
        names
            .into_iter()
            .map(|name| {
                let value = request.header_str(&name);
                (name, value)
            })
            .collect(),
    ))
}

/// Whether `request` presents the header values captured for a stored entry.
pub fn matches(captured: &VaryCapture, request: &Request) -> bool {
    captured
        .iter()
        .all(|(name, value)| request.header_str(name).as_deref() == value.as_deref())
}
