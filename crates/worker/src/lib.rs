//! Offline cache worker for the uno web app.
//!
//! Sits between the app's requests and the network. Each intercepted request
//! is routed to one of three policies:
//!
//! - navigations go to the network and fall back to the cached app shell
//! - images are served cache-first from their own generation
//! - everything else is stale-while-revalidate against the general generation
//!
//! The install/activate lifecycle precaches the shell and garbage-collects
//! cache generations whose tag is no longer current.

pub mod background;
pub mod error;
pub mod lifecycle;
pub mod policy;
pub mod resolution;
pub mod router;
pub mod worker;

#[cfg(test)]
pub(crate) mod testing;

pub use error::WorkerError;
pub use lifecycle::{LoggingRegistration, Registration, WorkerState};
pub use resolution::Resolution;
pub use router::{ImageMatcher, Route};
pub use worker::ServiceWorker;
