//! Network stack for the uno offline worker.
//!
//! This crate provides the reqwest-backed implementation of
//! [`uno_core::Network`] used when the worker talks to a real origin.

pub mod fetch;

pub use fetch::{FetchClient, FetchConfig, UrlError, canonicalize};
