//! Core types and shared functionality for the uno offline worker.
//!
//! This crate provides:
//! - Request and response values
//! - The cache store contract with its SQLite backend
//! - The network contract
//! - Unified error types
//! - Configuration structures

pub mod cache;
pub mod config;
pub mod error;
pub mod network;
pub mod request;
pub mod response;

pub use cache::{CacheDb, CacheStore, Snapshot};
pub use config::WorkerConfig;
pub use error::Error;
pub use network::Network;
pub use request::{Destination, Request, RequestMode};
pub use response::Response;
