//! SQLite-backed cache generations.
//!
//! This module provides the durable store behind the worker's cache
//! generations, using SQLite with async access via tokio-rusqlite:
//!
//! - Named generations, deleted wholesale with their snapshots
//! - Request identity by method and fragment-free URL, refined by `Vary`
//! - Atomic batch writes for precaching
//! - WAL mode for concurrent access

pub mod connection;
pub mod generations;
pub mod hash;
pub mod migrations;
pub mod snapshots;
pub mod store;
pub mod vary;

pub use crate::Error;

pub use connection::CacheDb;
pub use snapshots::Snapshot;
pub use store::CacheStore;
