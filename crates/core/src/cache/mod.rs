//! SQLite-backed store for versioned cache buckets.
//!
//! This module provides a persistent URL-to-response cache using SQLite
//! with async access via tokio-rusqlite. It supports:
//!
//! - Named buckets, one per manifest version
//! - Idempotent entry upserts keyed by (bucket, url)
//! - Cascading bucket deletion for stale-version cleanup
//! - Automatic schema migrations
//! - WAL mode for concurrent access

pub mod buckets;
pub mod connection;
pub mod entries;
pub mod migrations;

pub use crate::Error;

pub use connection::CacheDb;
pub use entries::StoredResponse;
