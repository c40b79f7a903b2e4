//! Core types and shared functionality for shelter.
//!
//! This crate provides:
//! - Versioned cache bucket store with SQLite backend
//! - Asset manifest model
//! - Unified error types
//! - Layered configuration

pub mod cache;
pub mod config;
pub mod error;
pub mod manifest;

pub use cache::{CacheDb, StoredResponse};
pub use config::AppConfig;
pub use error::Error;
pub use manifest::AssetManifest;
