//! Network layer for shelter.
//!
//! This crate provides the HTTP fetch client the cache worker uses to
//! reach the upstream origin, plus the `Network` trait seam the worker
//! is tested against.

pub mod fetch;

pub use fetch::{FetchClient, FetchConfig, FetchResponse, Network};
pub use fetch::url::{UrlError, canonicalize, same_origin};
