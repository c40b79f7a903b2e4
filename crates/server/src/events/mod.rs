//! Lifecycle event handlers for the cache worker.
//!
//! The worker reacts to three external triggers, each dispatched by the
//! hosting gateway: install (precache the manifest), activate (remove
//! stale buckets), and fetch (resolve a request cache-first). `Worker`
//! bundles the shared state and routes each trigger to its handler.

pub mod activate;
pub mod fetch;
pub mod install;

pub use activate::{ActivateReport, activate_impl};
pub use fetch::{FetchDecision, FetchEvent, ServedResponse, Source, fetch_impl};
pub use install::{InstallReport, install_impl};

use std::sync::Arc;

use reqwest::Url;
use shelter_client::Network;
use shelter_core::{AssetManifest, CacheDb, Error};

/// The offline cache worker.
///
/// Owns the bucket store, the network seam, and the manifest. One
/// instance is shared by all in-flight fetch dispatches; handlers take
/// `&self` and the store tolerates concurrent idempotent writes, so no
/// locking is needed.
pub struct Worker<N: Network> {
    db: CacheDb,
    network: Arc<N>,
    manifest: AssetManifest,
    origin: Url,
    fallback_path: String,
    install_concurrency: usize,
}

impl<N: Network + 'static> Worker<N> {
    pub fn new(
        db: CacheDb, network: Arc<N>, manifest: AssetManifest, origin: Url, fallback_path: String,
        install_concurrency: usize,
    ) -> Self {
        Self { db, network, manifest, origin, fallback_path, install_concurrency }
    }

    /// The current cache version (bucket name).
    pub fn version(&self) -> &str {
        &self.manifest.version
    }

    /// Install: open the versioned bucket and precache the manifest.
    pub async fn install(&self) -> Result<InstallReport, Error> {
        install_impl(&self.db, &self.network, &self.manifest, &self.origin, self.install_concurrency).await
    }

    /// Activate: delete every bucket not matching the current version.
    pub async fn activate(&self) -> Result<ActivateReport, Error> {
        activate_impl(&self.db, &self.manifest.version).await
    }

    /// Fetch: resolve one intercepted request cache-first.
    pub async fn handle_fetch(&self, event: &FetchEvent) -> Result<FetchDecision, Error> {
        fetch_impl(
            &self.db,
            self.network.as_ref(),
            &self.manifest.version,
            &self.origin,
            &self.fallback_path,
            event,
        )
        .await
    }
}
