//! shelter gateway entry point.
//!
//! Boots the offline cache worker: loads config and manifest, opens the
//! bucket store, runs install (manifest precache) and activate
//! (stale-bucket cleanup), then binds the gateway listener. The
//! ordering matters: no fetch is handled before activation completes,
//! so the single-surviving-bucket invariant holds from the first
//! request. Logging goes to stderr as JSON.

use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::{Context, Result};
use reqwest::Url;
use tracing_subscriber::EnvFilter;

use shelter_client::{FetchClient, FetchConfig};
use shelter_core::{AppConfig, AssetManifest, CacheDb};

mod error;
mod events;
mod gateway;
#[cfg(test)]
mod testing;

use events::Worker;
use gateway::GatewayState;

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .json()
        .init();

    let config = AppConfig::load().context("failed to load configuration")?;

    let manifest = match &config.manifest_path {
        Some(path) => AssetManifest::from_file(path)?,
        None => AssetManifest::default(),
    };
    manifest.validate()?;

    let origin = Url::parse(&config.origin).with_context(|| format!("invalid origin: {}", config.origin))?;

    tracing::info!(
        version = %manifest.version,
        assets = manifest.assets.len(),
        origin = %origin,
        "starting shelter gateway"
    );

    let db = CacheDb::open(&config.db_path).await?;

    let fetch_client = FetchClient::new(FetchConfig {
        user_agent: config.user_agent.clone(),
        max_bytes: config.max_bytes,
        timeout: config.timeout(),
        ..Default::default()
    })?;

    let worker = Arc::new(Worker::new(
        db,
        Arc::new(fetch_client),
        manifest,
        origin.clone(),
        config.fallback_path.clone(),
        config.install_concurrency,
    ));

    let install = worker.install().await?;
    if install.is_complete() {
        tracing::info!(bucket = %install.bucket, cached = install.cached.len(), "install complete");
    } else {
        tracing::warn!(
            bucket = %install.bucket,
            cached = install.cached.len(),
            failed = install.failed.len(),
            "install completed with failures"
        );
    }

    let activation = worker.activate().await?;
    tracing::info!(
        kept = %activation.kept,
        deleted = activation.deleted.len(),
        "activation complete"
    );

    let addr: SocketAddr = config
        .listen_addr
        .parse()
        .with_context(|| format!("invalid listen address: {}", config.listen_addr))?;

    let state = GatewayState::new(worker, origin, &config)?;
    gateway::serve(addr, state).await
}
