//! Install event handler.
//!
//! Opens the bucket named by the manifest version and precaches every
//! manifest asset with bounded concurrency. Population is best-effort:
//! an unreachable asset is logged and reported, never fatal.

use std::sync::Arc;

use reqwest::Url;
use shelter_client::Network;
use shelter_core::{AssetManifest, CacheDb, Error, StoredResponse};
use tokio::sync::Semaphore;
use tokio::task::JoinSet;

/// Partial-success result of manifest precaching.
#[derive(Debug)]
pub struct InstallReport {
    /// Bucket that was opened (the manifest version).
    pub bucket: String,

    /// Asset paths cached, in manifest order.
    pub cached: Vec<String>,

    /// Asset paths that failed, with the failure reason.
    pub failed: Vec<(String, String)>,
}

impl InstallReport {
    /// True when every manifest asset was cached.
    pub fn is_complete(&self) -> bool {
        self.failed.is_empty()
    }
}

/// Implementation of the install event.
///
/// Opens (create-if-absent) the versioned bucket, then fans out one
/// fetch task per manifest asset behind a semaphore. Only 200 responses
/// are stored; transport failures, error statuses, and store failures
/// are collected into the report.
pub async fn install_impl<N: Network + 'static>(
    db: &CacheDb, network: &Arc<N>, manifest: &AssetManifest, origin: &Url, concurrency: usize,
) -> Result<InstallReport, Error> {
    manifest.validate()?;
    db.open_bucket(&manifest.version).await?;

    let semaphore = Arc::new(Semaphore::new(concurrency.max(1)));
    let mut join_set = JoinSet::new();

    for path in &manifest.assets {
        let path = path.clone();
        let url = origin
            .join(&path)
            .map_err(|e| Error::InvalidUrl(format!("{path}: {e}")))?;

        let db = db.clone();
        let network = Arc::clone(network);
        let bucket = manifest.version.clone();
        let semaphore = Arc::clone(&semaphore);

        join_set.spawn(async move {
            // Semaphore closed only on drop; treat as a skipped asset.
            let _permit = match semaphore.acquire().await {
                Ok(permit) => permit,
                Err(_) => return (path, Err("install cancelled".to_string())),
            };

            let outcome = precache_one(&db, network.as_ref(), &bucket, &path, &url).await;
            (path, outcome)
        });
    }

    let mut cached = Vec::new();
    let mut failed = Vec::new();

    while let Some(joined) = join_set.join_next().await {
        match joined {
            Ok((path, Ok(()))) => cached.push(path),
            Ok((path, Err(reason))) => {
                tracing::warn!(asset = %path, reason = %reason, "failed to precache asset");
                failed.push((path, reason));
            }
            Err(e) => {
                tracing::warn!(error = %e, "precache task panicked");
            }
        }
    }

    // Completion order is nondeterministic; report in manifest order.
    let order = |p: &String| manifest.assets.iter().position(|a| a == p).unwrap_or(usize::MAX);
    cached.sort_by_key(order);
    failed.sort_by_key(|(p, _)| order(p));

    tracing::info!(
        bucket = %manifest.version,
        cached = cached.len(),
        failed = failed.len(),
        "install complete"
    );

    Ok(InstallReport { bucket: manifest.version.clone(), cached, failed })
}

async fn precache_one<N: Network + ?Sized>(
    db: &CacheDb, network: &N, bucket: &str, path: &str, url: &Url,
) -> Result<(), String> {
    let response = network.get(url).await.map_err(|e| e.to_string())?;

    if response.status.as_u16() != 200 {
        return Err(format!("status {}", response.status.as_u16()));
    }

    let entry = StoredResponse::new(path, response.status.as_u16(), response.content_type.clone(), response.bytes.to_vec());

    db.put_entry(bucket, &entry).await.map_err(|e| e.to_string())
}
