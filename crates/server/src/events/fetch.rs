//! Fetch event handler.
//!
//! Resolves one intercepted request with the
//! cache-first-with-network-fallback policy:
//!
//! 1. Bucket hit: serve the stored response, no network access.
//! 2. Miss: fetch from the network; a 200 same-origin response is
//!    stored (idempotent upsert) before being served, anything else is
//!    relayed uncached.
//! 3. Transport failure: serve the cached root document so the page
//!    shell renders fully offline.
//!
//! Only same-origin GET requests are intercepted at all; everything
//! else is declined and left to the gateway's default network path.

use bytes::Bytes;
use reqwest::{Method, Url};
use shelter_client::{Network, same_origin};
use shelter_core::{CacheDb, Error, StoredResponse};

/// One outgoing request from a controlled client.
#[derive(Debug, Clone)]
pub struct FetchEvent {
    pub method: Method,
    pub url: Url,
}

/// Where a served response came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Source {
    Cache,
    Network,
    Fallback,
}

/// A response the worker chose to serve.
#[derive(Debug, Clone)]
pub struct ServedResponse {
    pub status: u16,
    pub content_type: Option<String>,
    pub body: Bytes,
    pub source: Source,
}

/// The worker's verdict on a fetch event.
#[derive(Debug, Clone)]
pub enum FetchDecision {
    /// Not intercepted; the gateway's default network path handles it.
    PassThrough,

    /// Intercepted and resolved.
    Respond(ServedResponse),
}

/// Origin-relative cache key for a URL: path plus query.
///
/// Keys must match between install-time precache (manifest paths) and
/// runtime caching, so both sides key by the origin-relative form.
pub fn cache_key(url: &Url) -> String {
    match url.query() {
        Some(q) => format!("{}?{}", url.path(), q),
        None => url.path().to_string(),
    }
}

/// Implementation of the fetch event.
pub async fn fetch_impl<N: Network + ?Sized>(
    db: &CacheDb, network: &N, bucket: &str, origin: &Url, fallback_path: &str, event: &FetchEvent,
) -> Result<FetchDecision, Error> {
    if event.method != Method::GET || !same_origin(&event.url, origin) {
        tracing::debug!(method = %event.method, url = %event.url, "not intercepted");
        return Ok(FetchDecision::PassThrough);
    }

    let key = cache_key(&event.url);

    if let Some(stored) = db.match_entry(bucket, &key).await? {
        tracing::debug!(url = %key, "cache hit");
        return Ok(FetchDecision::Respond(ServedResponse {
            status: stored.status,
            content_type: stored.content_type,
            body: Bytes::from(stored.body),
            source: Source::Cache,
        }));
    }

    match network.get(&event.url).await {
        Ok(response) => {
            let cacheable = response.status.as_u16() == 200 && same_origin(&response.final_url, origin);

            if cacheable {
                let entry = StoredResponse::new(
                    &key,
                    response.status.as_u16(),
                    response.content_type.clone(),
                    response.bytes.to_vec(),
                );
                // Best-effort: a failed put must not fail the response.
                if let Err(e) = db.put_entry(bucket, &entry).await {
                    tracing::warn!(url = %key, error = %e, "failed to cache network response");
                }
            }

            tracing::debug!(url = %key, status = response.status.as_u16(), cached = cacheable, "served from network");
            Ok(FetchDecision::Respond(ServedResponse {
                status: response.status.as_u16(),
                content_type: response.content_type,
                body: response.bytes,
                source: Source::Network,
            }))
        }
        Err(Error::Network(reason)) => {
            tracing::debug!(url = %key, reason = %reason, "network unreachable, falling back");
            match db.match_entry(bucket, fallback_path).await? {
                Some(stored) => Ok(FetchDecision::Respond(ServedResponse {
                    status: stored.status,
                    content_type: stored.content_type,
                    body: Bytes::from(stored.body),
                    source: Source::Fallback,
                })),
                None => Err(Error::CacheMiss(fallback_path.to_string())),
            }
        }
        Err(e) => Err(e),
    }
}
