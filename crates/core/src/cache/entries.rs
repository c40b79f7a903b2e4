//! Entry CRUD operations.
//!
//! Entries map a request URL to a full captured response within one
//! bucket. Puts are idempotent upserts, so concurrent fetch handlers
//! racing to cache the same URL converge on the same row without
//! coordination.

use super::connection::CacheDb;
use crate::Error;
use serde::{Deserialize, Serialize};
use tokio_rusqlite::params;
use tokio_rusqlite::rusqlite;

/// A captured HTTP response stored for offline replay.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StoredResponse {
    pub url: String,
    pub status: u16,
    pub content_type: Option<String>,
    pub body: Vec<u8>,
    pub stored_at: String,
}

impl StoredResponse {
    /// Build a response captured now.
    pub fn new(url: impl Into<String>, status: u16, content_type: Option<String>, body: Vec<u8>) -> Self {
        Self {
            url: url.into(),
            status,
            content_type,
            body,
            stored_at: chrono::Utc::now().to_rfc3339(),
        }
    }
}

impl CacheDb {
    /// Insert or update a cached response.
    ///
    /// Uses UPSERT semantics keyed on (bucket, url): inserts if absent,
    /// replaces the captured response if present.
    pub async fn put_entry(&self, bucket: &str, response: &StoredResponse) -> Result<(), Error> {
        let bucket = bucket.to_string();
        let response = response.clone();
        self.conn
            .call(move |conn| -> Result<(), Error> {
                conn.execute(
                    "INSERT INTO entries (
                        bucket, url, status, content_type, body, stored_at
                    ) VALUES (?1, ?2, ?3, ?4, ?5, ?6)
                    ON CONFLICT(bucket, url) DO UPDATE SET
                        status = excluded.status,
                        content_type = excluded.content_type,
                        body = excluded.body,
                        stored_at = excluded.stored_at",
                    params![
                        &bucket,
                        &response.url,
                        response.status as i64,
                        &response.content_type,
                        &response.body,
                        &response.stored_at,
                    ],
                )?;
                Ok(())
            })
            .await
            .map_err(Error::from)
    }

    /// Look up a cached response by URL within a bucket.
    ///
    /// Returns None on a cache miss.
    pub async fn match_entry(&self, bucket: &str, url: &str) -> Result<Option<StoredResponse>, Error> {
        let bucket = bucket.to_string();
        let url = url.to_string();
        self.conn
            .call(move |conn| -> Result<Option<StoredResponse>, Error> {
                let mut stmt = conn.prepare(
                    "SELECT url, status, content_type, body, stored_at
                     FROM entries WHERE bucket = ?1 AND url = ?2",
                )?;

                let result = stmt.query_row(params![bucket, url], |row| {
                    Ok(StoredResponse {
                        url: row.get(0)?,
                        status: row.get::<_, i64>(1)? as u16,
                        content_type: row.get(2)?,
                        body: row.get(3)?,
                        stored_at: row.get(4)?,
                    })
                });

                match result {
                    Ok(r) => Ok(Some(r)),
                    Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
                    Err(e) => Err(e.into()),
                }
            })
            .await
            .map_err(Error::from)
    }

    /// List the URLs stored in a bucket, in insertion order.
    pub async fn entry_urls(&self, bucket: &str) -> Result<Vec<String>, Error> {
        let bucket = bucket.to_string();
        self.conn
            .call(move |conn| -> Result<Vec<String>, Error> {
                let mut stmt =
                    conn.prepare("SELECT url FROM entries WHERE bucket = ?1 ORDER BY rowid ASC")?;
                let urls = stmt
                    .query_map(params![bucket], |row| row.get::<_, String>(0))?
                    .collect::<Result<Vec<_>, _>>()?;
                Ok(urls)
            })
            .await
            .map_err(Error::from)
    }
}
