//! Bucket lifecycle operations.
//!
//! A bucket is a named key-value store holding the cached responses for
//! one manifest version. At most one bucket should survive activation;
//! every bucket whose name differs from the current version is stale.

use super::connection::CacheDb;
use crate::Error;
use tokio_rusqlite::params;

impl CacheDb {
    /// Open a bucket, creating it if absent.
    ///
    /// Opening an existing bucket is a no-op; entries it already holds
    /// are preserved.
    pub async fn open_bucket(&self, name: &str) -> Result<(), Error> {
        if name.is_empty() {
            return Err(Error::InvalidInput("bucket name cannot be empty".into()));
        }

        let name = name.to_string();
        let created_at = chrono::Utc::now().to_rfc3339();
        self.conn
            .call(move |conn| -> Result<(), Error> {
                conn.execute(
                    "INSERT OR IGNORE INTO buckets (name, created_at) VALUES (?1, ?2)",
                    params![name, created_at],
                )?;
                Ok(())
            })
            .await
            .map_err(Error::from)
    }

    /// Enumerate all bucket names, oldest first.
    pub async fn bucket_names(&self) -> Result<Vec<String>, Error> {
        self.conn
            .call(|conn| -> Result<Vec<String>, Error> {
                let mut stmt = conn.prepare("SELECT name FROM buckets ORDER BY created_at ASC, name ASC")?;
                let names = stmt
                    .query_map([], |row| row.get::<_, String>(0))?
                    .collect::<Result<Vec<_>, _>>()?;
                Ok(names)
            })
            .await
            .map_err(Error::from)
    }

    /// Delete a bucket and, via cascade, every entry it holds.
    ///
    /// Returns true if the bucket existed.
    pub async fn delete_bucket(&self, name: &str) -> Result<bool, Error> {
        let name = name.to_string();
        self.conn
            .call(move |conn| -> Result<bool, Error> {
                let deleted = conn.execute("DELETE FROM buckets WHERE name = ?1", params![name])?;
                Ok(deleted > 0)
            })
            .await
            .map_err(Error::from)
    }

    /// Number of entries currently stored in a bucket.
    pub async fn entry_count(&self, bucket: &str) -> Result<u64, Error> {
        let bucket = bucket.to_string();
        self.conn
            .call(move |conn| -> Result<u64, Error> {
                let count: i64 =
                    conn.query_row("SELECT COUNT(*) FROM entries WHERE bucket = ?1", params![bucket], |row| {
                        row.get(0)
                    })?;
                Ok(count as u64)
            })
            .await
            .map_err(Error::from)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_open_and_enumerate() {
        let db = CacheDb::open_in_memory().await.unwrap();
        db.open_bucket("shell-v1").await.unwrap();
        db.open_bucket("shell-v2").await.unwrap();

        let names = db.bucket_names().await.unwrap();
        assert_eq!(names, vec!["shell-v1".to_string(), "shell-v2".to_string()]);
    }

    #[tokio::test]
    async fn test_open_is_idempotent() {
        let db = CacheDb::open_in_memory().await.unwrap();
        db.open_bucket("shell-v1").await.unwrap();
        db.open_bucket("shell-v1").await.unwrap();

        let names = db.bucket_names().await.unwrap();
        assert_eq!(names.len(), 1);
    }

    #[tokio::test]
    async fn test_open_rejects_empty_name() {
        let db = CacheDb::open_in_memory().await.unwrap();
        let result = db.open_bucket("").await;
        assert!(matches!(result, Err(Error::InvalidInput(_))));
    }

    #[tokio::test]
    async fn test_delete_missing_bucket() {
        let db = CacheDb::open_in_memory().await.unwrap();
        let existed = db.delete_bucket("nonexistent").await.unwrap();
        assert!(!existed);
    }

    #[tokio::test]
    async fn test_delete_existing_bucket() {
        let db = CacheDb::open_in_memory().await.unwrap();
        db.open_bucket("shell-v1").await.unwrap();

        let existed = db.delete_bucket("shell-v1").await.unwrap();
        assert!(existed);
        assert!(db.bucket_names().await.unwrap().is_empty());
    }
}
