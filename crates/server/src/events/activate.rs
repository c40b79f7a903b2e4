//! Activate event handler.
//!
//! Removes every bucket whose name does not match the current manifest
//! version. Buckets are disjoint, so deletion order is irrelevant; a
//! failed deletion is logged and skipped rather than aborting
//! activation.

use shelter_core::{CacheDb, Error};

/// Result of stale-bucket cleanup.
#[derive(Debug)]
pub struct ActivateReport {
    /// The surviving bucket name (current version).
    pub kept: String,

    /// Stale buckets that were deleted.
    pub deleted: Vec<String>,

    /// Stale buckets whose deletion failed.
    pub failed: Vec<String>,
}

/// Implementation of the activate event.
pub async fn activate_impl(db: &CacheDb, current_version: &str) -> Result<ActivateReport, Error> {
    let names = db.bucket_names().await?;

    let mut deleted = Vec::new();
    let mut failed = Vec::new();

    for name in names {
        if name == current_version {
            continue;
        }

        match db.delete_bucket(&name).await {
            Ok(_) => {
                tracing::info!(bucket = %name, "deleted stale bucket");
                deleted.push(name);
            }
            Err(e) => {
                tracing::warn!(bucket = %name, error = %e, "failed to delete stale bucket");
                failed.push(name);
            }
        }
    }

    Ok(ActivateReport { kept: current_version.to_string(), deleted, failed })
}

#[cfg(test)]
mod tests {
    use super::*;
    use shelter_core::StoredResponse;

    #[tokio::test]
    async fn test_activate_removes_stale_buckets() {
        let db = CacheDb::open_in_memory().await.unwrap();
        db.open_bucket("shell-v1").await.unwrap();
        db.open_bucket("shell-v2").await.unwrap();
        db.open_bucket("shell-v3").await.unwrap();

        let report = activate_impl(&db, "shell-v3").await.unwrap();

        assert_eq!(report.kept, "shell-v3");
        assert_eq!(report.deleted, vec!["shell-v1".to_string(), "shell-v2".to_string()]);
        assert!(report.failed.is_empty());
        assert_eq!(db.bucket_names().await.unwrap(), vec!["shell-v3".to_string()]);
    }

    #[tokio::test]
    async fn test_activate_keeps_current_bucket_entries() {
        let db = CacheDb::open_in_memory().await.unwrap();
        db.open_bucket("shell-v1").await.unwrap();
        db.open_bucket("shell-v2").await.unwrap();
        db.put_entry(
            "shell-v2",
            &StoredResponse::new("/index.html", 200, Some("text/html".into()), b"<html>".to_vec()),
        )
        .await
        .unwrap();

        activate_impl(&db, "shell-v2").await.unwrap();

        assert!(db.match_entry("shell-v2", "/index.html").await.unwrap().is_some());
    }

    #[tokio::test]
    async fn test_activate_removes_stale_entries_via_cascade() {
        let db = CacheDb::open_in_memory().await.unwrap();
        db.open_bucket("shell-v1").await.unwrap();
        db.put_entry(
            "shell-v1",
            &StoredResponse::new("/index.html", 200, Some("text/html".into()), b"<html>".to_vec()),
        )
        .await
        .unwrap();
        db.open_bucket("shell-v2").await.unwrap();

        activate_impl(&db, "shell-v2").await.unwrap();

        // Recreate the old bucket name: the cascade must have emptied it.
        db.open_bucket("shell-v1").await.unwrap();
        assert_eq!(db.entry_count("shell-v1").await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_activate_on_first_install() {
        let db = CacheDb::open_in_memory().await.unwrap();
        db.open_bucket("shell-v1").await.unwrap();

        let report = activate_impl(&db, "shell-v1").await.unwrap();

        assert!(report.deleted.is_empty());
        assert_eq!(db.bucket_names().await.unwrap(), vec!["shell-v1".to_string()]);
    }
}
