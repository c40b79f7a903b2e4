//! Asset manifest model.
//!
//! The manifest is the fixed, ordered list of URLs precached at install
//! time, together with the version string that names the cache bucket.
//! Staleness is decided by exact name match against this version, so the
//! version must be bumped whenever the asset list changes.

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::Error;

/// The fixed set of assets precached at install time.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AssetManifest {
    /// Version string; doubles as the cache bucket name (e.g. "shell-v1").
    pub version: String,

    /// Ordered list of absolute paths to precache.
    pub assets: Vec<String>,
}

impl Default for AssetManifest {
    fn default() -> Self {
        Self {
            version: "shell-v1".to_string(),
            assets: vec![
                "/".to_string(),
                "/index.html".to_string(),
                "/styles.css".to_string(),
                "/app.js".to_string(),
            ],
        }
    }
}

impl AssetManifest {
    /// Load a manifest from a JSON file.
    ///
    /// # Errors
    ///
    /// Returns `Error::Manifest` if the file cannot be read or parsed,
    /// or if the parsed manifest fails validation.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, Error> {
        let path = path.as_ref();
        let contents = std::fs::read_to_string(path)
            .map_err(|e| Error::Manifest(format!("failed to read {}: {e}", path.display())))?;
        let manifest: Self =
            serde_json::from_str(&contents).map_err(|e| Error::Manifest(format!("failed to parse: {e}")))?;
        manifest.validate()?;
        Ok(manifest)
    }

    /// Validate manifest invariants.
    ///
    /// # Errors
    ///
    /// Returns `Error::Manifest` if:
    /// - the version string is empty
    /// - the asset list is empty
    /// - any asset path is not absolute (does not start with `/`)
    /// - the asset list contains duplicates
    pub fn validate(&self) -> Result<(), Error> {
        if self.version.is_empty() {
            return Err(Error::Manifest("version must not be empty".into()));
        }

        if self.assets.is_empty() {
            return Err(Error::Manifest("asset list must not be empty".into()));
        }

        for asset in &self.assets {
            if !asset.starts_with('/') {
                return Err(Error::Manifest(format!("asset path must be absolute: {asset}")));
            }
        }

        let mut seen = std::collections::HashSet::new();
        for asset in &self.assets {
            if !seen.insert(asset.as_str()) {
                return Err(Error::Manifest(format!("duplicate asset path: {asset}")));
            }
        }

        Ok(())
    }

    /// Whether the manifest precaches the given path.
    pub fn contains(&self, path: &str) -> bool {
        self.assets.iter().any(|a| a == path)
    }
}
