//! JSON snapshot persistence.
//!
//! One document holds the whole catalog. Saves go through a temp file in the
//! same directory followed by a rename, so a failed write leaves the prior
//! snapshot untouched and readers never observe a partial document.

use std::fs;
use std::path::{Path, PathBuf};

use tracing::debug;

use super::{CatalogError, CatalogSnapshot};

/// Store for the catalog snapshot document.
pub struct JsonCatalogStore {
    path: PathBuf,
}

impl JsonCatalogStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Load and validate the snapshot.
    ///
    /// Rejects documents whose `total_repos` disagrees with the record count.
    pub fn load(&self) -> Result<CatalogSnapshot, CatalogError> {
        let data = fs::read_to_string(&self.path).map_err(|e| {
            CatalogError::Io(format!("read {}: {}", self.path.display(), e))
        })?;

        let snapshot: CatalogSnapshot = serde_json::from_str(&data)
            .map_err(|e| CatalogError::Corrupt(format!("{}: {}", self.path.display(), e)))?;

        if !snapshot.is_consistent() {
            return Err(CatalogError::Corrupt(format!(
                "total_repos is {} but document holds {} records",
                snapshot.total_repos,
                snapshot.repos.len()
            )));
        }

        debug!(
            path = %self.path.display(),
            repos = snapshot.repos.len(),
            "Loaded catalog snapshot"
        );
        Ok(snapshot)
    }

    /// Persist the snapshot atomically.
    pub fn save(&self, snapshot: &CatalogSnapshot) -> Result<(), CatalogError> {
        if !snapshot.is_consistent() {
            return Err(CatalogError::Corrupt(format!(
                "refusing to persist snapshot with total_repos {} over {} records",
                snapshot.total_repos,
                snapshot.repos.len()
            )));
        }

        let data = serde_json::to_string_pretty(snapshot)
            .map_err(|e| CatalogError::Io(format!("serialize snapshot: {}", e)))?;

        let tmp = self.path.with_extension("json.tmp");
        fs::write(&tmp, data)
            .map_err(|e| CatalogError::Io(format!("write {}: {}", tmp.display(), e)))?;
        fs::rename(&tmp, &self.path).map_err(|e| {
            // Leave no stray temp file behind on a failed rename.
            let _ = fs::remove_file(&tmp);
            CatalogError::Io(format!("rename into {}: {}", self.path.display(), e))
        })?;

        debug!(
            path = %self.path.display(),
            repos = snapshot.repos.len(),
            "Saved catalog snapshot"
        );
        Ok(())
    }
}
