//! Artifact storage backends
//!
//! The serving path only needs three operations from a store, so cloud
//! object storage plugs in as another implementation of [`ArtifactStore`].

use crate::error::{SensorFaultError, Result};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::debug;

/// Storage backend trait
pub trait ArtifactStore: Send + Sync {
    /// Whether an artifact exists under `key`
    fn exists(&self, key: &str) -> Result<bool>;

    /// Upload a local file to `key`, deleting the local copy when `remove` is set
    fn put(&self, from_file: &Path, key: &str, remove: bool) -> Result<()>;

    /// Raw bytes stored under `key`
    fn get(&self, key: &str) -> Result<Vec<u8>>;
}

/// Local file system storage backend; keys are paths relative to `base_dir`
#[derive(Debug, Clone)]
pub struct LocalArtifactStore {
    base_dir: PathBuf,
}

impl LocalArtifactStore {
    pub fn new(base_dir: impl Into<PathBuf>) -> Self {
        Self {
            base_dir: base_dir.into(),
        }
    }

    pub fn base_dir(&self) -> &Path {
        &self.base_dir
    }

    fn key_path(&self, key: &str) -> Result<PathBuf> {
        let relative = Path::new(key);
        if key.is_empty()
            || relative.is_absolute()
            || relative.components().any(|c| matches!(c, std::path::Component::ParentDir))
        {
            return Err(SensorFaultError::StorageError(format!("invalid artifact key '{}'", key)));
        }
        Ok(self.base_dir.join(relative))
    }
}

impl ArtifactStore for LocalArtifactStore {
    fn exists(&self, key: &str) -> Result<bool> {
        Ok(self.key_path(key)?.is_file())
    }

    fn put(&self, from_file: &Path, key: &str, remove: bool) -> Result<()> {
        let target = self.key_path(key)?;
        if let Some(parent) = target.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::copy(from_file, &target).map_err(|e| {
            SensorFaultError::StorageError(format!("failed to store {}: {}", from_file.display(), e))
        })?;
        if remove {
            fs::remove_file(from_file)?;
        }
        debug!(key, path = %target.display(), "Stored artifact");
        Ok(())
    }

    fn get(&self, key: &str) -> Result<Vec<u8>> {
        let path = self.key_path(key)?;
        fs::read(&path).map_err(|e| SensorFaultError::StorageError(format!("failed to read '{}': {}", key, e)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_put_get_exists() {
        let dir = tempfile::tempdir().unwrap();
        let src = dir.path().join("model.bin");
        fs::write(&src, b"bytes").unwrap();

        let store = LocalArtifactStore::new(dir.path().join("store"));
        assert!(!store.exists("models/model.bin").unwrap());

        store.put(&src, "models/model.bin", true).unwrap();
        assert!(store.exists("models/model.bin").unwrap());
        assert!(!src.exists());
        assert_eq!(store.get("models/model.bin").unwrap(), b"bytes");
    }

    #[test]
    fn test_rejects_escaping_keys() {
        let store = LocalArtifactStore::new("store");
        assert!(matches!(store.exists("../x"), Err(SensorFaultError::StorageError(_))));
        assert!(store.get("missing.bin").is_err());
    }
}
