//! Content-addressed store for packaged artifacts.
//!
//! Artifacts live at `<root>/<sha256-hex>.zip`, so identical source trees
//! share one file and a changed tree always lands at a new path.

use std::path::{Path, PathBuf};

use lamina_common::constants::ARTIFACT_EXTENSION;
use lamina_common::error::{LaminaError, Result};
use lamina_common::types::Sha256Hash;

/// Manages the on-disk directory of packaged artifacts.
#[derive(Debug, Clone)]
pub struct ArtifactStore {
    /// Root directory for all stored artifacts.
    root: PathBuf,
}

impl ArtifactStore {
    /// Opens or initializes the store at the given root.
    ///
    /// # Errors
    ///
    /// Returns an error if the directory cannot be created.
    pub fn open(root: impl Into<PathBuf>) -> Result<Self> {
        let root = root.into();
        tracing::info!(path = %root.display(), "opening artifact store");
        std::fs::create_dir_all(&root).map_err(|e| LaminaError::Io {
            path: root.clone(),
            source: e,
        })?;
        Ok(Self { root })
    }

    /// Returns the path of the artifact with the given hash.
    #[must_use]
    pub fn artifact_path(&self, hash: &Sha256Hash) -> PathBuf {
        self.root
            .join(format!("{}.{ARTIFACT_EXTENSION}", hash.as_hex()))
    }

    /// Checks whether an artifact with the given hash is already stored.
    #[must_use]
    pub fn has_artifact(&self, hash: &Sha256Hash) -> bool {
        self.artifact_path(hash).is_file()
    }

    /// Stores `bytes` under `hash`, skipping the write when already present.
    ///
    /// # Errors
    ///
    /// Returns an error if the artifact cannot be written.
    pub fn put(&self, hash: &Sha256Hash, bytes: &[u8]) -> Result<PathBuf> {
        let path = self.artifact_path(hash);
        if self.has_artifact(hash) {
            tracing::debug!(path = %path.display(), "artifact already stored");
            return Ok(path);
        }
        std::fs::write(&path, bytes).map_err(|e| LaminaError::Io {
            path: path.clone(),
            source: e,
        })?;
        tracing::info!(path = %path.display(), size = bytes.len(), "artifact stored");
        Ok(path)
    }

    /// Returns the root storage path.
    #[must_use]
    pub fn root(&self) -> &Path {
        &self.root
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_hash() -> Sha256Hash {
        Sha256Hash::from_hex("ab".repeat(32)).expect("hex")
    }

    #[test]
    fn open_creates_missing_root() {
        let dir = tempfile::tempdir().expect("tempdir");
        let root = dir.path().join("nested/builds");
        let store = ArtifactStore::open(&root).expect("open");
        assert!(root.is_dir());
        assert_eq!(store.root(), root);
    }

    #[test]
    fn artifact_path_is_content_addressed() {
        let dir = tempfile::tempdir().expect("tempdir");
        let store = ArtifactStore::open(dir.path()).expect("open");
        let path = store.artifact_path(&sample_hash());
        assert!(path.ends_with(format!("{}.zip", "ab".repeat(32))));
    }

    #[test]
    fn put_writes_once() {
        let dir = tempfile::tempdir().expect("tempdir");
        let store = ArtifactStore::open(dir.path()).expect("open");
        let hash = sample_hash();
        assert!(!store.has_artifact(&hash));

        let path = store.put(&hash, b"first").expect("put");
        assert!(store.has_artifact(&hash));

        let again = store.put(&hash, b"second").expect("put again");
        assert_eq!(path, again);
        assert_eq!(std::fs::read(&path).expect("read"), b"first");
    }
}
