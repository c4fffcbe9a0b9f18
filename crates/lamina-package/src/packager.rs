//! The packaging collaborator used when a function's code comes from a
//! local source tree.

use std::path::{Path, PathBuf};

use lamina_common::error::Result;
use lamina_common::types::Sha256Hash;

use crate::archive::build_archive;
use crate::hash::hash_bytes;
use crate::storage::ArtifactStore;

/// A packaged, content-addressed function artifact.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PackagedArtifact {
    /// Location of the archive on disk.
    pub path: PathBuf,
    /// Hash of the archive bytes, used for change detection.
    pub content_hash: Sha256Hash,
    /// Archive size in bytes.
    pub size_bytes: u64,
}

/// Turns a source tree into a deployable artifact.
pub trait Packager {
    /// Packages `source`, skipping entries under any of `excludes`.
    ///
    /// # Errors
    ///
    /// Returns a collaborator error if the source is missing or any
    /// filesystem operation fails.
    fn package(&self, source: &Path, excludes: &[String]) -> Result<PackagedArtifact>;
}

/// Packages source trees as deterministic zip archives in an [`ArtifactStore`].
#[derive(Debug, Clone)]
pub struct ZipPackager {
    store: ArtifactStore,
}

impl ZipPackager {
    /// Creates a packager writing into `store`.
    #[must_use]
    pub const fn new(store: ArtifactStore) -> Self {
        Self { store }
    }

    /// Returns the backing store.
    #[must_use]
    pub const fn store(&self) -> &ArtifactStore {
        &self.store
    }
}

impl Packager for ZipPackager {
    fn package(&self, source: &Path, excludes: &[String]) -> Result<PackagedArtifact> {
        let bytes = build_archive(source, excludes)?;
        let content_hash = hash_bytes(&bytes)?;
        let path = self.store.put(&content_hash, &bytes)?;
        tracing::info!(
            source = %source.display(),
            artifact = %path.display(),
            hash = %content_hash,
            "source tree packaged"
        );
        Ok(PackagedArtifact {
            path,
            content_hash,
            size_bytes: bytes.len() as u64,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn packager(dir: &Path) -> ZipPackager {
        ZipPackager::new(ArtifactStore::open(dir.join("builds")).expect("store"))
    }

    #[test]
    fn package_writes_hash_named_artifact() {
        let dir = tempfile::tempdir().expect("tempdir");
        let src = dir.path().join("src");
        std::fs::create_dir_all(&src).expect("mkdir");
        std::fs::write(src.join("index.js"), b"exports.handler = async () => 1;").expect("write");

        let packager = packager(dir.path());
        let artifact = packager.package(&src, &[]).expect("package");
        assert!(artifact.path.is_file());
        assert!(artifact.size_bytes > 0);
        assert_eq!(
            artifact.path,
            packager.store().artifact_path(&artifact.content_hash)
        );
        crate::hash::validate_hash(&artifact.path, &artifact.content_hash).expect("hash matches");
    }

    #[test]
    fn unchanged_tree_yields_same_hash() {
        let dir = tempfile::tempdir().expect("tempdir");
        let src = dir.path().join("src");
        std::fs::create_dir_all(&src).expect("mkdir");
        std::fs::write(src.join("app.py"), b"x = 1").expect("write");

        let packager = packager(dir.path());
        let first = packager.package(&src, &[]).expect("first");
        let second = packager.package(&src, &[]).expect("second");
        assert_eq!(first.content_hash, second.content_hash);

        std::fs::write(src.join("app.py"), b"x = 2").expect("rewrite");
        let third = packager.package(&src, &[]).expect("third");
        assert_ne!(first.content_hash, third.content_hash);
    }

    #[test]
    fn missing_source_surfaces_collaborator_error() {
        let dir = tempfile::tempdir().expect("tempdir");
        let err = packager(dir.path())
            .package(&dir.path().join("nope"), &[])
            .unwrap_err();
        assert!(err.is_collaborator());
    }
}
