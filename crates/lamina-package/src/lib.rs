//! # lamina-package
//!
//! Packaging collaborator for function code supplied as a local source tree.
//!
//! Handles:
//! - **Archive**: Deterministic zip archives of source trees.
//! - **Hashing**: SHA-256 content hashes for change detection.
//! - **Storage**: Content-addressed artifact directory.
//! - **Packager**: The [`Packager`] trait and its zip implementation.

#![cfg_attr(test, allow(clippy::expect_used, clippy::unwrap_used))]

pub mod archive;
pub mod hash;
pub mod packager;
pub mod storage;

pub use packager::{PackagedArtifact, Packager, ZipPackager};
pub use storage::ArtifactStore;
