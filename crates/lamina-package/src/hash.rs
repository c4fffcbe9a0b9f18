//! SHA-256 content hashing.
//!
//! The content hash of a packaged artifact is what the provisioning engine
//! compares to decide whether function code changed.

use std::io::Read;
use std::path::Path;

use lamina_common::error::{LaminaError, Result};
use lamina_common::types::Sha256Hash;
use sha2::{Digest, Sha256};

/// Computes the SHA-256 hash of an in-memory buffer.
///
/// # Errors
///
/// Returns an error only if the digest cannot be represented as hex,
/// which does not happen for SHA-256 output.
pub fn hash_bytes(bytes: &[u8]) -> Result<Sha256Hash> {
    let digest = Sha256::digest(bytes);
    Sha256Hash::from_hex(format!("{digest:x}"))
}

/// Computes the SHA-256 hash of a file.
///
/// # Errors
///
/// Returns an error if the file cannot be read.
pub fn hash_file(path: &Path) -> Result<Sha256Hash> {
    tracing::debug!(path = %path.display(), "computing SHA-256 hash");
    let io_err = |source| LaminaError::Io {
        path: path.to_path_buf(),
        source,
    };

    let mut file = std::fs::File::open(path).map_err(io_err)?;
    let mut hasher = Sha256::new();
    let mut buf = [0_u8; 8192];
    loop {
        let read = file.read(&mut buf).map_err(io_err)?;
        if read == 0 {
            break;
        }
        hasher.update(&buf[..read]);
    }
    Sha256Hash::from_hex(format!("{:x}", hasher.finalize()))
}

/// Validates that a file matches the expected SHA-256 hash.
///
/// # Errors
///
/// Returns `LaminaError::Packaging` if the hashes do not match.
pub fn validate_hash(path: &Path, expected: &Sha256Hash) -> Result<()> {
    tracing::debug!(path = %path.display(), "validating SHA-256 hash");
    let actual = hash_file(path)?;
    if &actual != expected {
        return Err(LaminaError::Packaging {
            message: format!(
                "hash mismatch for {}: expected {expected}, got {actual}",
                path.display()
            ),
        });
    }
    Ok(())
}
