//! Deterministic zip archives of function source trees.
//!
//! Entries are written in sorted path order with a fixed timestamp, so the
//! same tree always produces byte-identical archives and therefore the same
//! content hash.

use std::io::{Cursor, Write};
use std::path::Path;

use lamina_common::error::{LaminaError, Result};
use walkdir::WalkDir;
use zip::write::SimpleFileOptions;

/// Builds a zip archive of `source` in memory.
///
/// `source` may be a directory (its contents become the archive root) or a
/// single file (stored under its file name). Entries whose relative path
/// equals or lies below one of `excludes` are skipped.
///
/// # Errors
///
/// Returns an error if `source` does not exist, cannot be read, or the
/// archive cannot be written.
pub fn build_archive(source: &Path, excludes: &[String]) -> Result<Vec<u8>> {
    tracing::info!(source = %source.display(), "building archive");

    if !source.exists() {
        return Err(LaminaError::Packaging {
            message: format!("source path does not exist: {}", source.display()),
        });
    }

    let mut writer = zip::ZipWriter::new(Cursor::new(Vec::new()));
    let mut entries = 0_usize;

    if source.is_file() {
        let name = source
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .ok_or_else(|| LaminaError::Packaging {
                message: format!("source file has no name: {}", source.display()),
            })?;
        add_file(&mut writer, source, &name)?;
        entries += 1;
    } else {
        let walker = WalkDir::new(source)
            .min_depth(1)
            .sort_by_file_name()
            .into_iter()
            .filter_entry(|e| !is_excluded(&relative_name(source, e.path()), excludes));

        for entry in walker {
            let entry = entry.map_err(|e| LaminaError::Packaging {
                message: format!("failed to walk {}: {e}", source.display()),
            })?;
            let name = relative_name(source, entry.path());
            if entry.file_type().is_dir() {
                writer
                    .add_directory(format!("{name}/"), entry_options(0o755))
                    .map_err(zip_err)?;
            } else {
                add_file(&mut writer, entry.path(), &name)?;
                entries += 1;
            }
        }
    }

    let bytes = writer.finish().map_err(zip_err)?.into_inner();
    tracing::debug!(files = entries, size = bytes.len(), "archive built");
    Ok(bytes)
}

fn add_file(writer: &mut zip::ZipWriter<Cursor<Vec<u8>>>, path: &Path, name: &str) -> Result<()> {
    let contents = std::fs::read(path).map_err(|e| LaminaError::Io {
        path: path.to_path_buf(),
        source: e,
    })?;
    writer
        .start_file(name, entry_options(file_mode(path)))
        .map_err(zip_err)?;
    writer.write_all(&contents).map_err(|e| LaminaError::Io {
        path: path.to_path_buf(),
        source: e,
    })
}

fn entry_options(mode: u32) -> SimpleFileOptions {
    SimpleFileOptions::default()
        .compression_method(zip::CompressionMethod::Deflated)
        .last_modified_time(zip::DateTime::default())
        .unix_permissions(mode)
}

#[cfg(unix)]
fn file_mode(path: &Path) -> u32 {
    use std::os::unix::fs::PermissionsExt;

    let executable = std::fs::metadata(path).is_ok_and(|m| m.permissions().mode() & 0o111 != 0);
    if executable { 0o755 } else { 0o644 }
}

#[cfg(not(unix))]
const fn file_mode(_path: &Path) -> u32 {
    0o644
}

/// Returns the archive entry name of `path` relative to `root`, using `/`
/// separators on every platform.
fn relative_name(root: &Path, path: &Path) -> String {
    path.strip_prefix(root)
        .unwrap_or(path)
        .components()
        .map(|c| c.as_os_str().to_string_lossy())
        .collect::<Vec<_>>()
        .join("/")
}

fn is_excluded(name: &str, excludes: &[String]) -> bool {
    excludes.iter().any(|prefix| {
        let prefix = prefix.trim_end_matches('/');
        !prefix.is_empty()
            && (name == prefix
                || name
                    .strip_prefix(prefix)
                    .is_some_and(|rest| rest.starts_with('/')))
    })
}

fn zip_err(e: zip::result::ZipError) -> LaminaError {
    LaminaError::Packaging {
        message: format!("zip archive error: {e}"),
    }
}

#[cfg(test)]
mod tests {
    use std::io::Read;

    use super::*;

    fn create_tree(dir: &Path) {
        std::fs::create_dir_all(dir.join("pkg/nested")).expect("mkdir");
        std::fs::create_dir_all(dir.join("node_modules/dep")).expect("mkdir");
        std::fs::write(dir.join("index.py"), b"def handler(e, c): pass").expect("write");
        std::fs::write(dir.join("pkg/nested/util.py"), b"X = 1").expect("write");
        std::fs::write(dir.join("node_modules/dep/a.js"), b"skip").expect("write");
    }

    fn entry_names(bytes: Vec<u8>) -> Vec<String> {
        let archive = zip::ZipArchive::new(Cursor::new(bytes)).expect("open archive");
        archive.file_names().map(ToOwned::to_owned).collect()
    }

    #[test]
    fn archive_contains_relative_paths() {
        let dir = tempfile::tempdir().expect("tempdir");
        create_tree(dir.path());

        let bytes = build_archive(dir.path(), &[]).expect("archive");
        let names = entry_names(bytes);
        assert!(names.contains(&"index.py".to_owned()), "got: {names:?}");
        assert!(names.contains(&"pkg/nested/util.py".to_owned()), "got: {names:?}");
    }

    #[test]
    fn archive_is_deterministic() {
        let dir = tempfile::tempdir().expect("tempdir");
        create_tree(dir.path());

        let first = build_archive(dir.path(), &[]).expect("first");
        let second = build_archive(dir.path(), &[]).expect("second");
        assert_eq!(first, second);
    }

    #[test]
    fn excluded_prefixes_are_skipped() {
        let dir = tempfile::tempdir().expect("tempdir");
        create_tree(dir.path());

        let bytes = build_archive(dir.path(), &["node_modules/".to_owned()]).expect("archive");
        let names = entry_names(bytes);
        assert!(names.iter().all(|n| !n.starts_with("node_modules")), "got: {names:?}");
        assert!(names.contains(&"index.py".to_owned()));
    }

    #[test]
    fn single_file_source_is_stored_by_name() {
        let dir = tempfile::tempdir().expect("tempdir");
        let file = dir.path().join("main.py");
        std::fs::write(&file, b"print('hi')").expect("write");

        let bytes = build_archive(&file, &[]).expect("archive");
        let mut archive = zip::ZipArchive::new(Cursor::new(bytes)).expect("open");
        let mut entry = archive.by_name("main.py").expect("entry");
        let mut content = String::new();
        let _ = entry.read_to_string(&mut content).expect("read");
        assert_eq!(content, "print('hi')");
    }

    #[test]
    fn missing_source_is_packaging_error() {
        let dir = tempfile::tempdir().expect("tempdir");
        let err = build_archive(&dir.path().join("missing"), &[]).unwrap_err();
        assert!(err.is_collaborator());
        assert!(err.to_string().contains("does not exist"));
    }

    #[test]
    fn is_excluded_matches_whole_segments() {
        let excludes = vec!["tests".to_owned()];
        assert!(is_excluded("tests", &excludes));
        assert!(is_excluded("tests/unit.py", &excludes));
        assert!(!is_excluded("tests_helper.py", &excludes));
    }
}
