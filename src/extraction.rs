//! Zip archive extraction
//!
//! Accepts the raw byte blob of a branch archive and unpacks it into a
//! destination directory, creating parent directories as needed. Entries
//! whose names escape the destination (zip-slip) are skipped.

use crate::error::SnapshotError;
use std::io::Cursor;
use std::path::Path;
use tracing::{debug, warn};

/// Extract a zip archive held in memory into `dest`
///
/// Returns the number of files written. A byte blob that is not a valid zip
/// container is an extraction error; the caller isolates it to the one
/// repository task it belongs to.
pub fn extract_zip(bytes: &[u8], dest: &Path) -> Result<usize, SnapshotError> {
    let extraction_err = |reason: String| SnapshotError::Extraction {
        dest: dest.to_path_buf(),
        reason,
    };
    let io_err = |e: std::io::Error| SnapshotError::Io {
        dest: dest.to_path_buf(),
        source: e,
    };

    let mut archive = zip::ZipArchive::new(Cursor::new(bytes))
        .map_err(|e| extraction_err(format!("failed to read zip archive: {e}")))?;

    std::fs::create_dir_all(dest).map_err(io_err)?;

    let mut extracted = 0;
    for i in 0..archive.len() {
        let mut file = archive
            .by_index(i)
            .map_err(|e| extraction_err(format!("failed to read zip entry {i}: {e}")))?;

        // enclosed_name() is None for entries that would escape dest
        let rel_path = match file.enclosed_name() {
            Some(path) => path.to_path_buf(),
            None => {
                warn!(entry = %file.name(), "skipping zip entry with unsafe path");
                continue;
            }
        };
        let out_path = dest.join(rel_path);

        if file.is_dir() {
            std::fs::create_dir_all(&out_path).map_err(io_err)?;
        } else {
            if let Some(parent) = out_path.parent() {
                std::fs::create_dir_all(parent).map_err(io_err)?;
            }
            let mut out_file = std::fs::File::create(&out_path).map_err(io_err)?;
            std::io::copy(&mut file, &mut out_file).map_err(io_err)?;
            extracted += 1;
        }
    }

    debug!(?dest, extracted, "zip extraction complete");
    Ok(extracted)
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use std::io::Write;

    /// Build an in-memory zip with the given (name, content) file entries
    fn build_zip(entries: &[(&str, &str)]) -> Vec<u8> {
        let mut writer = zip::ZipWriter::new(Cursor::new(Vec::new()));
        let options = zip::write::FileOptions::default()
            .compression_method(zip::CompressionMethod::Stored);
        for (name, content) in entries {
            writer.start_file(*name, options).unwrap();
            writer.write_all(content.as_bytes()).unwrap();
        }
        writer.finish().unwrap().into_inner()
    }

    #[test]
    fn extracts_nested_tree() {
        let temp = tempfile::tempdir().unwrap();
        let dest = temp.path().join("acme-widget");
        let bytes = build_zip(&[
            ("widget-master/README.md", "# widget"),
            ("widget-master/src/main.tf", "resource {}"),
        ]);

        let count = extract_zip(&bytes, &dest).unwrap();
        assert_eq!(count, 2);

        let readme = std::fs::read_to_string(dest.join("widget-master/README.md")).unwrap();
        assert_eq!(readme, "# widget");

        let files = walkdir::WalkDir::new(&dest)
            .into_iter()
            .filter_map(|e| e.ok())
            .filter(|e| e.file_type().is_file())
            .count();
        assert_eq!(files, 2);
    }

    #[test]
    fn creates_destination_and_parents() {
        let temp = tempfile::tempdir().unwrap();
        let dest = temp.path().join("deep/nested/acme-widget");
        let bytes = build_zip(&[("file.txt", "hello")]);

        extract_zip(&bytes, &dest).unwrap();
        assert!(dest.join("file.txt").is_file());
    }

    #[test]
    fn rejects_corrupt_archive() {
        let temp = tempfile::tempdir().unwrap();
        let dest = temp.path().join("acme-widget");

        let err = extract_zip(b"definitely not a zip", &dest).unwrap_err();
        assert!(matches!(err, SnapshotError::Extraction { .. }));
    }

    #[test]
    fn empty_archive_extracts_zero_files() {
        let temp = tempfile::tempdir().unwrap();
        let dest = temp.path().join("acme-widget");
        let bytes = build_zip(&[]);

        let count = extract_zip(&bytes, &dest).unwrap();
        assert_eq!(count, 0);
        // Destination directory is still created
        assert!(dest.is_dir());
    }

    #[test]
    fn skips_entries_that_escape_destination() {
        let temp = tempfile::tempdir().unwrap();
        let dest = temp.path().join("inner").join("acme-widget");
        let bytes = build_zip(&[("../escape.txt", "nope"), ("safe.txt", "ok")]);

        let count = extract_zip(&bytes, &dest).unwrap();
        assert_eq!(count, 1);
        assert!(dest.join("safe.txt").is_file());
        assert!(!temp.path().join("inner/escape.txt").exists());
    }
}
