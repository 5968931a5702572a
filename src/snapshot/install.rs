//! Snapshot installation
//!
//! Maps a repository reference to its deterministic destination directory
//! and unpacks fetched archive bytes there. The existence pre-check lives in
//! the orchestrator so a skip avoids the network call entirely; this module
//! only handles the disk side.

use crate::config::Config;
use crate::error::SnapshotError;
use crate::extraction::extract_zip;
use crate::types::RepoRef;
use std::path::PathBuf;
use tracing::debug;

/// Destination directory for a repository snapshot:
/// `<destination_dir>/terraform-registry-watch/<owner>-<name>`
pub fn snapshot_dir(config: &Config, repo: &RepoRef) -> PathBuf {
    config.snapshot_root().join(repo.folder_name())
}

/// Unpack fetched archive bytes into the destination directory
///
/// Extraction is synchronous zip + filesystem work, so it runs on the
/// blocking pool. Returns the number of files written.
pub async fn install(bytes: Vec<u8>, dest: PathBuf) -> Result<usize, SnapshotError> {
    debug!(?dest, size = bytes.len(), "installing snapshot");

    let extract_dest = dest.clone();
    tokio::task::spawn_blocking(move || extract_zip(&bytes, &extract_dest))
        .await
        .map_err(|e| SnapshotError::Extraction {
            dest,
            reason: format!("extraction task failed: {e}"),
        })?
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use std::io::Write;

    fn sample_zip() -> Vec<u8> {
        let mut writer = zip::ZipWriter::new(std::io::Cursor::new(Vec::new()));
        let options = zip::write::FileOptions::default()
            .compression_method(zip::CompressionMethod::Stored);
        writer.start_file("widget-master/main.tf", options).unwrap();
        writer.write_all(b"resource {}").unwrap();
        writer.finish().unwrap().into_inner()
    }

    #[test]
    fn snapshot_dir_is_derived_from_owner_and_name() {
        let config = Config {
            destination_dir: PathBuf::from("/data"),
            ..Default::default()
        };
        let repo = RepoRef::parse("https://github.com/acme/widget").unwrap();
        assert_eq!(
            snapshot_dir(&config, &repo),
            PathBuf::from("/data/terraform-registry-watch/acme-widget")
        );
    }

    #[tokio::test]
    async fn install_unpacks_archive() {
        let temp = tempfile::tempdir().unwrap();
        let dest = temp.path().join("acme-widget");

        let count = install(sample_zip(), dest.clone()).await.unwrap();
        assert_eq!(count, 1);
        assert!(dest.join("widget-master/main.tf").is_file());
    }

    #[tokio::test]
    async fn install_rejects_corrupt_bytes() {
        let temp = tempfile::tempdir().unwrap();
        let dest = temp.path().join("acme-widget");

        let err = install(b"not a zip".to_vec(), dest).await.unwrap_err();
        assert!(matches!(err, SnapshotError::Extraction { .. }));
    }
}
