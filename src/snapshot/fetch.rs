//! Archive fetching with branch fallback
//!
//! Repositories publish their default branch as either `master` or `main`,
//! and the registry does not say which. The fetch is therefore an explicit
//! two-step state machine: try the primary branch, and on a 404 try the
//! secondary exactly once. A 404 on the secondary is terminal; no other
//! status triggers a retry.

use crate::error::SnapshotError;
use crate::types::RepoRef;
use tracing::debug;

/// Outcome of fetching one branch archive
///
/// Not-found is an expected outcome, distinct from transport and status
/// errors: it is the signal that drives the one sanctioned fallback.
#[derive(Clone, Debug)]
pub enum ArchiveFetch {
    /// The archive exists; its raw bytes
    Fetched(Vec<u8>),
    /// The branch does not exist (HTTP 404)
    NotFound,
}

/// Fetch the zip archive of one branch of a repository
///
/// 2xx yields the body bytes, 404 yields [`ArchiveFetch::NotFound`], any
/// other status or a transport failure is an error.
pub async fn fetch_archive(
    http: &reqwest::Client,
    repo: &RepoRef,
    branch: &str,
) -> Result<ArchiveFetch, SnapshotError> {
    let url = repo.archive_url(branch);
    let response = http.get(&url).send().await.map_err(|e| {
        SnapshotError::Network {
            url: url.clone(),
            source: e,
        }
    })?;

    let status = response.status();
    if status == reqwest::StatusCode::NOT_FOUND {
        return Ok(ArchiveFetch::NotFound);
    }
    if !status.is_success() {
        return Err(SnapshotError::Http {
            url,
            status: status.as_u16(),
        });
    }

    let bytes = response
        .bytes()
        .await
        .map_err(|e| SnapshotError::Network { url, source: e })?;
    Ok(ArchiveFetch::Fetched(bytes.to_vec()))
}

/// Fetch a repository snapshot, falling back from the primary branch to the
/// secondary on not-found
///
/// Returns the archive bytes together with the branch that served them. When
/// the primary and secondary names are identical the fallback is skipped.
pub async fn fetch_snapshot(
    http: &reqwest::Client,
    repo: &RepoRef,
    primary_branch: &str,
    secondary_branch: &str,
) -> Result<(Vec<u8>, String), SnapshotError> {
    match fetch_archive(http, repo, primary_branch).await? {
        ArchiveFetch::Fetched(bytes) => Ok((bytes, primary_branch.to_string())),
        ArchiveFetch::NotFound if primary_branch != secondary_branch => {
            debug!(
                repo = %repo,
                primary_branch,
                secondary_branch,
                "primary branch not found, trying secondary"
            );
            match fetch_archive(http, repo, secondary_branch).await? {
                ArchiveFetch::Fetched(bytes) => Ok((bytes, secondary_branch.to_string())),
                ArchiveFetch::NotFound => Err(SnapshotError::BranchNotFound {
                    repo: repo.to_string(),
                    branch: secondary_branch.to_string(),
                }),
            }
        }
        ArchiveFetch::NotFound => Err(SnapshotError::BranchNotFound {
            repo: repo.to_string(),
            branch: primary_branch.to_string(),
        }),
    }
}
