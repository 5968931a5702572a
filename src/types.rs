//! Core types for registry-dl

use crate::error::RegistryError;
use serde::{Deserialize, Serialize};
use url::Url;

/// Normalized reference to an upstream source repository
///
/// Parsed from a provider record's `source` URL, which is assumed to point at
/// a hosting service with the owner and repository name as its first two path
/// segments (e.g. `https://github.com/acme/widget`).
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct RepoRef {
    /// Repository owner (first path segment of the source URL)
    pub owner: String,
    /// Repository name (second path segment of the source URL)
    pub name: String,
    /// Source URL with any trailing slash removed, used to build archive URLs
    pub source: String,
}

impl RepoRef {
    /// Parse a provider `source` URL into a repository reference
    ///
    /// Returns a [`RegistryError::MalformedSource`] when the value is not an
    /// absolute URL or is missing the owner/name path segments. Callers in
    /// the listing stage drop such records with a warning rather than
    /// aborting collection.
    pub fn parse(source: &str) -> Result<Self, RegistryError> {
        let malformed = |reason: &str| RegistryError::MalformedSource {
            source: source.to_string(),
            reason: reason.to_string(),
        };

        let url = Url::parse(source)
            .map_err(|e| malformed(&e.to_string()))?;

        let mut segments = url
            .path_segments()
            .ok_or_else(|| malformed("URL has no path"))?
            .filter(|s| !s.is_empty());

        let owner = segments
            .next()
            .ok_or_else(|| malformed("missing owner path segment"))?
            .to_string();
        let name = segments
            .next()
            .ok_or_else(|| malformed("missing repository name path segment"))?
            .to_string();

        Ok(Self {
            owner,
            name,
            source: source.trim_end_matches('/').to_string(),
        })
    }

    /// Destination folder name derived from the identifier: `owner-name`
    pub fn folder_name(&self) -> String {
        format!("{}-{}", self.owner, self.name)
    }

    /// Archive download URL for a branch snapshot of this repository
    pub fn archive_url(&self, branch: &str) -> String {
        format!("{}/archive/refs/heads/{}.zip", self.source, branch)
    }
}

impl std::fmt::Display for RepoRef {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}/{}", self.owner, self.name)
    }
}

/// Terminal state of one snapshot task
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SnapshotOutcome {
    /// Archive fetched and extracted into the destination directory
    Installed,
    /// Destination already existed and overwrite was disabled; no network call made
    Skipped,
    /// Task failed; the batch continues regardless
    Failed(String),
}

/// Aggregate result of one bulk download run
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RunSummary {
    /// Total repository references produced by the listing stage
    pub repos_total: usize,
    /// Snapshots downloaded and extracted this run
    pub installed: usize,
    /// Repositories skipped because their destination already existed
    pub skipped: usize,
    /// Tasks that failed (fetch, extraction, or panic)
    pub failed: usize,
}

/// Events broadcast by [`RegistryDownloader`](crate::RegistryDownloader)
///
/// Multiple subscribers are supported; events are dropped silently when no
/// one is listening, so emitting never blocks the pipeline.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Event {
    /// A bulk download run started
    RunStarted,

    /// One listing page was fetched
    PageFetched {
        /// The 1-based page number
        page: u32,
        /// Number of provider records on the page
        providers: usize,
    },

    /// Listing collection finished
    ListingComplete {
        /// Total repository references collected
        repos: usize,
    },

    /// A repository was skipped because its destination already exists
    SnapshotSkipped {
        /// Repository in `owner/name` form
        repo: String,
    },

    /// A repository snapshot was downloaded and extracted
    SnapshotInstalled {
        /// Repository in `owner/name` form
        repo: String,
        /// Branch whose archive was installed
        branch: String,
    },

    /// A repository task failed
    SnapshotFailed {
        /// Repository in `owner/name` form
        repo: String,
        /// Error description
        error: String,
    },

    /// The run finished; all tasks were attempted
    RunComplete {
        /// Aggregate counts for the run
        summary: RunSummary,
    },
}
