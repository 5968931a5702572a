//! Error types for registry-dl
//!
//! Errors are split by pipeline stage:
//! - [`RegistryError`] — listing-stage failures; these abort the whole run,
//!   since without a valid provider listing there is nothing to download.
//! - [`SnapshotError`] — download-stage failures; these are always isolated to
//!   the single repository task that produced them and never abort the batch.

use std::path::PathBuf;
use thiserror::Error;

/// Result type alias for registry-dl operations
pub type Result<T> = std::result::Result<T, Error>;

/// Main error type for registry-dl
#[derive(Debug, Error)]
pub enum Error {
    /// Configuration error with context about which setting is invalid
    #[error("configuration error: {message}")]
    Config {
        /// Human-readable error message describing the configuration issue
        message: String,
        /// The configuration key that caused the error (e.g., "page_size")
        key: Option<String>,
    },

    /// Registry listing error
    #[error("registry error: {0}")]
    Registry(#[from] RegistryError),

    /// Snapshot download or install error
    #[error("snapshot error: {0}")]
    Snapshot(#[from] SnapshotError),

    /// Network error
    #[error("network error: {0}")]
    Network(#[from] reqwest::Error),

    /// Serialization error
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Listing-stage errors (provider registry endpoints)
///
/// `Display` and `Error` are implemented by hand rather than derived:
/// thiserror treats any field named `source` as the error's source, but
/// [`RegistryError::MalformedSource`]'s `source` field is the raw provider
/// string, not an underlying error. No variant carries an error source.
#[derive(Debug)]
pub enum RegistryError {
    /// Listing endpoint returned a non-success status
    Http {
        /// The 1-based page number that was requested
        page: u32,
        /// The HTTP status code returned
        status: u16,
    },

    /// Listing payload could not be parsed
    ///
    /// Distinct from an empty page: a page with no providers is a valid
    /// response, a body that does not deserialize is not.
    MalformedPage {
        /// The 1-based page number whose body failed to parse
        page: u32,
        /// Why the body could not be parsed
        reason: String,
    },

    /// A provider record's `source` field could not be parsed into owner/name
    MalformedSource {
        /// The raw `source` value from the provider record
        source: String,
        /// Why the value could not be parsed
        reason: String,
    },

    /// Provider detail endpoint returned a non-success status
    ProviderDetails {
        /// The provider ID whose details were requested
        id: String,
        /// The HTTP status code returned
        status: u16,
    },
}

impl std::fmt::Display for RegistryError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Http { page, status } => {
                write!(f, "providers page {page} returned HTTP {status}")
            }
            Self::MalformedPage { page, reason } => {
                write!(f, "malformed providers page {page}: {reason}")
            }
            Self::MalformedSource { source, reason } => {
                write!(f, "malformed provider source '{source}': {reason}")
            }
            Self::ProviderDetails { id, status } => {
                write!(f, "provider {id} details returned HTTP {status}")
            }
        }
    }
}

impl std::error::Error for RegistryError {}

/// Download-stage errors (archive fetch and install)
#[derive(Debug, Error)]
pub enum SnapshotError {
    /// Archive endpoint returned a non-success, non-404 status
    #[error("archive fetch from {url} returned HTTP {status}")]
    Http {
        /// The archive URL that was requested
        url: String,
        /// The HTTP status code returned
        status: u16,
    },

    /// Neither the primary nor the secondary branch exists
    #[error("no archive found for {repo} on branch '{branch}' (or its fallback)")]
    BranchNotFound {
        /// The repository whose branches were tried
        repo: String,
        /// The last branch name tried (the secondary)
        branch: String,
    },

    /// Transport failure while fetching an archive
    #[error("network error fetching {url}: {source}")]
    Network {
        /// The archive URL that was being fetched
        url: String,
        /// The underlying transport error
        #[source]
        source: reqwest::Error,
    },

    /// Archive bytes could not be read as a zip container
    #[error("failed to extract archive into {dest}: {reason}")]
    Extraction {
        /// The destination directory the extraction targeted
        dest: PathBuf,
        /// Why the extraction failed
        reason: String,
    },

    /// Filesystem failure while installing a snapshot
    #[error("I/O error installing into {dest}: {source}")]
    Io {
        /// The destination directory the install targeted
        dest: PathBuf,
        /// The underlying I/O error
        #[source]
        source: std::io::Error,
    },
}
