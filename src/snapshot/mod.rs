//! Repository snapshot handling
//!
//! A snapshot is the zip archive of one branch of an upstream repository.
//! [`fetch`] retrieves the archive bytes with the single sanctioned
//! branch-name fallback; [`install`] decides where they land on disk and
//! unpacks them.

pub mod fetch;
pub mod install;

pub use fetch::{ArchiveFetch, fetch_archive, fetch_snapshot};
pub use install::{install, snapshot_dir};
