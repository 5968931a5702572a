//! # registry-dl
//!
//! Bulk repository snapshot downloader for Terraform-style provider
//! registries: crawl the paginated provider listing, resolve each entry's
//! upstream source repository, and concurrently download and unpack a
//! default-branch zip snapshot of every repository.
//!
//! ## Design Philosophy
//!
//! registry-dl is designed to be:
//! - **Library-first** - No CLI and no logger initialization, purely a Rust
//!   crate for embedding; the application owns the `tracing` subscriber
//! - **Sensible defaults** - `Config::default()` targets the public Terraform
//!   registry and works out of the box
//! - **Failure-isolating** - One repository failing never aborts the batch;
//!   a run succeeds when the listing succeeded and every task was attempted
//! - **Event-driven** - Consumers subscribe to run events, no polling required
//!
//! ## Quick Start
//!
//! ```no_run
//! use registry_dl::{Config, RegistryDownloader};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = Config {
//!         destination_dir: "/data/snapshots".into(),
//!         ..Default::default()
//!     };
//!
//!     let downloader = RegistryDownloader::new(config)?;
//!
//!     // Subscribe to events
//!     let mut events = downloader.subscribe();
//!     tokio::spawn(async move {
//!         while let Ok(event) = events.recv().await {
//!             println!("Event: {:?}", event);
//!         }
//!     });
//!
//!     let summary = downloader.run().await?;
//!     println!(
//!         "installed {} / skipped {} / failed {}",
//!         summary.installed, summary.skipped, summary.failed
//!     );
//!     Ok(())
//! }
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::unwrap_used)]
#![warn(clippy::expect_used)]

/// Configuration types
pub mod config;
/// Bulk download orchestration
pub mod downloader;
/// Error types
pub mod error;
/// Zip archive extraction
pub mod extraction;
/// Provider registry listing client
pub mod registry;
/// Snapshot fetching and installation
pub mod snapshot;
/// Core types and events
pub mod types;

// Re-export commonly used types
pub use config::{Config, SNAPSHOT_SUBFOLDER};
pub use downloader::RegistryDownloader;
pub use error::{Error, RegistryError, Result, SnapshotError};
pub use registry::{PageLinks, ProviderRecord, ProvidersPage, RegistryClient};
pub use snapshot::{ArchiveFetch, fetch_archive, fetch_snapshot};
pub use types::{Event, RepoRef, RunSummary, SnapshotOutcome};
