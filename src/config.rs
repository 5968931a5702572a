//! Configuration types for registry-dl

use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Subfolder created under [`Config::destination_dir`] that holds every
/// extracted snapshot, one `owner-name` directory per repository.
pub const SNAPSHOT_SUBFOLDER: &str = "terraform-registry-watch";

/// Main configuration for [`RegistryDownloader`](crate::RegistryDownloader)
///
/// Every field has a sensible default, so `Config::default()` produces a
/// working configuration pointed at the public Terraform registry.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Config {
    /// Base URL of the provider registry (default: `https://registry.terraform.io`)
    #[serde(default = "default_registry_url")]
    pub registry_url: String,

    /// Provider tiers to include in the listing (default: official, partner, community)
    #[serde(default = "default_tiers")]
    pub tiers: Vec<String>,

    /// First page of the listing to fetch, 1-based (default: 1)
    #[serde(default = "default_page_start")]
    pub page_start: u32,

    /// Number of providers requested per page (default: 100)
    #[serde(default = "default_page_size")]
    pub page_size: u32,

    /// Highest page number that will be fetched (default: effectively unbounded)
    ///
    /// Guarantees listing termination even if the registry keeps reporting a
    /// next page; the normal termination signal is the absence of `links.next`.
    #[serde(default = "default_page_limit")]
    pub page_limit: u32,

    /// Root directory snapshots are installed under (default: "./downloads")
    ///
    /// Snapshots land in `<destination_dir>/terraform-registry-watch/<owner>-<name>`.
    #[serde(default = "default_destination_dir")]
    pub destination_dir: PathBuf,

    /// Re-download repositories whose destination directory already exists (default: false)
    #[serde(default)]
    pub overwrite: bool,

    /// Branch tried first for every repository archive (default: "master")
    #[serde(default = "default_primary_branch")]
    pub primary_branch: String,

    /// Branch tried once when the primary returns 404 (default: "main")
    #[serde(default = "default_secondary_branch")]
    pub secondary_branch: String,

    /// Maximum concurrent archive downloads (default: 8)
    #[serde(default = "default_max_concurrent")]
    pub max_concurrent_downloads: usize,

    /// Per-request timeout in seconds (default: 30)
    #[serde(default = "default_request_timeout_secs")]
    pub request_timeout_secs: u64,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            registry_url: default_registry_url(),
            tiers: default_tiers(),
            page_start: default_page_start(),
            page_size: default_page_size(),
            page_limit: default_page_limit(),
            destination_dir: default_destination_dir(),
            overwrite: false,
            primary_branch: default_primary_branch(),
            secondary_branch: default_secondary_branch(),
            max_concurrent_downloads: default_max_concurrent(),
            request_timeout_secs: default_request_timeout_secs(),
        }
    }
}

impl Config {
    /// Validate the configuration, returning the first problem found
    pub fn validate(&self) -> Result<()> {
        if self.page_start == 0 {
            return Err(config_error("page_start must be at least 1", "page_start"));
        }
        if self.page_size == 0 {
            return Err(config_error("page_size must be at least 1", "page_size"));
        }
        if self.page_limit < self.page_start {
            return Err(config_error(
                "page_limit must not be below page_start",
                "page_limit",
            ));
        }
        if self.max_concurrent_downloads == 0 {
            return Err(config_error(
                "max_concurrent_downloads must be at least 1",
                "max_concurrent_downloads",
            ));
        }
        if self.primary_branch.is_empty() {
            return Err(config_error(
                "primary_branch must not be empty",
                "primary_branch",
            ));
        }
        if self.secondary_branch.is_empty() {
            return Err(config_error(
                "secondary_branch must not be empty",
                "secondary_branch",
            ));
        }
        if self.request_timeout_secs == 0 {
            return Err(config_error(
                "request_timeout_secs must be at least 1",
                "request_timeout_secs",
            ));
        }
        Ok(())
    }

    /// Root directory holding every extracted snapshot
    pub fn snapshot_root(&self) -> PathBuf {
        self.destination_dir.join(SNAPSHOT_SUBFOLDER)
    }
}

fn config_error(message: &str, key: &str) -> Error {
    Error::Config {
        message: message.to_string(),
        key: Some(key.to_string()),
    }
}

fn default_registry_url() -> String {
    "https://registry.terraform.io".to_string()
}

fn default_tiers() -> Vec<String> {
    vec![
        "official".to_string(),
        "partner".to_string(),
        "community".to_string(),
    ]
}

fn default_page_start() -> u32 {
    1
}

fn default_page_size() -> u32 {
    100
}

fn default_page_limit() -> u32 {
    u32::MAX
}

fn default_destination_dir() -> PathBuf {
    PathBuf::from("./downloads")
}

fn default_primary_branch() -> String {
    "master".to_string()
}

fn default_secondary_branch() -> String {
    "main".to_string()
}

fn default_max_concurrent() -> usize {
    8
}

fn default_request_timeout_secs() -> u64 {
    30
}
