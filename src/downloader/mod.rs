//! Bulk download orchestrator
//!
//! Composes the listing collector with concurrent snapshot tasks. The whole
//! listing is collected before any download starts (the termination condition
//! of pagination depends on the previous page, so the crawl is a hard
//! prerequisite). Downloads then fan out one task per repository reference,
//! bounded by a semaphore, and the run gathers every task outcome — a failing
//! repository never aborts the batch.

use crate::config::Config;
use crate::error::{Result, SnapshotError};
use crate::registry::RegistryClient;
use crate::snapshot;
use crate::types::{Event, RepoRef, RunSummary, SnapshotOutcome};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{Semaphore, broadcast};
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

/// Buffer size of the event broadcast channel
const EVENT_CHANNEL_CAPACITY: usize = 1024;

/// Bulk repository snapshot downloader (cloneable - all fields are Arc-wrapped
/// or cheaply cloneable)
///
/// One shared connection-pooling HTTP client serves both the listing crawl
/// and every concurrent archive download.
#[derive(Clone)]
pub struct RegistryDownloader {
    /// Configuration (wrapped in Arc for sharing across tasks)
    config: Arc<Config>,
    /// Registry listing client
    registry: RegistryClient,
    /// Shared pooled HTTP client for archive downloads
    http: reqwest::Client,
    /// Event broadcast channel sender (multiple subscribers supported)
    event_tx: broadcast::Sender<Event>,
    /// Semaphore bounding concurrent archive downloads
    concurrent_limit: Arc<Semaphore>,
    /// Cancellation hook: stops launching new tasks, in-flight tasks finish
    cancel_token: CancellationToken,
}

impl RegistryDownloader {
    /// Create a new downloader from a validated configuration
    ///
    /// Builds the shared HTTP client with the configured per-request timeout
    /// so one stalled peer cannot block process exit.
    pub fn new(config: Config) -> Result<Self> {
        config.validate()?;

        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.request_timeout_secs))
            .user_agent(concat!("registry-dl/", env!("CARGO_PKG_VERSION")))
            .build()?;

        let (event_tx, _rx) = broadcast::channel(EVENT_CHANNEL_CAPACITY);
        let config = Arc::new(config);
        let registry = RegistryClient::new(Arc::clone(&config), http.clone(), event_tx.clone());
        let concurrent_limit = Arc::new(Semaphore::new(config.max_concurrent_downloads));

        Ok(Self {
            config,
            registry,
            http,
            event_tx,
            concurrent_limit,
            cancel_token: CancellationToken::new(),
        })
    }

    /// Subscribe to run events
    ///
    /// Multiple subscribers are supported; each receives all events
    /// independently. Events emitted while no one listens are dropped.
    pub fn subscribe(&self) -> broadcast::Receiver<Event> {
        self.event_tx.subscribe()
    }

    /// The registry listing client, for consumers that want per-provider
    /// detail documents alongside the bulk pipeline
    pub fn registry(&self) -> &RegistryClient {
        &self.registry
    }

    /// Request cancellation: no further download tasks are launched,
    /// in-flight tasks run to completion
    pub fn cancel(&self) {
        self.cancel_token.cancel();
    }

    /// Run the full discovery-and-bulk-fetch pipeline
    ///
    /// Collects the complete provider listing first, then downloads and
    /// extracts one snapshot per repository reference under the configured
    /// concurrency bound. Listing errors abort the run; per-repository
    /// failures are logged, counted, and isolated. The returned summary is
    /// `Ok` whenever the listing succeeded and all tasks were attempted,
    /// regardless of how many individual downloads failed.
    pub async fn run(&self) -> Result<RunSummary> {
        info!("starting bulk snapshot run");
        self.emit(Event::RunStarted);

        let repos = self.registry.collect_sources().await?;
        info!(repos = repos.len(), "provider listing collected");
        self.emit(Event::ListingComplete { repos: repos.len() });

        tokio::fs::create_dir_all(self.config.snapshot_root()).await?;

        let mut summary = RunSummary {
            repos_total: repos.len(),
            ..Default::default()
        };

        let mut handles = Vec::with_capacity(repos.len());
        for repo in repos {
            let permit = tokio::select! {
                permit = Arc::clone(&self.concurrent_limit).acquire_owned() => {
                    match permit {
                        Ok(p) => p,
                        Err(_) => break,
                    }
                }
                _ = self.cancel_token.cancelled() => {
                    info!("cancellation requested, not launching further downloads");
                    break;
                }
            };

            let task = self.clone();
            handles.push(tokio::spawn(async move {
                let _permit = permit;
                task.download_repository(&repo).await
            }));
        }

        // Gather, never short-circuit: every launched task is awaited and
        // tallied whatever its outcome
        for joined in futures::future::join_all(handles).await {
            match joined {
                Ok(SnapshotOutcome::Installed) => summary.installed += 1,
                Ok(SnapshotOutcome::Skipped) => summary.skipped += 1,
                Ok(SnapshotOutcome::Failed(_)) => summary.failed += 1,
                Err(e) => {
                    error!(error = %e, "snapshot task join failed");
                    summary.failed += 1;
                }
            }
        }

        info!(
            installed = summary.installed,
            skipped = summary.skipped,
            failed = summary.failed,
            "bulk snapshot run complete"
        );
        self.emit(Event::RunComplete { summary });
        Ok(summary)
    }

    /// Run the snapshot pipeline for a single repository
    ///
    /// The existence check runs before any network traffic: a repository
    /// whose destination directory already exists is skipped outright unless
    /// overwrite is enabled. Every failure kind collapses to a logged
    /// [`SnapshotOutcome::Failed`]; this method never propagates errors.
    pub async fn download_repository(&self, repo: &RepoRef) -> SnapshotOutcome {
        let dest = snapshot::snapshot_dir(&self.config, repo);

        if !self.config.overwrite && dest.is_dir() {
            debug!(repo = %repo, "snapshot already present, skipping");
            self.emit(Event::SnapshotSkipped {
                repo: repo.to_string(),
            });
            return SnapshotOutcome::Skipped;
        }

        let (bytes, branch) = match snapshot::fetch_snapshot(
            &self.http,
            repo,
            &self.config.primary_branch,
            &self.config.secondary_branch,
        )
        .await
        {
            Ok(fetched) => fetched,
            Err(e) => return self.fail(repo, e),
        };

        debug!(repo = %repo, branch, dest = %dest.display(), "downloading repository snapshot");
        match snapshot::install(bytes, dest).await {
            Ok(_) => {
                self.emit(Event::SnapshotInstalled {
                    repo: repo.to_string(),
                    branch,
                });
                SnapshotOutcome::Installed
            }
            Err(e) => self.fail(repo, e),
        }
    }

    fn fail(&self, repo: &RepoRef, err: SnapshotError) -> SnapshotOutcome {
        warn!(repo = %repo, error = %err, "failed to download repository snapshot");
        self.emit(Event::SnapshotFailed {
            repo: repo.to_string(),
            error: err.to_string(),
        });
        SnapshotOutcome::Failed(err.to_string())
    }

    fn emit(&self, event: Event) {
        // send() fails when no one is subscribed, which is fine
        self.event_tx.send(event).ok();
    }
}
