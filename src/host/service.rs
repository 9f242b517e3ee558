// SPDX-License-Identifier: GPL-3.0-only
use async_trait::async_trait;
use std::path::PathBuf;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

use crate::bridge::protocol::{DownloadRequest, DownloadResult, ErrorKind};
use crate::config::Config;
use crate::downloader::{DownloadError, Downloader, Transfer, TransferReport};
use crate::host::completion::completion;
use crate::host::traits::HostCapabilities;

/// Host-side rules applied to every request before any I/O
#[derive(Debug, Clone)]
pub struct DownloadPolicy {
    /// Base for relative destination paths
    pub download_dir: PathBuf,

    /// Reject destinations outside `download_dir`
    pub confine_downloads: bool,

    /// Reject loopback and private-network sources
    pub block_private_hosts: bool,
}

impl DownloadPolicy {
    pub fn from_config(config: &Config) -> Self {
        Self {
            download_dir: config.download_dir.clone(),
            confine_downloads: config.confine_downloads,
            block_private_hosts: config.block_private_hosts,
        }
    }
}

/// The host's `download` capability.
///
/// Requests are independent: nothing serializes transfers that target the
/// same destination. Callers that issue such requests concurrently get
/// whichever transfer finishes last.
pub struct DownloadService {
    downloader: Arc<dyn Downloader>,
    policy: DownloadPolicy,
    in_flight: Arc<AtomicUsize>,
}

impl DownloadService {
    pub fn new(downloader: Arc<dyn Downloader>, policy: DownloadPolicy) -> Self {
        Self {
            downloader,
            policy,
            in_flight: Arc::new(AtomicUsize::new(0)),
        }
    }

    /// Number of transfers currently running
    pub fn in_flight(&self) -> usize {
        self.in_flight.load(Ordering::SeqCst)
    }

    pub fn validate(&self, request: &DownloadRequest) -> Result<Transfer, DownloadError> {
        let url = crate::utils::validate_url(&request.source_url, self.policy.block_private_hosts)
            .map_err(|e| DownloadError::InvalidUrl(format!("{:#}", e)))?;

        let destination = crate::utils::resolve_destination(
            &request.destination_path,
            &self.policy.download_dir,
            self.policy.confine_downloads,
        )
        .map_err(|e| DownloadError::InvalidDestination(format!("{:#}", e)))?;

        Ok(Transfer { url, destination })
    }
}

struct InFlight(Arc<AtomicUsize>);

impl InFlight {
    fn enter(counter: &Arc<AtomicUsize>) -> Self {
        counter.fetch_add(1, Ordering::SeqCst);
        Self(Arc::clone(counter))
    }
}

impl Drop for InFlight {
    fn drop(&mut self) {
        self.0.fetch_sub(1, Ordering::SeqCst);
    }
}

fn success_message(report: &TransferReport) -> String {
    format!(
        "Download complete: {} bytes written to {}",
        report.bytes_written,
        report.destination.display()
    )
}

fn failure(error: &DownloadError) -> DownloadResult {
    DownloadResult::failure(error.kind(), error.detail())
}

#[async_trait]
impl HostCapabilities for DownloadService {
    async fn download(&self, request: DownloadRequest, cancel: CancellationToken) -> DownloadResult {
        info!(url = %request.source_url, path = %request.destination_path, "Download requested");

        let transfer = match self.validate(&request) {
            Ok(transfer) => transfer,
            Err(e) => {
                warn!(error = %e, "Rejected download request");
                return failure(&e);
            }
        };

        let (completion, outcome) = completion();
        let downloader = Arc::clone(&self.downloader);
        let in_flight = InFlight::enter(&self.in_flight);

        tokio::spawn(async move {
            // Declared first so it drops last, after the counter is released.
            let _guard = completion.guard(failure(&DownloadError::Aborted));
            let in_flight = in_flight;

            let result = match downloader.download(&transfer, cancel).await {
                Ok(report) => DownloadResult::success(success_message(&report)),
                Err(e) => failure(&e),
            };
            drop(in_flight);
            completion.complete(result);
        });

        outcome
            .await
            .unwrap_or_else(|_| DownloadResult::failure(ErrorKind::Internal, DownloadError::Aborted.to_string()))
    }
}
