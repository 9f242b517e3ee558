// SPDX-License-Identifier: GPL-3.0-only
use async_trait::async_trait;
use std::path::PathBuf;
use tokio_util::sync::CancellationToken;
use url::Url;

use crate::downloader::error::DownloadError;

/// A request that passed host-side validation
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Transfer {
    pub url: Url,
    pub destination: PathBuf,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransferReport {
    pub destination: PathBuf,
    pub bytes_written: u64,
}

#[async_trait]
pub trait Downloader: Send + Sync {
    /// Stream `transfer.url` into `transfer.destination`.
    ///
    /// Resolves once with either a fully written destination or an error;
    /// nothing is left at the destination on error.
    async fn download(
        &self,
        transfer: &Transfer,
        cancel: CancellationToken,
    ) -> Result<TransferReport, DownloadError>;
}
