// SPDX-License-Identifier: GPL-3.0-only
use async_trait::async_trait;
use futures_util::StreamExt;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::downloader::client::HttpClient;
use crate::downloader::error::DownloadError;
use crate::downloader::part_file::PartFile;
use crate::downloader::traits::{Downloader, Transfer, TransferReport};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransferState {
    Idle,
    Requested,
    Streaming,
    Completed,
    Failed,
}

impl TransferState {
    pub fn is_terminal(self) -> bool {
        matches!(self, TransferState::Completed | TransferState::Failed)
    }

    fn can_advance_to(self, next: TransferState) -> bool {
        use TransferState::*;
        matches!(
            (self, next),
            (Idle, Requested)
                | (Requested, Streaming)
                | (Requested, Failed)
                | (Streaming, Completed)
                | (Streaming, Failed)
        )
    }
}

struct Lifecycle<'a> {
    transfer: &'a Transfer,
    state: TransferState,
}

impl<'a> Lifecycle<'a> {
    fn new(transfer: &'a Transfer) -> Self {
        Self {
            transfer,
            state: TransferState::Idle,
        }
    }

    fn advance(&mut self, next: TransferState) {
        debug_assert!(
            self.state.can_advance_to(next),
            "invalid transfer transition {:?} -> {:?}",
            self.state,
            next
        );
        debug!(url = %self.transfer.url, from = ?self.state, to = ?next, "Transfer state changed");
        self.state = next;
    }

    fn fail(&mut self, error: DownloadError) -> DownloadError {
        self.advance(TransferState::Failed);
        error
    }
}

/// Streams response bodies chunk by chunk into a part file
pub struct StreamingDownloader {
    client: HttpClient,
}

impl StreamingDownloader {
    pub fn new(client: HttpClient) -> Self {
        Self { client }
    }

    async fn run(
        &self,
        transfer: &Transfer,
        cancel: &CancellationToken,
        lifecycle: &mut Lifecycle<'_>,
    ) -> Result<TransferReport, DownloadError> {
        let url = transfer.url.as_str();
        lifecycle.advance(TransferState::Requested);

        // Opened before any network I/O so a bad destination fails the same way
        // whether or not the source is reachable.
        let mut part = PartFile::create(&transfer.destination)
            .await
            .map_err(|e| lifecycle.fail(e))?;

        let response = tokio::select! {
            biased;
            _ = cancel.cancelled() => return Err(lifecycle.fail(DownloadError::Cancelled)),
            response = self.client.get(&transfer.url) => response,
        };
        let response = response.map_err(|source| {
            lifecycle.fail(DownloadError::Request {
                url: url.to_string(),
                source,
            })
        })?;

        let status = response.status();
        if !status.is_success() {
            return Err(lifecycle.fail(DownloadError::Status {
                url: url.to_string(),
                status,
            }));
        }

        let expected = response.content_length();
        lifecycle.advance(TransferState::Streaming);
        info!(url, path = %transfer.destination.display(), expected = ?expected, "Streaming download");

        let mut body = response.bytes_stream();
        loop {
            let next = tokio::select! {
                biased;
                _ = cancel.cancelled() => return Err(lifecycle.fail(DownloadError::Cancelled)),
                next = body.next() => next,
            };

            match next {
                Some(Ok(chunk)) => part.write(&chunk).await.map_err(|e| lifecycle.fail(e))?,
                Some(Err(source)) => {
                    return Err(lifecycle.fail(DownloadError::Request {
                        url: url.to_string(),
                        source,
                    }));
                }
                None => break,
            }
        }

        check_complete(url, part.written(), expected).map_err(|e| lifecycle.fail(e))?;

        let bytes_written = part.commit().await.map_err(|e| lifecycle.fail(e))?;
        lifecycle.advance(TransferState::Completed);

        Ok(TransferReport {
            destination: transfer.destination.clone(),
            bytes_written,
        })
    }
}

/// A body shorter than the announced length is a dropped connection
fn check_complete(url: &str, received: u64, expected: Option<u64>) -> Result<(), DownloadError> {
    match expected {
        Some(expected) if received < expected => Err(DownloadError::Truncated {
            url: url.to_string(),
            received,
            expected,
        }),
        _ => Ok(()),
    }
}

#[async_trait]
impl Downloader for StreamingDownloader {
    async fn download(
        &self,
        transfer: &Transfer,
        cancel: CancellationToken,
    ) -> Result<TransferReport, DownloadError> {
        let mut lifecycle = Lifecycle::new(transfer);
        let result = self.run(transfer, &cancel, &mut lifecycle).await;

        debug_assert!(lifecycle.state.is_terminal());
        match &result {
            Ok(report) => info!(
                url = %transfer.url,
                path = %report.destination.display(),
                bytes = report.bytes_written,
                "Download completed"
            ),
            Err(e) => warn!(url = %transfer.url, error = %e.detail(), "Download failed"),
        }
        result
    }
}
