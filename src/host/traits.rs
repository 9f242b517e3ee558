// SPDX-License-Identifier: GPL-3.0-only
use async_trait::async_trait;
use tokio_util::sync::CancellationToken;

use crate::bridge::protocol::{DownloadRequest, DownloadResult};

/// Privileged operations reachable from the bridge, one method per `Capability` variant
#[async_trait]
pub trait HostCapabilities: Send + Sync {
    /// Fetch `source_url` into `destination_path`; always resolves to a terminal result
    async fn download(&self, request: DownloadRequest, cancel: CancellationToken) -> DownloadResult;
}
