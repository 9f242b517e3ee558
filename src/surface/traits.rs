// SPDX-License-Identifier: GPL-3.0-only
use async_trait::async_trait;

use crate::bridge::protocol::{DownloadResult, ErrorKind};

/// A rejected bridge call, as the presentation surface sees it
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
#[error("{kind}: {message}")]
pub struct BridgeFailure {
    pub kind: ErrorKind,
    pub message: String,
}

impl BridgeFailure {
    pub fn new(kind: ErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }
}

impl From<DownloadResult> for Result<String, BridgeFailure> {
    fn from(result: DownloadResult) -> Self {
        match result {
            DownloadResult::Success { message } => Ok(message),
            DownloadResult::Failure { kind, detail } => Err(BridgeFailure::new(kind, detail)),
        }
    }
}

/// Host capabilities as exposed to the presentation surface
#[async_trait]
pub trait BridgeApi: Send + Sync {
    /// Resolves with the host's confirmation message or rejects with its failure
    async fn download(&self, url: &str, path: &str) -> Result<String, BridgeFailure>;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Severity {
    Info,
    Error,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notification {
    pub severity: Severity,
    pub title: String,
    pub body: String,
}

/// User-visible feedback channel of the presentation surface
pub trait Notifier: Send + Sync {
    fn notify(&self, notification: Notification);
}
