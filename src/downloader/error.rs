// SPDX-License-Identifier: GPL-3.0-only
use std::error::Error as StdError;
use std::path::PathBuf;

use crate::bridge::protocol::ErrorKind;

#[derive(thiserror::Error, Debug)]
pub enum DownloadError {
    #[error("invalid source URL: {0}")]
    InvalidUrl(String),

    #[error("invalid destination path: {0}")]
    InvalidDestination(String),

    #[error("request to {url} failed: {source}")]
    Request {
        url: String,
        #[source]
        source: reqwest::Error,
    },

    #[error("{url} responded with HTTP {status}")]
    Status {
        url: String,
        status: reqwest::StatusCode,
    },

    #[error("stream from {url} ended after {received} of {expected} bytes")]
    Truncated {
        url: String,
        received: u64,
        expected: u64,
    },

    #[error("failed to {action} {}: {source}", .path.display())]
    Filesystem {
        action: &'static str,
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("download cancelled")]
    Cancelled,

    #[error("download task ended without reporting a result")]
    Aborted,
}

impl DownloadError {
    pub fn filesystem(action: &'static str, path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        DownloadError::Filesystem {
            action,
            path: path.into(),
            source,
        }
    }

    pub fn kind(&self) -> ErrorKind {
        match self {
            DownloadError::InvalidUrl(_) | DownloadError::InvalidDestination(_) => ErrorKind::Protocol,
            DownloadError::Request { .. }
            | DownloadError::Status { .. }
            | DownloadError::Truncated { .. } => ErrorKind::Network,
            DownloadError::Filesystem { .. } => ErrorKind::Filesystem,
            DownloadError::Cancelled => ErrorKind::Cancelled,
            DownloadError::Aborted => ErrorKind::Internal,
        }
    }

    /// Display text followed by every underlying cause.
    ///
    /// reqwest hides DNS and connect failures in its source chain.
    pub fn detail(&self) -> String {
        let mut detail = self.to_string();
        let mut cause = self.source().and_then(StdError::source);
        while let Some(err) = cause {
            let text = err.to_string();
            if !detail.contains(&text) {
                detail.push_str(": ");
                detail.push_str(&text);
            }
            cause = err.source();
        }
        detail
    }
}
