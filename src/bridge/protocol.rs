// SPDX-License-Identifier: GPL-3.0-only
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;

/// A single download call as it crosses the bridge
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DownloadRequest {
    /// Absolute http(s) URL to fetch
    pub source_url: String,

    /// Absolute path, or a path relative to the configured download directory
    pub destination_path: String,
}

impl DownloadRequest {
    pub fn new(source_url: impl Into<String>, destination_path: impl Into<String>) -> Self {
        Self {
            source_url: source_url.into(),
            destination_path: destination_path.into(),
        }
    }
}

/// Every host capability the presentation surface may call.
///
/// Adding a capability means adding a variant here and a method on
/// `HostCapabilities`. Nothing here may dispatch by name.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "capability", rename_all = "snake_case")]
pub enum Capability {
    Download(DownloadRequest),
}

impl Capability {
    /// Wire names of the enumerated capabilities
    pub const NAMES: &'static [&'static str] = &["download"];

    pub fn name(&self) -> &'static str {
        match self {
            Capability::Download(_) => "download",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    /// Connection, DNS, non-success status, reset or truncated stream
    Network,
    /// Destination could not be created, written or moved into place
    Filesystem,
    /// Malformed or non-enumerated call rejected at the bridge
    Protocol,
    /// The host cancelled the transfer
    Cancelled,
    /// The host task ended without reporting a result
    Internal,
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ErrorKind::Network => "NetworkError",
            ErrorKind::Filesystem => "FilesystemError",
            ErrorKind::Protocol => "ProtocolError",
            ErrorKind::Cancelled => "Cancelled",
            ErrorKind::Internal => "InternalError",
        };
        f.write_str(name)
    }
}

/// Terminal outcome of one request
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum DownloadResult {
    Success { message: String },
    Failure { kind: ErrorKind, detail: String },
}

impl DownloadResult {
    pub fn success(message: impl Into<String>) -> Self {
        DownloadResult::Success {
            message: message.into(),
        }
    }

    pub fn failure(kind: ErrorKind, detail: impl Into<String>) -> Self {
        DownloadResult::Failure {
            kind,
            detail: detail.into(),
        }
    }

    pub fn is_success(&self) -> bool {
        matches!(self, DownloadResult::Success { .. })
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RequestEnvelope {
    pub id: u64,
    pub call: Capability,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResponseEnvelope {
    /// Echo of the request id, absent when the request was too broken to carry one
    pub id: Option<u64>,
    pub result: DownloadResult,
}

#[derive(thiserror::Error, Debug)]
pub enum BridgeError {
    #[error("malformed bridge message: {0}")]
    Malformed(#[source] serde_json::Error),

    #[error("bridge message has no numeric id")]
    MissingId,

    #[error("bridge message has no call")]
    MissingCall,

    #[error("unknown capability: {0}")]
    UnknownCapability(String),

    #[error("invalid arguments for '{capability}': {source}")]
    InvalidArguments {
        capability: String,
        #[source]
        source: serde_json::Error,
    },
}

/// A call refused by the bridge before reaching the host
#[derive(Debug)]
pub struct Rejected {
    pub id: Option<u64>,
    pub reason: BridgeError,
}

impl Rejected {
    pub fn into_response(self) -> ResponseEnvelope {
        ResponseEnvelope {
            id: self.id,
            result: DownloadResult::failure(ErrorKind::Protocol, self.reason.to_string()),
        }
    }
}

/// Decode one text frame into an enumerated call
pub fn decode_request(text: &str) -> Result<RequestEnvelope, Rejected> {
    let value: Value = serde_json::from_str(text).map_err(|e| Rejected {
        id: None,
        reason: BridgeError::Malformed(e),
    })?;

    let id = value.get("id").and_then(Value::as_u64);
    let reject = |reason| Rejected { id, reason };

    let Some(id) = id else {
        return Err(reject(BridgeError::MissingId));
    };
    let Some(call) = value.get("call") else {
        return Err(reject(BridgeError::MissingCall));
    };

    let name = call
        .get("capability")
        .and_then(Value::as_str)
        .unwrap_or_default();
    if !Capability::NAMES.contains(&name) {
        return Err(reject(BridgeError::UnknownCapability(name.to_string())));
    }

    let call = serde_json::from_value::<Capability>(call.clone()).map_err(|source| {
        reject(BridgeError::InvalidArguments {
            capability: name.to_string(),
            source,
        })
    })?;

    Ok(RequestEnvelope { id, call })
}

pub fn encode_response(response: &ResponseEnvelope) -> serde_json::Result<String> {
    serde_json::to_string(response)
}
