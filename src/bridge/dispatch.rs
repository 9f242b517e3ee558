// SPDX-License-Identifier: GPL-3.0-only
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

use crate::bridge::protocol::{
    decode_request, encode_response, Capability, DownloadResult, ErrorKind, RequestEnvelope,
    ResponseEnvelope,
};
use crate::host::HostCapabilities;

/// Routes decoded bridge calls to the host.
///
/// Only `Capability` variants reach the host; anything else is answered
/// with a protocol failure here.
pub struct Bridge {
    host: Arc<dyn HostCapabilities>,
}

impl Bridge {
    pub fn new(host: Arc<dyn HostCapabilities>) -> Self {
        Self { host }
    }

    pub async fn dispatch(&self, envelope: RequestEnvelope, cancel: CancellationToken) -> ResponseEnvelope {
        let RequestEnvelope { id, call } = envelope;
        debug!(id, capability = call.name(), "Dispatching bridge call");

        let result = match call {
            Capability::Download(request) => self.host.download(request, cancel).await,
        };

        ResponseEnvelope { id: Some(id), result }
    }

    /// Handle one text frame and produce the frame to send back
    pub async fn handle_text(&self, text: &str, cancel: CancellationToken) -> String {
        let response = match decode_request(text) {
            Ok(envelope) => self.dispatch(envelope, cancel).await,
            Err(rejected) => {
                warn!(id = ?rejected.id, reason = %rejected.reason, "Rejected bridge call");
                rejected.into_response()
            }
        };

        encode_response(&response).unwrap_or_else(|e| {
            // Only reachable if serde_json cannot serialize our own types
            let fallback = ResponseEnvelope {
                id: response.id,
                result: DownloadResult::failure(ErrorKind::Internal, e.to_string()),
            };
            serde_json::to_string(&fallback).unwrap_or_default()
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_helpers::RecordingHost;
    use serde_json::json;

    fn bridge(host: &Arc<RecordingHost>) -> Bridge {
        let host: Arc<dyn HostCapabilities> = host.clone();
        Bridge::new(host)
    }

    #[tokio::test]
    async fn test_download_reaches_host() {
        let host = Arc::new(RecordingHost::succeeding());
        let text = json!({
            "id": 1,
            "call": {
                "capability": "download",
                "source_url": "https://example.test/file.bin",
                "destination_path": "/tmp/out.bin"
            }
        })
        .to_string();

        let reply = bridge(&host).handle_text(&text, CancellationToken::new()).await;
        let response: ResponseEnvelope = serde_json::from_str(&reply).unwrap();

        assert_eq!(response.id, Some(1));
        assert!(response.result.is_success());
        let calls = host.calls();
        assert_eq!(calls.len(), 1);
        assert_eq!(calls[0].source_url, "https://example.test/file.bin");
        assert_eq!(calls[0].destination_path, "/tmp/out.bin");
    }

    #[tokio::test]
    async fn test_unlisted_capability_never_reaches_host() {
        let host = Arc::new(RecordingHost::succeeding());
        let bridge = bridge(&host);

        for text in [
            json!({"id": 2, "call": {"capability": "eval", "code": "1+1"}}).to_string(),
            json!({"id": 3, "call": {"capability": "invoke", "name": "download"}}).to_string(),
            json!({"id": 4, "call": {"capability": "read_file", "path": "/etc/passwd"}}).to_string(),
            json!({"id": 5, "call": {"source_url": "https://example.test"}}).to_string(),
        ] {
            let reply = bridge.handle_text(&text, CancellationToken::new()).await;
            let response: ResponseEnvelope = serde_json::from_str(&reply).unwrap();
            assert!(matches!(
                response.result,
                DownloadResult::Failure { kind: ErrorKind::Protocol, .. }
            ));
        }

        assert!(host.calls().is_empty());
    }

    #[tokio::test]
    async fn test_malformed_arguments_rejected_at_bridge() {
        let host = Arc::new(RecordingHost::succeeding());
        let text = json!({
            "id": 6,
            "call": {"capability": "download", "source_url": ["x"], "destination_path": "/tmp/x"}
        })
        .to_string();

        let reply = bridge(&host).handle_text(&text, CancellationToken::new()).await;
        let response: ResponseEnvelope = serde_json::from_str(&reply).unwrap();

        assert_eq!(response.id, Some(6));
        assert!(matches!(
            response.result,
            DownloadResult::Failure { kind: ErrorKind::Protocol, .. }
        ));
        assert!(host.calls().is_empty());
    }

    #[tokio::test]
    async fn test_host_failure_is_relayed_verbatim() {
        let host = Arc::new(RecordingHost::failing(ErrorKind::Filesystem, "permission denied"));
        let envelope = RequestEnvelope {
            id: 8,
            call: Capability::Download(crate::bridge::protocol::DownloadRequest::new(
                "https://example.test/a",
                "/root/a",
            )),
        };

        let response = bridge(&host).dispatch(envelope, CancellationToken::new()).await;
        assert_eq!(
            response.result,
            DownloadResult::failure(ErrorKind::Filesystem, "permission denied")
        );
    }
}
