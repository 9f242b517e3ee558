// SPDX-License-Identifier: GPL-3.0-only
use crate::surface::traits::{BridgeApi, BridgeFailure, Notification, Notifier, Severity};

/// Ask the host to download `url` into `path` and tell the user how it went.
///
/// Every outcome produces exactly one notification; the outcome is also
/// returned so the caller can update its own view state.
pub async fn invoke_download(
    api: &dyn BridgeApi,
    notifier: &dyn Notifier,
    url: &str,
    path: &str,
) -> Result<String, BridgeFailure> {
    let outcome = api.download(url, path).await;

    let notification = match &outcome {
        Ok(message) => Notification {
            severity: Severity::Info,
            title: "Download finished".to_string(),
            body: message.clone(),
        },
        Err(failure) => Notification {
            severity: Severity::Error,
            title: "Download failed".to_string(),
            body: failure.to_string(),
        },
    };
    notifier.notify(notification);

    outcome
}
