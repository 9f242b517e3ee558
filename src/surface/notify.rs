// SPDX-License-Identifier: GPL-3.0-only
use tracing::{error, info};

use crate::surface::traits::{Notification, Notifier, Severity};

/// Reports notifications through the log, for surfaces without a toast area
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingNotifier;

impl Notifier for TracingNotifier {
    fn notify(&self, notification: Notification) {
        match notification.severity {
            Severity::Info => info!(title = %notification.title, "{}", notification.body),
            Severity::Error => error!(title = %notification.title, "{}", notification.body),
        }
    }
}
