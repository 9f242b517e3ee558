// SPDX-License-Identifier: GPL-3.0-only
pub mod traits;
pub mod client;
pub mod invoke;
pub mod notify;

pub use traits::{BridgeApi, BridgeFailure, Notification, Notifier, Severity};
pub use client::{BridgeClient, SurfaceError};
pub use invoke::invoke_download;
pub use notify::TracingNotifier;
