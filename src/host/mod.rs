// SPDX-License-Identifier: GPL-3.0-only
pub mod traits;
pub mod completion;
pub mod service;

pub use traits::HostCapabilities;
pub use completion::{completion, Completion, CompletionGuard};
pub use service::{DownloadPolicy, DownloadService};
