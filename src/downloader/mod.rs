// SPDX-License-Identifier: GPL-3.0-only
pub mod traits;
pub mod client;
pub mod error;
pub mod part_file;
pub mod stream;

pub use traits::{Downloader, Transfer, TransferReport};
pub use client::HttpClient;
pub use error::DownloadError;
pub use part_file::PartFile;
pub use stream::{StreamingDownloader, TransferState};
