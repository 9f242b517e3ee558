// SPDX-License-Identifier: GPL-3.0-only
pub mod access;
pub mod protocol;
pub mod dispatch;
pub mod http;
pub mod websocket;

pub use protocol::{
    Capability, DownloadRequest, DownloadResult, ErrorKind, RequestEnvelope, ResponseEnvelope,
};
pub use access::{AccessDenied, BridgeAccess};
pub use dispatch::Bridge;
pub use http::{BridgeState, HttpServer};
