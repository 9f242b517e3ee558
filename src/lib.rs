// SPDX-License-Identifier: GPL-3.0-only
//! Desktop shell host exposing a single privileged capability, `download`,
//! to an unprivileged presentation surface over a typed WebSocket bridge.

pub mod bridge;
pub mod config;
pub mod downloader;
pub mod host;
pub mod logging;
pub mod shell;
pub mod surface;
pub mod utils;

#[cfg(test)]
pub mod test_helpers;
