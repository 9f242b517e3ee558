// SPDX-License-Identifier: GPL-3.0-only
use async_trait::async_trait;
use std::path::Path;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpListener;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

use crate::bridge::protocol::{DownloadRequest, DownloadResult, ErrorKind};
use crate::bridge::{Bridge, BridgeAccess, HttpServer};
use crate::config::Config;
use crate::downloader::{HttpClient, StreamingDownloader};
use crate::host::{DownloadPolicy, DownloadService, HostCapabilities};
use crate::shell::Shell;
use crate::surface::{BridgeApi, BridgeFailure, Notification, Notifier};

/// Create a test configuration with temporary paths
pub fn create_test_config() -> Config {
    let temp_dir = std::env::temp_dir().join(format!("distro-shell-test-{}", uuid::Uuid::new_v4()));

    Config {
        download_dir: temp_dir,
        bridge_bind: "127.0.0.1:0".parse().unwrap(), // Use port 0 to auto-assign
        quit_on_last_window_closed: true,
        log_level: "error".to_string(), // Reduce log noise in tests
        ..Config::default()
    }
}

/// Deterministic, non-repeating-looking payload of `len` bytes
pub fn fixture_bytes(len: usize) -> Vec<u8> {
    (0..len).map(|i| (i * 31 % 251) as u8).collect()
}

/// URL on a loopback port nobody listens on
pub async fn refused_url() -> String {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let port = listener.local_addr().unwrap().port();
    drop(listener);
    format!("http://127.0.0.1:{}/file.bin", port)
}

/// Serve `response` verbatim to the first connection.
///
/// With `hold_open` the socket stays open afterwards, so a body shorter than
/// its `Content-Length` looks like a stalled transfer instead of a dropped one.
pub async fn serve_raw(response: &'static [u8], hold_open: bool) -> String {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();

    tokio::spawn(async move {
        let (mut socket, _) = listener.accept().await.unwrap();
        let mut request = [0u8; 4096];
        let _ = socket.read(&mut request).await;
        socket.write_all(response).await.unwrap();
        socket.flush().await.unwrap();
        if hold_open {
            tokio::time::sleep(Duration::from_secs(60)).await;
        }
    });

    format!("http://{}/file.bin", addr)
}

/// Headers announcing 100 bytes followed by only the first 10
pub const SHORT_BODY: &[u8] = b"HTTP/1.1 200 OK\r\nContent-Length: 100\r\n\r\n0123456789";

/// Wait until some file in `dir` holds at least `len` bytes
pub async fn wait_for_partial_write(dir: &Path, len: u64) {
    tokio::time::timeout(Duration::from_secs(5), async {
        loop {
            let written = std::fs::read_dir(dir)
                .unwrap()
                .filter_map(|entry| entry.ok()?.metadata().ok())
                .any(|meta| meta.len() >= len);
            if written {
                break;
            }
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
    })
    .await
    .expect("partial write never reached disk");
}

pub fn dir_is_empty(dir: &Path) -> bool {
    std::fs::read_dir(dir).unwrap().next().is_none()
}

pub async fn wait_until_empty(dir: &Path) {
    tokio::time::timeout(Duration::from_secs(5), async {
        while !dir_is_empty(dir) {
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
    })
    .await
    .expect("directory was never cleaned up");
}

/// Host that records calls instead of touching the network
pub struct RecordingHost {
    result: DownloadResult,
    calls: Mutex<Vec<DownloadRequest>>,
}

impl RecordingHost {
    pub fn succeeding() -> Self {
        Self {
            result: DownloadResult::success("recorded"),
            calls: Mutex::new(Vec::new()),
        }
    }

    pub fn failing(kind: ErrorKind, detail: &str) -> Self {
        Self {
            result: DownloadResult::failure(kind, detail),
            calls: Mutex::new(Vec::new()),
        }
    }

    pub fn calls(&self) -> Vec<DownloadRequest> {
        self.calls.lock().unwrap().clone()
    }
}

#[async_trait]
impl HostCapabilities for RecordingHost {
    async fn download(&self, request: DownloadRequest, _cancel: CancellationToken) -> DownloadResult {
        self.calls.lock().unwrap().push(request);
        self.result.clone()
    }
}

/// Bridge stand-in answering every call with the same outcome
pub struct ScriptedBridge {
    outcome: Result<String, BridgeFailure>,
    calls: Mutex<Vec<(String, String)>>,
}

impl ScriptedBridge {
    pub fn new(outcome: Result<String, BridgeFailure>) -> Self {
        Self {
            outcome,
            calls: Mutex::new(Vec::new()),
        }
    }

    pub fn calls(&self) -> Vec<(String, String)> {
        self.calls.lock().unwrap().clone()
    }
}

#[async_trait]
impl BridgeApi for ScriptedBridge {
    async fn download(&self, url: &str, path: &str) -> Result<String, BridgeFailure> {
        self.calls.lock().unwrap().push((url.to_string(), path.to_string()));
        self.outcome.clone()
    }
}

#[derive(Default)]
pub struct RecordingNotifier {
    sent: Mutex<Vec<Notification>>,
}

impl RecordingNotifier {
    pub fn sent(&self) -> Vec<Notification> {
        self.sent.lock().unwrap().clone()
    }
}

impl Notifier for RecordingNotifier {
    fn notify(&self, notification: Notification) {
        self.sent.lock().unwrap().push(notification);
    }
}

pub struct RunningBridge {
    /// Connect URL including the launch token
    pub url: String,
    /// The same endpoint without credentials
    pub bare_url: String,
    pub shell: Arc<Shell>,
    pub server: JoinHandle<anyhow::Result<()>>,
}

/// Start a real bridge server on an ephemeral port, downloading into `download_dir`
pub async fn spawn_bridge(download_dir: &Path) -> RunningBridge {
    spawn_bridge_with_origins(download_dir, Vec::new()).await
}

pub async fn spawn_bridge_with_origins(download_dir: &Path, allowed_origins: Vec<String>) -> RunningBridge {
    let config = create_test_config();
    let shell = Shell::init(&config);

    let downloader = StreamingDownloader::new(HttpClient::new(None).unwrap());
    let service = DownloadService::new(
        Arc::new(downloader),
        DownloadPolicy {
            download_dir: download_dir.to_path_buf(),
            ..DownloadPolicy::from_config(&config)
        },
    );
    let bridge = Arc::new(Bridge::new(Arc::new(service)));

    let access = BridgeAccess::generate(allowed_origins);
    let server = HttpServer::new(bridge, Arc::clone(&shell), access, config.bridge_bind);
    let listener = server.bind().await.unwrap();
    let local_addr = listener.local_addr().unwrap();
    let url = server.surface_url(local_addr);
    let bare_url = format!("ws://{}/ws", local_addr);
    let server = tokio::spawn(server.serve_on(listener));

    RunningBridge {
        url,
        bare_url,
        shell,
        server,
    }
}
