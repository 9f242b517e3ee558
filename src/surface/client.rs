// SPDX-License-Identifier: GPL-3.0-only
use async_trait::async_trait;
use futures_util::{SinkExt, StreamExt};
use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use tokio::sync::{mpsc, oneshot};
use tokio::task::JoinHandle;
use tokio_tungstenite::tungstenite::Message;
use tracing::{debug, warn};

use crate::bridge::protocol::{
    Capability, DownloadRequest, DownloadResult, ErrorKind, RequestEnvelope, ResponseEnvelope,
};
use crate::surface::traits::{BridgeApi, BridgeFailure};

#[derive(thiserror::Error, Debug)]
pub enum SurfaceError {
    #[error("failed to connect to bridge: {0}")]
    Connect(#[from] tokio_tungstenite::tungstenite::Error),

    #[error("failed to encode bridge call: {0}")]
    Encode(#[from] serde_json::Error),

    #[error("bridge connection closed")]
    Disconnected,
}

enum Outgoing {
    Frame(String),
    Close,
}

/// `None` once the connection is gone; pending senders are dropped with it.
type Pending = Arc<Mutex<Option<HashMap<u64, oneshot::Sender<DownloadResult>>>>>;

fn lock(pending: &Pending) -> MutexGuard<'_, Option<HashMap<u64, oneshot::Sender<DownloadResult>>>> {
    pending.lock().unwrap_or_else(PoisonError::into_inner)
}

/// Presentation-side end of the bridge.
///
/// Calls can only be built from `Capability`, so the surface has no way to
/// name a host operation that is not enumerated there.
pub struct BridgeClient {
    outgoing: mpsc::UnboundedSender<Outgoing>,
    pending: Pending,
    next_id: AtomicU64,
    reader: JoinHandle<()>,
    writer: JoinHandle<()>,
}

impl BridgeClient {
    pub async fn connect(url: &str) -> Result<Self, SurfaceError> {
        let (stream, _) = tokio_tungstenite::connect_async(url).await?;
        let (mut write, mut read) = stream.split();
        let (outgoing, mut rx) = mpsc::unbounded_channel::<Outgoing>();
        let pending: Pending = Arc::new(Mutex::new(Some(HashMap::new())));

        let writer = tokio::spawn(async move {
            while let Some(next) = rx.recv().await {
                match next {
                    Outgoing::Frame(text) => {
                        if let Err(e) = write.send(Message::Text(text)).await {
                            warn!(error = %e, "Failed to send bridge call");
                            break;
                        }
                    }
                    Outgoing::Close => break,
                }
            }
            let _ = write.close().await;
        });

        let reader_pending = Arc::clone(&pending);
        let reader = tokio::spawn(async move {
            while let Some(msg) = read.next().await {
                match msg {
                    Ok(Message::Text(text)) => route_response(&reader_pending, &text),
                    Ok(Message::Close(_)) => break,
                    Ok(_) => {}
                    Err(e) => {
                        debug!(error = %e, "Bridge read failed");
                        break;
                    }
                }
            }
            // Dropping the senders fails every call still waiting.
            lock(&reader_pending).take();
        });

        Ok(Self {
            outgoing,
            pending,
            next_id: AtomicU64::new(1),
            reader,
            writer,
        })
    }

    pub async fn call(&self, call: Capability) -> Result<DownloadResult, SurfaceError> {
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        let text = serde_json::to_string(&RequestEnvelope { id, call })?;

        let (tx, rx) = oneshot::channel();
        match lock(&self.pending).as_mut() {
            Some(pending) => {
                pending.insert(id, tx);
            }
            None => return Err(SurfaceError::Disconnected),
        }

        if self.outgoing.send(Outgoing::Frame(text)).is_err() {
            if let Some(pending) = lock(&self.pending).as_mut() {
                pending.remove(&id);
            }
            return Err(SurfaceError::Disconnected);
        }

        rx.await.map_err(|_| SurfaceError::Disconnected)
    }

    /// Send a close frame; pending calls fail once the host acknowledges
    pub fn close(&self) {
        let _ = self.outgoing.send(Outgoing::Close);
    }

    pub fn is_connected(&self) -> bool {
        lock(&self.pending).is_some()
    }
}

impl Drop for BridgeClient {
    fn drop(&mut self) {
        self.reader.abort();
        self.writer.abort();
    }
}

fn route_response(pending: &Pending, text: &str) {
    let response: ResponseEnvelope = match serde_json::from_str(text) {
        Ok(response) => response,
        Err(e) => {
            warn!(error = %e, "Ignoring undecodable bridge reply");
            return;
        }
    };

    let Some(id) = response.id else {
        warn!(result = ?response.result, "Bridge rejected a call without an id");
        return;
    };

    let waiter = lock(pending).as_mut().and_then(|p| p.remove(&id));
    match waiter {
        Some(tx) => {
            let _ = tx.send(response.result);
        }
        None => debug!(id, "Reply for a call nobody is waiting on"),
    }
}

#[async_trait]
impl BridgeApi for BridgeClient {
    async fn download(&self, url: &str, path: &str) -> Result<String, BridgeFailure> {
        let call = Capability::Download(DownloadRequest::new(url, path));
        match self.call(call).await {
            Ok(result) => result.into(),
            Err(e) => Err(BridgeFailure::new(ErrorKind::Protocol, e.to_string())),
        }
    }
}
