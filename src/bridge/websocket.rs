// SPDX-License-Identifier: GPL-3.0-only
use axum::extract::ws::{Message, WebSocket, WebSocketUpgrade};
use axum::extract::{Query, State};
use axum::http::{header, HeaderMap, StatusCode};
use axum::response::{IntoResponse, Response};
use futures_util::{SinkExt, StreamExt};
use serde::Deserialize;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;
use tracing::{debug, error, info, warn};
use uuid::Uuid;

use crate::bridge::http::BridgeState;

/// How long cancelled calls get to deliver their final reply
const REPLY_GRACE: Duration = Duration::from_secs(2);

#[derive(Debug, Deserialize)]
pub struct ConnectParams {
    token: Option<String>,
}

pub async fn ws_handler(
    ws: WebSocketUpgrade,
    Query(params): Query<ConnectParams>,
    headers: HeaderMap,
    State(state): State<BridgeState>,
) -> Response {
    if let Err(denied) = state
        .access
        .check(params.token.as_deref(), headers.get(header::ORIGIN))
    {
        warn!(reason = %denied, "Refusing bridge upgrade");
        return (StatusCode::FORBIDDEN, denied.to_string()).into_response();
    }

    ws.on_upgrade(move |socket| handle_socket(socket, state))
}

/// One connected presentation surface.
///
/// The surface owns a window for as long as the socket is open. Its calls
/// run concurrently; closing the socket cancels whatever is still running.
async fn handle_socket(socket: WebSocket, state: BridgeState) {
    let Some(window) = state.shell.attach_surface() else {
        info!("Refusing surface connection, shell is shutting down");
        return;
    };
    let session = Uuid::new_v4();
    let cancel = state.shell.shutdown_token().child_token();
    info!(%session, %window, "Surface connected");

    let (sender, mut receiver) = socket.split();
    let (tx, mut rx) = mpsc::unbounded_channel();

    let mut send_task = tokio::spawn(async move {
        let mut sender = sender;
        while let Some(msg) = rx.recv().await {
            if let Err(e) = sender.send(msg).await {
                error!(error = %e, "Failed to send bridge reply");
                break;
            }
        }
    });

    let bridge = Arc::clone(&state.bridge);
    let calls_cancel = cancel.clone();
    let mut recv_task = tokio::spawn(async move {
        while let Some(Ok(msg)) = receiver.next().await {
            match msg {
                Message::Text(text) => {
                    let bridge = Arc::clone(&bridge);
                    let tx = tx.clone();
                    let cancel = calls_cancel.child_token();
                    tokio::spawn(async move {
                        let reply = bridge.handle_text(&text, cancel).await;
                        if tx.send(Message::Text(reply)).is_err() {
                            debug!(%session, "Surface left before reply was sent");
                        }
                    });
                }
                Message::Close(_) => {
                    info!(%session, "Surface closed the bridge");
                    break;
                }
                _ => {}
            }
        }
    });

    tokio::select! {
        _ = (&mut send_task) => recv_task.abort(),
        _ = (&mut recv_task) => {}
        _ = cancel.cancelled() => recv_task.abort(),
    };

    // Calls still running see the cancellation and answer `cancelled`.
    cancel.cancel();
    if !send_task.is_finished() && tokio::time::timeout(REPLY_GRACE, &mut send_task).await.is_err() {
        send_task.abort();
    }
    state.shell.close_window(window);
    info!(%session, %window, "Surface disconnected");
}
