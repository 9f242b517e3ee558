// SPDX-License-Identifier: GPL-3.0-only
use axum::{routing::get, Json, Router};
use serde::{Deserialize, Serialize};
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::net::TcpListener;
use tracing::info;

use crate::bridge::access::BridgeAccess;
use crate::bridge::dispatch::Bridge;
use crate::bridge::websocket::ws_handler;
use crate::shell::Shell;

#[derive(Debug, Serialize, Deserialize)]
pub struct ApiResponse<T> {
    pub success: bool,
    pub data: Option<T>,
    pub error: Option<String>,
}

impl<T> ApiResponse<T> {
    pub fn success(data: T) -> Self {
        Self {
            success: true,
            data: Some(data),
            error: None,
        }
    }
}

#[derive(Clone)]
pub struct BridgeState {
    pub bridge: Arc<Bridge>,
    pub shell: Arc<Shell>,
    pub access: Arc<BridgeAccess>,
}

/// Loopback endpoint presentation surfaces connect to
pub struct HttpServer {
    state: BridgeState,
    addr: SocketAddr,
}

impl HttpServer {
    pub fn new(bridge: Arc<Bridge>, shell: Arc<Shell>, access: BridgeAccess, addr: SocketAddr) -> Self {
        Self {
            state: BridgeState {
                bridge,
                shell,
                access: Arc::new(access),
            },
            addr,
        }
    }

    /// Connect URL handed to the presentation surface; carries the launch token
    pub fn surface_url(&self, local_addr: SocketAddr) -> String {
        format!("ws://{}/ws?token={}", local_addr, self.state.access.token())
    }

    pub fn router(&self) -> Router {
        Router::new()
            .route("/health", get(health_handler))
            .route("/ws", get(ws_handler))
            .with_state(self.state.clone())
    }

    pub async fn bind(&self) -> anyhow::Result<TcpListener> {
        Ok(TcpListener::bind(&self.addr).await?)
    }

    /// Serve until the shell starts tearing down
    pub async fn serve_on(self, listener: TcpListener) -> anyhow::Result<()> {
        info!(addr = %listener.local_addr()?, "Starting bridge server");

        let shell = Arc::clone(&self.state.shell);
        axum::serve(listener, self.router())
            .with_graceful_shutdown(async move { shell.terminated().await })
            .await?;

        info!("Bridge server stopped");
        Ok(())
    }
}

async fn health_handler() -> Json<ApiResponse<&'static str>> {
    Json(ApiResponse::success("ok"))
}
