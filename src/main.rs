// SPDX-License-Identifier: GPL-3.0-only
use std::sync::Arc;
use std::time::Duration;
use tokio::signal;
use tracing::{error, info, warn};

use distro_shell::bridge::{Bridge, BridgeAccess, HttpServer};
use distro_shell::config::Config;
use distro_shell::downloader::{HttpClient, StreamingDownloader};
use distro_shell::host::{DownloadPolicy, DownloadService, HostCapabilities};
use distro_shell::logging::setup_logging;
use distro_shell::shell::Shell;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load configuration
    let config = Config::load()?;

    // Initialize logging
    setup_logging(&config.log_level, config.log_format)?;

    info!("Starting distro-shell v{}", env!("CARGO_PKG_VERSION"));

    // Window lifecycle: one main window until the last one closes
    let shell = Shell::init(&config);

    // Host capability
    let client = HttpClient::new(config.user_agent.as_deref())?;
    let downloader = Arc::new(StreamingDownloader::new(client));
    let service = Arc::new(DownloadService::new(downloader, DownloadPolicy::from_config(&config)));
    info!(download_dir = %config.download_dir.display(), "Download capability ready");

    // Start bridge server
    let host: Arc<dyn HostCapabilities> = service.clone();
    let bridge = Arc::new(Bridge::new(host));
    let access = BridgeAccess::generate(config.allowed_origins.clone());
    let server = HttpServer::new(bridge, Arc::clone(&shell), access, config.bridge_bind);
    let listener = server.bind().await?;
    let local_addr = listener.local_addr()?;
    info!(addr = %local_addr, origins = ?config.allowed_origins, "Bridge listening");

    // Connect URL for the launcher; it carries the launch token and is never logged
    println!("{}", server.surface_url(local_addr));
    let mut server_task = tokio::spawn(server.serve_on(listener));

    info!("Shell running. Waiting for windows to close or a shutdown signal...");

    tokio::select! {
        result = signal::ctrl_c() => match result {
            Ok(()) => info!("Received shutdown signal (Ctrl+C)"),
            Err(err) => error!(error = %err, "Unable to listen for shutdown signal"),
        },
        _ = shell.terminated() => info!("Last window closed"),
        result = &mut server_task => {
            match result {
                Ok(Ok(())) => warn!("Bridge server stopped unexpectedly"),
                Ok(Err(e)) => error!(error = %e, "Bridge server error"),
                Err(e) => error!(error = %e, "Bridge server task failed"),
            }
            shell.finish();
            return Ok(());
        }
    }

    // Graceful shutdown
    info!(in_flight = service.in_flight(), "Initiating graceful shutdown...");
    shell.teardown();

    match tokio::time::timeout(Duration::from_secs(5), server_task).await {
        Ok(Ok(Err(e))) => error!(error = %e, "Bridge server error during shutdown"),
        Ok(_) => {}
        Err(_) => warn!("Bridge server did not stop in time"),
    }

    shell.finish();
    info!("Shutdown complete");
    Ok(())
}
