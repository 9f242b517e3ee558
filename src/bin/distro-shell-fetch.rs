// SPDX-License-Identifier: GPL-3.0-only
//! Console presentation surface: asks a running shell to download one file.
//!
//! Usage: `DISTRO_SHELL_BRIDGE_URL=<connect url> distro-shell-fetch <source-url> <destination-path>`

use anyhow::Context;
use tracing::info;

use distro_shell::config::Config;
use distro_shell::logging::setup_logging;
use distro_shell::surface::{invoke_download, BridgeClient, TracingNotifier};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = Config::load()?;
    setup_logging(&config.log_level, config.log_format)?;

    let mut args = std::env::args().skip(1);
    let (Some(source_url), Some(destination)) = (args.next(), args.next()) else {
        anyhow::bail!("usage: distro-shell-fetch <source-url> <destination-path>");
    };

    // Printed by the shell on startup; carries the launch token
    let bridge_url = std::env::var("DISTRO_SHELL_BRIDGE_URL").context("DISTRO_SHELL_BRIDGE_URL is not set")?;

    let client = BridgeClient::connect(&bridge_url)
        .await
        .context("Failed to reach the shell")?;
    info!(url = %source_url, path = %destination, "Requesting download");

    let outcome = invoke_download(&client, &TracingNotifier, &source_url, &destination).await;
    client.close();
    outcome?;

    Ok(())
}
