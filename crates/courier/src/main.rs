//! Courier agent
//!
//! Long-running foreground process configured entirely through the
//! environment (see [`courier::config`]). Exits 0 after SIGINT/SIGTERM,
//! non-zero on a fatal error.

use anyhow::{Context, Result};
use courier::{install_signal_handlers, Agent, AgentConfig, ShutdownToken, WatchLayout};
use courier_client::SessionClient;
use courier_logging::{init_logging, LogConfig};
use tracing::info;

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<()> {
    let _log_guard = init_logging(LogConfig::from_env("courier"))?;

    let config = AgentConfig::from_env().context("Failed to load configuration")?;
    info!(
        api_url = %config.api_url,
        watch_dir = %config.watch_dir.display(),
        poll_interval_secs = config.poll_interval.as_secs(),
        credentials = config.credentials.is_some(),
        "Starting Courier agent"
    );

    let shutdown = ShutdownToken::new();
    install_signal_handlers(&shutdown).context("Failed to install signal handlers")?;

    let client = SessionClient::new(&config.api_url, config.credentials.clone())
        .context("Failed to build HTTP client")?;
    let mut agent = Agent::new(
        WatchLayout::new(&config.watch_dir),
        client,
        config.poll_interval,
    );

    agent
        .bootstrap()
        .await
        .context("Failed to prepare watched directory")?;
    agent.run(&shutdown).await.context("Poll loop failed")?;

    info!("Shutdown complete");
    Ok(())
}
