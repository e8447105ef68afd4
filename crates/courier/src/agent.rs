//! Poll loop driving the ingestion cycles.

use crate::error::Result;
use crate::layout::WatchLayout;
use crate::lifecycle::{process_pending_files, CycleReport};
use crate::shutdown::ShutdownToken;
use courier_client::{ImportTransport, Uploader};
use std::time::Duration;
use tracing::{info, warn};

/// Owns the watched layout and the uploader (and through it, the session).
pub struct Agent<T> {
    layout: WatchLayout,
    uploader: Uploader<T>,
    poll_interval: Duration,
}

impl<T: ImportTransport> Agent<T> {
    pub fn new(layout: WatchLayout, transport: T, poll_interval: Duration) -> Self {
        Self {
            layout,
            uploader: Uploader::new(transport),
            poll_interval,
        }
    }

    pub fn transport(&self) -> &T {
        self.uploader.transport()
    }

    /// Create the directory layout and attempt an initial login.
    ///
    /// A failed login is only a warning: uploads re-authenticate on 401.
    /// Failing to create the directories is fatal.
    pub async fn bootstrap(&mut self) -> Result<()> {
        self.layout.ensure()?;
        info!(dir = %self.layout.root().display(), "Watching for reports");

        if !self.uploader.transport_mut().authenticate().await {
            warn!("Initial login failed; uploads will retry authentication on demand");
        }
        Ok(())
    }

    /// Run one cycle over the current candidates.
    pub async fn process_pending_files(&mut self) -> Result<CycleReport> {
        process_pending_files(&self.layout, &mut self.uploader).await
    }

    /// Cycle, then sleep, until `shutdown` is cancelled.
    ///
    /// Cancellation is honored between cycles, never mid-upload. Cycle errors
    /// (an unreadable watched directory) end the loop.
    pub async fn run(&mut self, shutdown: &ShutdownToken) -> Result<()> {
        info!(
            interval_secs = self.poll_interval.as_secs(),
            "Starting poll loop"
        );
        while !shutdown.is_cancelled() {
            self.process_pending_files().await?;
            if shutdown.sleep(self.poll_interval).await {
                break;
            }
        }
        info!("Poll loop stopped");
        Ok(())
    }
}
