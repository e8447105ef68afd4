//! Cooperative shutdown for the poll loop.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tracing::info;

/// How often a sleeping poll loop re-checks the shutdown flag.
const SLEEP_SLICE: Duration = Duration::from_millis(100);

/// Shared flag requesting the poll loop to stop between cycles.
#[derive(Debug, Clone, Default)]
pub struct ShutdownToken {
    flag: Arc<AtomicBool>,
}

impl ShutdownToken {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.flag.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.flag.load(Ordering::SeqCst)
    }

    /// Sleep for `duration`, waking early on cancellation.
    /// Returns true if cancelled.
    pub async fn sleep(&self, duration: Duration) -> bool {
        let deadline = tokio::time::Instant::now() + duration;
        loop {
            if self.is_cancelled() {
                return true;
            }
            let now = tokio::time::Instant::now();
            if now >= deadline {
                return false;
            }
            tokio::time::sleep((deadline - now).min(SLEEP_SLICE)).await;
        }
    }
}

/// Cancel `token` on SIGINT/SIGTERM (Ctrl+C on Windows).
pub fn install_signal_handlers(token: &ShutdownToken) -> std::io::Result<()> {
    #[cfg(unix)]
    {
        use signal_hook::consts::{SIGINT, SIGTERM};
        use signal_hook::iterator::Signals;

        let handler_token = token.clone();
        let mut signals = Signals::new([SIGINT, SIGTERM])?;
        std::thread::spawn(move || {
            if let Some(sig) = signals.forever().next() {
                info!("Received signal {}, shutting down after the current cycle...", sig);
                handler_token.cancel();
            }
        });
    }

    #[cfg(windows)]
    {
        let handler_token = token.clone();
        ctrlc::set_handler(move || {
            info!("Received Ctrl+C, shutting down after the current cycle...");
            handler_token.cancel();
        })
        .map_err(|e| std::io::Error::new(std::io::ErrorKind::Other, e))?;
    }

    Ok(())
}
