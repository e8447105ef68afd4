//! Courier - CSV report ingestion agent
//!
//! Polls a watched directory for `*.csv` / `*.CSV` reports, uploads each one to
//! the backend's SAST or SCA import endpoint, and files it under `processed/`
//! or `failed/` depending on the outcome.

pub mod agent;
pub mod config;
pub mod error;
pub mod layout;
pub mod lifecycle;
pub mod shutdown;

pub use agent::Agent;
pub use config::AgentConfig;
pub use error::{AgentError, Result};
pub use layout::{Disposition, WatchLayout};
pub use lifecycle::{process_pending_files, CycleReport};
pub use shutdown::{install_signal_handlers, ShutdownToken};
