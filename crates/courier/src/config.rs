//! Agent configuration
//!
//! Resolved once at startup from the environment. Empty values count as unset.
//!
//! | Variable         | Default                   |
//! |------------------|---------------------------|
//! | `API_URL`        | `http://backend:4000/api` |
//! | `AGENT_EMAIL`    | none                      |
//! | `AGENT_PASSWORD` | none                      |
//! | `WATCH_DIR`      | `/data`                   |
//! | `POLL_INTERVAL`  | `30` (seconds)            |

use crate::error::{AgentError, Result};
use courier_client::Credentials;
use std::path::PathBuf;
use std::time::Duration;

pub const API_URL_ENV: &str = "API_URL";
pub const EMAIL_ENV: &str = "AGENT_EMAIL";
pub const PASSWORD_ENV: &str = "AGENT_PASSWORD";
pub const WATCH_DIR_ENV: &str = "WATCH_DIR";
pub const POLL_INTERVAL_ENV: &str = "POLL_INTERVAL";

pub const DEFAULT_API_URL: &str = "http://backend:4000/api";
pub const DEFAULT_WATCH_DIR: &str = "/data";
pub const DEFAULT_POLL_INTERVAL_SECS: u64 = 30;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AgentConfig {
    /// Backend API root, without a trailing slash.
    pub api_url: String,
    /// Absent unless both identifier and secret are configured.
    pub credentials: Option<Credentials>,
    pub watch_dir: PathBuf,
    pub poll_interval: Duration,
}

impl Default for AgentConfig {
    fn default() -> Self {
        Self {
            api_url: DEFAULT_API_URL.to_string(),
            credentials: None,
            watch_dir: PathBuf::from(DEFAULT_WATCH_DIR),
            poll_interval: Duration::from_secs(DEFAULT_POLL_INTERVAL_SECS),
        }
    }
}

impl AgentConfig {
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Resolve configuration through `lookup`, which maps a variable name to its value.
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).filter(|value| !value.trim().is_empty());

        let api_url = get(API_URL_ENV)
            .unwrap_or_else(|| DEFAULT_API_URL.to_string())
            .trim_end_matches('/')
            .to_string();

        let credentials = Credentials::from_parts(get(EMAIL_ENV), get(PASSWORD_ENV));

        let watch_dir = get(WATCH_DIR_ENV)
            .map(PathBuf::from)
            .unwrap_or_else(|| PathBuf::from(DEFAULT_WATCH_DIR));

        let poll_interval = match get(POLL_INTERVAL_ENV) {
            Some(raw) => {
                let secs = raw.trim().parse::<u64>().map_err(|_| {
                    AgentError::Config(format!(
                        "{} must be a whole number of seconds, got '{}'",
                        POLL_INTERVAL_ENV, raw
                    ))
                })?;
                Duration::from_secs(secs)
            }
            None => Duration::from_secs(DEFAULT_POLL_INTERVAL_SECS),
        };

        Ok(Self {
            api_url,
            credentials,
            watch_dir,
            poll_interval,
        })
    }
}
