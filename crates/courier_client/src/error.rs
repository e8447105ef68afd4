//! Error types for the backend client

use std::io;
use std::path::PathBuf;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ClientError {
    #[error("Credentials not configured (identifier and secret are both required)")]
    MissingCredentials,

    #[error("HTTP error: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("HTTP {status}: {body}")]
    Status { status: u16, body: String },

    #[error("Failed to read report {}: {source}", path.display())]
    ReadReport {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

impl ClientError {
    /// True for failures on the local side that never reached the network.
    pub fn is_local(&self) -> bool {
        matches!(self, ClientError::ReadReport { .. })
    }

    pub fn status(&self) -> Option<u16> {
        match self {
            ClientError::Status { status, .. } => Some(*status),
            ClientError::Transport(err) => err.status().map(|s| s.as_u16()),
            _ => None,
        }
    }
}
