//! Report upload with a single retry after re-authentication.

use crate::classify::{determine_endpoint, ImportEndpoint};
use crate::error::ClientError;
use async_trait::async_trait;
use std::fmt;
use std::path::Path;
use tracing::{error, info, warn};

/// One upload plus at most one retry after re-authentication.
const MAX_UPLOAD_ATTEMPTS: usize = 2;

const STATUS_UNAUTHORIZED: u16 = 401;

/// Raw response of an import call, before status interpretation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImportResponse {
    pub status: u16,
    pub body: String,
}

impl ImportResponse {
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }

    pub fn is_unauthorized(&self) -> bool {
        self.status == STATUS_UNAUTHORIZED
    }
}

/// Backend operations the uploader needs.
///
/// `SessionClient` is the HTTP implementation; tests substitute fakes.
#[async_trait]
pub trait ImportTransport: Send {
    /// Log in again, replacing the session state. Returns false on any failure.
    async fn authenticate(&mut self) -> bool;

    /// Send the file at `path` as a multipart upload to `endpoint`.
    ///
    /// Non-2xx statuses are returned as `Ok`; only transport and local read
    /// failures are errors.
    async fn post_report(
        &self,
        endpoint: ImportEndpoint,
        path: &Path,
    ) -> Result<ImportResponse, ClientError>;
}

/// Response body of a successful import.
#[derive(Debug, Clone, PartialEq)]
pub enum ResponsePayload {
    Json(serde_json::Value),
    Text(String),
}

impl ResponsePayload {
    /// Decode as JSON, falling back to the raw text.
    pub fn decode(body: &str) -> Self {
        match serde_json::from_str(body) {
            Ok(value) => ResponsePayload::Json(value),
            Err(_) => ResponsePayload::Text(body.to_string()),
        }
    }
}

impl fmt::Display for ResponsePayload {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ResponsePayload::Json(value) => write!(f, "{}", value),
            ResponsePayload::Text(text) => f.write_str(text),
        }
    }
}

/// Result of uploading one report.
#[derive(Debug)]
pub enum UploadOutcome {
    Uploaded {
        endpoint: ImportEndpoint,
        payload: ResponsePayload,
    },
    Failed {
        endpoint: ImportEndpoint,
        error: ClientError,
    },
}

impl UploadOutcome {
    pub fn is_success(&self) -> bool {
        matches!(self, UploadOutcome::Uploaded { .. })
    }
}

/// Uploads report files through an [`ImportTransport`].
pub struct Uploader<T> {
    transport: T,
}

impl<T: ImportTransport> Uploader<T> {
    pub fn new(transport: T) -> Self {
        Self { transport }
    }

    pub fn transport(&self) -> &T {
        &self.transport
    }

    pub fn transport_mut(&mut self) -> &mut T {
        &mut self.transport
    }

    pub fn into_inner(self) -> T {
        self.transport
    }

    /// Upload a report and report success as a boolean.
    ///
    /// Local read failures count as failure here; use [`Uploader::upload`] to
    /// tell them apart.
    pub async fn upload_file(&mut self, path: &Path) -> bool {
        match self.upload(path).await {
            Ok(outcome) => outcome.is_success(),
            Err(err) => {
                error!(path = %path.display(), error = %err, "Upload aborted");
                false
            }
        }
    }

    /// Upload a report, re-authenticating once if the session has expired.
    ///
    /// The file is read again for the retry. Returns `Err` only when the file
    /// itself cannot be read.
    pub async fn upload(&mut self, path: &Path) -> Result<UploadOutcome, ClientError> {
        let file_name = report_file_name(path);
        let endpoint = determine_endpoint(&file_name);

        let mut attempt = 0;
        let response = loop {
            attempt += 1;
            let response = match self.transport.post_report(endpoint, path).await {
                Ok(response) => response,
                Err(err) if err.is_local() => return Err(err),
                Err(err) => {
                    error!(file = %file_name, %endpoint, error = %err, "Upload failed");
                    return Ok(UploadOutcome::Failed { endpoint, error: err });
                }
            };

            if response.is_unauthorized() && attempt < MAX_UPLOAD_ATTEMPTS {
                warn!(file = %file_name, "Session rejected (401), re-authenticating");
                if self.transport.authenticate().await {
                    continue;
                }
                warn!(file = %file_name, "Re-authentication failed, not retrying upload");
            }
            break response;
        };

        if !response.is_success() {
            error!(
                file = %file_name,
                %endpoint,
                status = response.status,
                body = %response.body,
                "Upload rejected"
            );
            return Ok(UploadOutcome::Failed {
                endpoint,
                error: ClientError::Status {
                    status: response.status,
                    body: response.body,
                },
            });
        }

        let payload = ResponsePayload::decode(&response.body);
        info!(file = %file_name, %endpoint, payload = %payload, "Uploaded report");
        Ok(UploadOutcome::Uploaded { endpoint, payload })
    }
}

/// Base name of the report, as sent in the multipart filename.
pub(crate) fn report_file_name(path: &Path) -> String {
    path.file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_default()
}
