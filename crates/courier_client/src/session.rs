//! Backend session client
//!
//! Holds the HTTP client (default headers plus cookie store) and the access
//! token returned by the last successful login. Login is a JSON
//! `POST {base}/auth/login`; imports are multipart `POST {base}/import/{kind}`.

use crate::classify::ImportEndpoint;
use crate::error::ClientError;
use crate::upload::{report_file_name, ImportResponse, ImportTransport};
use async_trait::async_trait;
use reqwest::header::{HeaderMap, HeaderValue, ACCEPT};
use reqwest::multipart::{Form, Part};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::Path;
use std::time::Duration;
use tracing::{debug, error, info};

/// Timeout for the login call.
pub const LOGIN_TIMEOUT: Duration = Duration::from_secs(30);

/// Timeout for a single report upload.
pub const UPLOAD_TIMEOUT: Duration = Duration::from_secs(120);

const LOGIN_PATH: &str = "/auth/login";
const REPORT_FIELD: &str = "file";
const REPORT_MIME: &str = "text/csv";
const USER_AGENT: &str = concat!("courier/", env!("CARGO_PKG_VERSION"));

/// Login identifier and secret.
#[derive(Clone, PartialEq, Eq)]
pub struct Credentials {
    pub identifier: String,
    pub secret: String,
}

impl Credentials {
    pub fn new(identifier: impl Into<String>, secret: impl Into<String>) -> Self {
        Self {
            identifier: identifier.into(),
            secret: secret.into(),
        }
    }

    /// Both halves must be present and non-empty.
    pub fn from_parts(identifier: Option<String>, secret: Option<String>) -> Option<Self> {
        match (identifier, secret) {
            (Some(identifier), Some(secret)) if !identifier.is_empty() && !secret.is_empty() => {
                Some(Self { identifier, secret })
            }
            _ => None,
        }
    }
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("identifier", &self.identifier)
            .field("secret", &"<redacted>")
            .finish()
    }
}

#[derive(Debug, Serialize)]
struct LoginRequest<'a> {
    email: &'a str,
    password: &'a str,
}

#[derive(Debug, Deserialize)]
struct LoginResponse {
    #[serde(default, alias = "accessToken", alias = "token")]
    access_token: Option<String>,
}

/// HTTP session against the backend API.
pub struct SessionClient {
    base_url: String,
    http: reqwest::Client,
    credentials: Option<Credentials>,
    access_token: Option<String>,
}

impl SessionClient {
    /// Build a client for `base_url`; trailing slashes are stripped.
    pub fn new(
        base_url: impl Into<String>,
        credentials: Option<Credentials>,
    ) -> Result<Self, ClientError> {
        let mut headers = HeaderMap::new();
        headers.insert(ACCEPT, HeaderValue::from_static("application/json"));

        let http = reqwest::Client::builder()
            .default_headers(headers)
            .user_agent(USER_AGENT)
            .cookie_store(true)
            .build()?;

        let base_url = base_url.into().trim_end_matches('/').to_string();
        Ok(Self {
            base_url,
            http,
            credentials,
            access_token: None,
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Whether a login has produced an access token.
    pub fn is_authenticated(&self) -> bool {
        self.access_token.is_some()
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    /// Log in, reporting the outcome as a boolean and logging any failure.
    pub async fn login(&mut self) -> bool {
        match self.try_login().await {
            Ok(()) => {
                info!(base_url = %self.base_url, "Authenticated with backend");
                true
            }
            Err(ClientError::MissingCredentials) => {
                error!("Cannot log in: login identifier and secret are not configured");
                false
            }
            Err(err) => {
                error!(status = ?err.status(), error = %err, "Login failed");
                false
            }
        }
    }

    /// Log in and store the returned session token.
    ///
    /// A 2xx response without a token is still a success; the backend may be
    /// relying on the session cookie instead.
    pub async fn try_login(&mut self) -> Result<(), ClientError> {
        let credentials = self
            .credentials
            .as_ref()
            .ok_or(ClientError::MissingCredentials)?;

        let response = self
            .http
            .post(self.url(LOGIN_PATH))
            .json(&LoginRequest {
                email: &credentials.identifier,
                password: &credentials.secret,
            })
            .timeout(LOGIN_TIMEOUT)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(ClientError::Status {
                status: status.as_u16(),
                body,
            });
        }

        let body = response.text().await?;
        match serde_json::from_str::<LoginResponse>(&body) {
            Ok(LoginResponse {
                access_token: Some(token),
            }) => {
                self.access_token = Some(token);
            }
            _ => debug!("Login response carried no access token; relying on session cookie"),
        }
        Ok(())
    }
}

#[async_trait]
impl ImportTransport for SessionClient {
    async fn authenticate(&mut self) -> bool {
        self.login().await
    }

    async fn post_report(
        &self,
        endpoint: ImportEndpoint,
        path: &Path,
    ) -> Result<ImportResponse, ClientError> {
        let contents = tokio::fs::read(path)
            .await
            .map_err(|source| ClientError::ReadReport {
                path: path.to_path_buf(),
                source,
            })?;

        let part = Part::bytes(contents)
            .file_name(report_file_name(path))
            .mime_str(REPORT_MIME)?;
        let form = Form::new().part(REPORT_FIELD, part);

        let mut request = self
            .http
            .post(self.url(endpoint.path()))
            .multipart(form)
            .timeout(UPLOAD_TIMEOUT);
        if let Some(token) = &self.access_token {
            request = request.bearer_auth(token);
        }

        let response = request.send().await?;
        let status = response.status().as_u16();
        let body = response.text().await?;
        debug!(path = %path.display(), %endpoint, status, "Import call completed");
        Ok(ImportResponse { status, body })
    }
}
