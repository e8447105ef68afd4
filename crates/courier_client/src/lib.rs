//! Courier backend client
//!
//! Provides:
//! - **Classifier**: routes a report file name to the SAST or SCA import endpoint
//! - **SessionClient**: HTTP session with login and re-authentication
//! - **Uploader**: multipart report upload with a single retry after re-login

pub mod classify;
pub mod error;
pub mod session;
pub mod upload;

pub use classify::{determine_endpoint, ImportEndpoint};
pub use error::ClientError;
pub use session::{Credentials, SessionClient, LOGIN_TIMEOUT, UPLOAD_TIMEOUT};
pub use upload::{ImportResponse, ImportTransport, ResponsePayload, UploadOutcome, Uploader};
