//! services/client/src/error.rs
//!
//! Defines the primary error type for the client library and its binary.

use crate::api::datasets::UploadValidation;
use crate::config::ConfigError;
use astrometric_core::ports::{PortError, TransportError};
use bytes::Bytes;

/// The primary error type for the `client` service.
#[derive(Debug, thiserror::Error)]
pub enum ClientError {
    /// Represents an error that occurred during configuration loading.
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    /// Represents an error that propagated up from one of the core ports.
    #[error("Port error: {0}")]
    Port(#[from] PortError),

    /// No response was received (timeout, refused connection, DNS failure...).
    #[error("Transport error: {0}")]
    Transport(#[from] TransportError),

    /// The server answered with a non-success status.
    #[error("Server rejected the request with status {status}{}", .message.as_deref().map(|m| format!(": {m}")).unwrap_or_default())]
    Api {
        status: u16,
        message: Option<String>,
        /// The raw response body, for endpoints that attach structured detail.
        body: Bytes,
    },

    /// An uploaded file was stored but failed the server's content checks (422).
    #[error("{message}")]
    ValidationFailed {
        message: String,
        validation: Box<UploadValidation>,
        /// Where the full line-by-line report can be downloaded.
        report_url: Option<String>,
    },

    /// The access token expired and could not be renewed; the session was cleared.
    #[error("Session expired, please log in again")]
    SessionExpired,

    /// The caller passed something the server is known to reject.
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// A response body did not have the expected shape.
    #[error("Failed to decode response: {0}")]
    Decode(#[from] serde_json::Error),

    /// Represents a standard Input/Output error (e.g. reading a file to upload).
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// A catch-all for any other unexpected errors.
    #[error("An unexpected internal error occurred: {0}")]
    Internal(String),
}

/// A convenience type alias for `Result<T, ClientError>`.
pub type ClientResult<T> = Result<T, ClientError>;

/// The broad families a failure falls into, which decide how it is surfaced.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorClass {
    /// A 401 that the refresh protocol may still recover from.
    ExpiredCredential,
    /// A 401 with nothing to refresh with, or a refresh that failed.
    UnrecoverableAuth,
    /// Any other 4xx/5xx answer.
    ServerRejected,
    /// No response at all.
    Connectivity,
    /// Failures that never left the process.
    Local,
}

impl ClientError {
    /// Builds an `Api` error from a status and a raw response body.
    pub fn from_response(status: u16, body: &[u8]) -> Self {
        ClientError::Api {
            status,
            message: server_message(body),
            body: Bytes::copy_from_slice(body),
        }
    }

    pub fn status(&self) -> Option<u16> {
        match self {
            ClientError::Api { status, .. } => Some(*status),
            ClientError::ValidationFailed { .. } => Some(422),
            _ => None,
        }
    }

    /// The message the server attached to a rejection, if any.
    pub fn server_message(&self) -> Option<&str> {
        match self {
            ClientError::Api { message, .. } => message.as_deref(),
            ClientError::ValidationFailed { message, .. } => Some(message),
            _ => None,
        }
    }

    pub fn class(&self) -> ErrorClass {
        match self {
            ClientError::Api { status: 401, .. } | ClientError::SessionExpired => {
                ErrorClass::UnrecoverableAuth
            }
            ClientError::Api { .. } | ClientError::ValidationFailed { .. } => {
                ErrorClass::ServerRejected
            }
            ClientError::Transport(_) => ErrorClass::Connectivity,
            _ => ErrorClass::Local,
        }
    }
}

/// Pulls the human-readable message out of a JSON error body.
/// The server uses `error`; some endpoints answer with `message` instead.
pub fn server_message(body: &[u8]) -> Option<String> {
    let value: serde_json::Value = serde_json::from_slice(body).ok()?;
    ["error", "message", "msg"]
        .iter()
        .find_map(|key| {
            let message = value.get(*key)?.as_str()?.trim();
            (!message.is_empty()).then(|| message.to_string())
        })
}
