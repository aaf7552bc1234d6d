//! Error types for the build server client.

use thiserror::Error;

/// Errors that can occur when talking to the build server.
///
/// Every gateway call classifies its failure into exactly one of these. None
/// of them is retried internally.
#[derive(Debug, Error)]
pub enum ClientError {
    /// Credentials missing or unusable. Raised before any network call.
    #[error("authentication configuration error: {0}")]
    AuthConfiguration(String),

    /// Connection, TLS or protocol failure.
    #[error("HTTP transport error: {0}")]
    Transport(#[from] reqwest::Error),

    /// No response within the configured timeout.
    #[error("request timed out: {path}")]
    Timeout { path: String },

    /// The server answered with a non-2xx status.
    #[error("remote API error on {path}: HTTP {status}")]
    RemoteApi {
        path: String,
        status: u16,
        body: String,
    },

    /// Response body was not the expected JSON.
    #[error("serialization error on {path}: {source}")]
    Serialization {
        path: String,
        #[source]
        source: serde_json::Error,
    },

    /// A required identifier was empty.
    #[error("invalid argument: {0}")]
    InvalidArgument(String),
}

impl ClientError {
    /// HTTP status for remote API errors.
    pub fn status(&self) -> Option<u16> {
        match self {
            Self::RemoteApi { status, .. } => Some(*status),
            _ => None,
        }
    }

    /// Raw response body for remote API errors.
    pub fn body(&self) -> Option<&str> {
        match self {
            Self::RemoteApi { body, .. } => Some(body),
            _ => None,
        }
    }

    pub fn is_timeout(&self) -> bool {
        matches!(self, Self::Timeout { .. })
    }
}
