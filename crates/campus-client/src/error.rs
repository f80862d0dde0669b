//! Error types for the backend client.

use campus_core::error::CampusError;

/// Errors from talking to the campus backend.
#[derive(Debug, thiserror::Error)]
pub enum ClientError {
    #[error("request failed: {0}")]
    Request(String),
    #[error("backend returned HTTP {status}: {message}")]
    Http { status: u16, message: String },
    #[error("malformed response: {0}")]
    Malformed(String),
    #[error("protocol error: {0}")]
    Protocol(String),
    #[error("configuration error: {0}")]
    Config(String),
}

impl From<reqwest::Error> for ClientError {
    fn from(err: reqwest::Error) -> Self {
        ClientError::Request(err.to_string())
    }
}

impl From<CampusError> for ClientError {
    fn from(err: CampusError) -> Self {
        match err {
            CampusError::Protocol(msg) => ClientError::Protocol(msg),
            CampusError::Config(msg) => ClientError::Config(msg),
            CampusError::Serialization(msg) => ClientError::Malformed(msg),
            other => ClientError::Request(other.to_string()),
        }
    }
}
