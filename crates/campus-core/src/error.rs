use thiserror::Error;

/// Top-level error type for the campus navigator.
///
/// Subsystem crates define their own error types and implement
/// `From<CampusError>` so that the `?` operator works across crate boundaries.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum CampusError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Protocol error: {0}")]
    Protocol(String),

    #[error("Storage error: {0}")]
    Storage(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(String),
}

impl From<toml::de::Error> for CampusError {
    fn from(err: toml::de::Error) -> Self {
        CampusError::Config(err.to_string())
    }
}

impl From<toml::ser::Error> for CampusError {
    fn from(err: toml::ser::Error) -> Self {
        CampusError::Config(err.to_string())
    }
}

impl From<serde_json::Error> for CampusError {
    fn from(err: serde_json::Error) -> Self {
        CampusError::Serialization(err.to_string())
    }
}

/// A specialized `Result` type for campus navigator operations.
pub type Result<T> = std::result::Result<T, CampusError>;
