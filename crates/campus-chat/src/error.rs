//! Error types for the chat controller.

use campus_client::ClientError;
use campus_core::error::CampusError;
use campus_render::RenderError;

use crate::transcript::MessageId;

/// Errors from the chat controller and its collaborators.
#[derive(Debug, thiserror::Error)]
pub enum ChatError {
    #[error("message cannot be empty")]
    EmptyMessage,
    #[error("message not found: {0}")]
    MessageNotFound(MessageId),
    #[error("message already resolved: {0}")]
    AlreadyResolved(MessageId),
    #[error("message {0} is not a bot reply")]
    NotABotMessage(usize),
    #[error("invalid query transition: {0}")]
    InvalidTransition(String),
    #[error("backend error: {0}")]
    Backend(#[from] ClientError),
    #[error("render error: {0}")]
    Render(#[from] RenderError),
    #[error("voice error: {0}")]
    VoiceError(String),
    #[error("storage error: {0}")]
    StorageError(String),
}

impl From<CampusError> for ChatError {
    fn from(err: CampusError) -> Self {
        ChatError::StorageError(err.to_string())
    }
}
