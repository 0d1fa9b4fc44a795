//! Error types for the question-answering interface.

use tabletalk_core::error::TableTalkError;

/// Errors from the chat engine.
#[derive(Debug, thiserror::Error)]
pub enum ChatError {
    #[error("chat is disabled")]
    Disabled,
    #[error("message cannot be empty")]
    EmptyMessage,
    #[error("message exceeds maximum length of {0} characters")]
    MessageTooLong(usize),
}

impl From<ChatError> for TableTalkError {
    fn from(err: ChatError) -> Self {
        TableTalkError::Chat(err.to_string())
    }
}
