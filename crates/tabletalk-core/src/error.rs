use thiserror::Error;

use crate::types::TableId;

/// Top-level error type for TableTalk.
///
/// Subsystem crates define their own error types and implement
/// `From<SubsystemError> for TableTalkError` so that `?` works across crate
/// boundaries.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum TableTalkError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Parse error: {0}")]
    Parse(String),

    #[error("Merge error: {0}")]
    Merge(String),

    #[error("Table not found: {id}")]
    NotFound { id: TableId },

    #[error("Storage error: {0}")]
    Storage(String),

    #[error("Chat error: {0}")]
    Chat(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(String),
}

impl TableTalkError {
    pub fn not_found(id: impl Into<TableId>) -> Self {
        TableTalkError::NotFound { id: id.into() }
    }
}

impl From<toml::de::Error> for TableTalkError {
    fn from(err: toml::de::Error) -> Self {
        TableTalkError::Config(err.to_string())
    }
}

impl From<toml::ser::Error> for TableTalkError {
    fn from(err: toml::ser::Error) -> Self {
        TableTalkError::Config(err.to_string())
    }
}

impl From<serde_json::Error> for TableTalkError {
    fn from(err: serde_json::Error) -> Self {
        TableTalkError::Serialization(err.to_string())
    }
}

/// A specialized `Result` type for TableTalk operations.
pub type Result<T> = std::result::Result<T, TableTalkError>;
