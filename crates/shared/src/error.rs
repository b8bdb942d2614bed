use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    Validation,
    Service,
    Network,
    State,
    Io,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum MigrationError {
    #[error("validation error: {0}")]
    Validation(String),
    #[error("HTTP error! status: {status}, message: {body}")]
    Service { status: u16, body: String },
    #[error("malformed response (status {status}): {reason}")]
    MalformedResponse { status: u16, reason: String },
    #[error("network error: {0}")]
    Network(String),
    #[error("state error: {0}")]
    State(String),
    #[error("failed to save {file_name}: {reason}")]
    Save { file_name: String, reason: String },
}

impl MigrationError {
    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation(message.into())
    }

    pub fn state(message: impl Into<String>) -> Self {
        Self::State(message.into())
    }

    pub fn kind(&self) -> ErrorKind {
        match self {
            MigrationError::Validation(_) => ErrorKind::Validation,
            MigrationError::Service { .. } | MigrationError::MalformedResponse { .. } => {
                ErrorKind::Service
            }
            MigrationError::Network(_) => ErrorKind::Network,
            MigrationError::State(_) => ErrorKind::State,
            MigrationError::Save { .. } => ErrorKind::Io,
        }
    }
}
