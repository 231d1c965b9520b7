//! Application-level errors (wraps domain and codec errors)

use thiserror::Error;

use crate::application::codec::CodecError;
use crate::domain::DomainError;

/// Which side of a knowledge file transfer failed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IoAction {
    Read,
    Write,
}

impl std::fmt::Display for IoAction {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            IoAction::Read => write!(f, "open knowledge file"),
            IoAction::Write => write!(f, "write knowledge file"),
        }
    }
}

/// Application errors wrap domain errors and add persistence and configuration context.
#[derive(Error, Debug)]
pub enum ApplicationError {
    #[error("{0}")]
    Domain(#[from] DomainError),

    #[error("{0}")]
    Codec(#[from] CodecError),

    #[error("no knowledge tree to save")]
    NothingToSave,

    #[error("config error: {message}")]
    Config { message: String },

    #[error("operation failed: {action}: {context}")]
    OperationFailed {
        action: IoAction,
        context: String,
        #[source]
        source: Box<dyn std::error::Error + Send + Sync>,
    },
}

/// Result type for application layer operations.
pub type ApplicationResult<T> = Result<T, ApplicationError>;
