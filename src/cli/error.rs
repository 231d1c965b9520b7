//! CLI-level errors (wraps infrastructure errors)

use thiserror::Error;

use crate::application::{ApplicationError, IoAction};
use crate::infrastructure::InfraError;

/// CLI errors are the top-level error type.
/// These are what get displayed to the user.
#[derive(Error, Debug)]
pub enum CliError {
    #[error("{0}")]
    Infra(#[from] InfraError),

    #[error("invalid arguments: {0}")]
    InvalidArgs(String),

    #[error("{0}")]
    Usage(String),

    #[error("integrity check failed: {0}")]
    Integrity(String),
}

/// Result type for CLI operations.
pub type CliResult<T> = Result<T, CliError>;

impl From<ApplicationError> for CliError {
    fn from(e: ApplicationError) -> Self {
        CliError::Infra(InfraError::Application(e))
    }
}

impl CliError {
    /// Get the appropriate exit code for this error.
    pub fn exit_code(&self) -> i32 {
        match self {
            CliError::InvalidArgs(_) | CliError::Usage(_) => crate::exitcode::USAGE,
            CliError::Integrity(_) => crate::exitcode::DATAERR,
            CliError::Infra(e) => match e {
                InfraError::Io { .. } => crate::exitcode::IOERR,
                InfraError::Application(e) => match e {
                    ApplicationError::Codec(_) => crate::exitcode::DATAERR,
                    ApplicationError::Config { .. } => crate::exitcode::CONFIG,
                    ApplicationError::OperationFailed { action, .. } => match action {
                        IoAction::Read => crate::exitcode::NOINPUT,
                        IoAction::Write => crate::exitcode::CANTCREAT,
                    },
                    ApplicationError::Domain(_) | ApplicationError::NothingToSave => {
                        crate::exitcode::SOFTWARE
                    }
                },
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::application::CodecError;

    #[test]
    fn given_corrupt_file_error_then_dataerr() {
        let err: CliError = ApplicationError::Codec(CodecError::Truncated { offset: 3 }).into();
        assert_eq!(err.exit_code(), crate::exitcode::DATAERR);
    }

    #[test]
    fn given_open_and_write_failures_then_distinct_codes() {
        let open: CliError = ApplicationError::OperationFailed {
            action: IoAction::Read,
            context: "/x".into(),
            source: Box::new(std::io::Error::from(std::io::ErrorKind::NotFound)),
        }
        .into();
        let write: CliError = ApplicationError::OperationFailed {
            action: IoAction::Write,
            context: "/x".into(),
            source: Box::new(std::io::Error::from(std::io::ErrorKind::PermissionDenied)),
        }
        .into();
        assert_eq!(open.exit_code(), crate::exitcode::NOINPUT);
        assert_eq!(write.exit_code(), crate::exitcode::CANTCREAT);
    }

    #[test]
    fn given_usage_error_then_usage_code() {
        assert_eq!(
            CliError::Usage("x".into()).exit_code(),
            crate::exitcode::USAGE
        );
    }
}
