//! Error types for the command framework.
//!
//! Every error here is locally recoverable: it aborts the current command,
//! is reported to the operator, and leaves the dispatch loop running.

use mdnsctl_engine::EngineError;
use thiserror::Error;

/// A single argument-validation failure.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    /// First token of the line named no registered command
    #[error("unknown command '{0}'")]
    UnknownCommand(String),

    /// A required argument was not supplied
    #[error("missing required argument <{0}>")]
    MissingArgument(String),

    /// An integer argument received a non-integer token
    #[error("argument <{0}> expects an integer")]
    TypeMismatch(String),

    /// A repeated argument exceeded its declared maximum
    #[error("too many values for <{0}> (at most {1})")]
    TooMany(String, usize),

    /// A token matched no declared argument
    #[error("unknown argument '{0}'")]
    UnknownArgument(String),
}

/// Everything that went wrong validating one invocation.
///
/// Validation accumulates instead of stopping at the first problem, so
/// the operator sees every mistake in the line at once.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationFailure {
    /// Name of the invoked command, for error prefixes.
    pub command: String,
    pub errors: Vec<ValidationError>,
}

/// A malformed TXT token.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CodecError {
    /// Token carried no `=` separator
    #[error("missing '=' in TXT item '{0}'")]
    MissingSeparator(String),

    /// Token had nothing before the `=`
    #[error("empty key in TXT item '{0}'")]
    EmptyKey(String),
}

/// Registry population failure; only possible during console startup.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RegistryError {
    #[error("command '{0}' is already registered")]
    DuplicateCommand(String),
}

/// Browse-session state misuse.
#[derive(Debug, Error)]
pub enum BrowseError {
    /// A session for this service/protocol pair is already active
    #[error("already browsing {0}.{1}")]
    AlreadyBrowsing(String, String),

    /// No active session for this service/protocol pair
    #[error("not browsing {0}.{1}")]
    NotBrowsing(String, String),

    /// The engine refused to start or stop the session
    #[error(transparent)]
    Engine(#[from] EngineError),
}

/// Failure of a dispatched command, printed by the dispatcher as
/// `ERROR: <message>` before it returns exit code 1.
#[derive(Debug, Error)]
#[error("{0}")]
pub struct CommandError(pub String);

impl CommandError {
    pub fn new(message: impl Into<String>) -> Self {
        Self(message.into())
    }
}

impl From<EngineError> for CommandError {
    fn from(err: EngineError) -> Self {
        Self(err.to_string())
    }
}

impl From<CodecError> for CommandError {
    fn from(err: CodecError) -> Self {
        Self(err.to_string())
    }
}

impl From<BrowseError> for CommandError {
    fn from(err: BrowseError) -> Self {
        Self(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validation_error_messages() {
        let err = ValidationError::MissingArgument("hostname".to_string());
        assert_eq!(err.to_string(), "missing required argument <hostname>");

        let err = ValidationError::TooMany("item".to_string(), 30);
        assert!(err.to_string().contains("at most 30"));
    }

    #[test]
    fn test_command_error_from_engine() {
        let err: CommandError = EngineError::NotRunning.into();
        assert_eq!(err.to_string(), "mDNS engine is not running");
    }
}
