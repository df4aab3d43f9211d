//! Error types for the discovery engine boundary

use thiserror::Error;

/// Result type alias for engine operations
pub type Result<T> = std::result::Result<T, EngineError>;

/// Errors reported by a discovery engine.
///
/// `NotFound` is the one variant the console treats as a successful-empty
/// outcome rather than a failure.
#[derive(Debug, Error)]
pub enum EngineError {
    /// The query completed without any matching records
    #[error("no matching records found")]
    NotFound,

    /// An operation required a running engine
    #[error("mDNS engine is not running")]
    NotRunning,

    /// `init` was called while the engine was already running
    #[error("mDNS engine is already running")]
    AlreadyRunning,

    /// A parameter the engine cannot act on (unknown service, bad address)
    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    /// The underlying mDNS daemon reported a failure
    #[error("mDNS daemon error: {0}")]
    Daemon(String),
}
