//! Error types for flow execution.

use thiserror::Error;

/// The failure type reported by operations and forwarded by the runners.
///
/// Runners never inspect or rewrap a failure: whatever an operation reports
/// through its [`Completion`](crate::Completion) reaches the final callback
/// unchanged.
#[derive(Error, Debug)]
pub enum Error {
    /// An operation failed while doing its work.
    #[error("Execution error: {0}")]
    Execution(String),

    /// An operation rejected its input.
    #[error("Validation error: {0}")]
    Validation(String),

    /// The final callback was dropped without ever being invoked.
    ///
    /// Only produced by the adapters in [`future`](crate::future), when some
    /// operation dropped its completion handle instead of reporting.
    #[error("Flow abandoned: a completion handle was dropped without reporting")]
    Abandoned,

    /// A JSON serialization error while exporting a trace.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// A generic error with a message.
    #[error("{0}")]
    Message(String),
}

impl From<String> for Error {
    fn from(msg: String) -> Self {
        Error::Message(msg)
    }
}

impl From<&str> for Error {
    fn from(msg: &str) -> Self {
        Error::Message(msg.to_string())
    }
}

/// A specialized `Result` type for flow operations.
pub type Result<T> = std::result::Result<T, Error>;
