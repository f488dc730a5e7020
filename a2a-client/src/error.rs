//! Error types for task client operations

use thiserror::Error;

/// Fatal errors surfaced by the task client.
///
/// Transport failures never appear here: they are recovered locally into a
/// degraded outcome (see `SendOutcome::Degraded`). What remains is the fatal
/// leg: a well-formed protocol error from the remote skill, a malformed
/// success payload, or a misconfigured call.
#[derive(Debug, Error)]
pub enum TaskClientError {
    /// Remote skill returned a JSON-RPC error object.
    #[error("Remote skill error ({code}): {message}")]
    Protocol { code: i32, message: String },

    /// JSON serialization/deserialization error.
    #[error("Serialization error: {message}")]
    Serialization { message: String },

    /// Invalid configuration or parameters.
    #[error("Invalid parameter: {message}")]
    InvalidParameter { message: String },
}

/// Convenience type alias for Results with TaskClientError
pub type ClientResult<T> = std::result::Result<T, TaskClientError>;

impl From<serde_json::Error> for TaskClientError {
    fn from(error: serde_json::Error) -> Self {
        TaskClientError::Serialization {
            message: error.to_string(),
        }
    }
}
