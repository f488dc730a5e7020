//! Error types for the step-up authentication flow

use concierge_a2a_client::TaskClientError;
use thiserror::Error;

/// Failure modes of the step-up flow. Every path through the coordinator and
/// reconciler resolves to one of these; nothing panics across the boundary.
#[derive(Debug, Error)]
pub enum StepUpError {
    /// No pending authorization session exists, e.g. the user navigated to
    /// the callback URL directly, or the session was already consumed or
    /// expired.
    #[error("no pending authorization session")]
    NoPendingAuth,

    /// The returned `state` does not match the stored anti-forgery token.
    /// Treated as a potential attack: aborted and surfaced generically.
    #[error("authorization state mismatch")]
    StateMismatch,

    /// The external provider declined, or the user canceled at the
    /// authorization server. Not retried automatically.
    #[error("authorization denied: {error}")]
    AuthorizationDenied {
        error: String,
        description: Option<String>,
    },

    /// The token endpoint rejected the exchange (reused code, redirect-URI
    /// mismatch, expired code). Remediation is restarting from `begin` with a
    /// fresh verifier, never reusing the exhausted session.
    #[error("token exchange failed: {error}")]
    TokenExchangeFailed {
        error: String,
        description: Option<String>,
    },

    /// Required configuration is absent.
    #[error("missing configuration: {field}")]
    MissingConfiguration { field: String },

    /// Transport failure while talking to the token endpoint.
    #[error("token endpoint unreachable: {message}")]
    Transport { message: String },

    /// A fatal error from the task client while resuming the task.
    #[error(transparent)]
    Client(#[from] TaskClientError),
}

/// Convenience type alias for Results with StepUpError
pub type StepUpResult<T> = std::result::Result<T, StepUpError>;
