//! Authentication error types.

use thiserror::Error;

/// Authentication error type.
#[derive(Error, Debug)]
pub enum AuthError {
    /// The negotiation or verification channel could not be joined
    #[error("Channel join failed: {0}")]
    ChannelJoin(String),

    /// The server explicitly refused the verification payload
    #[error("Verification rejected: {0}")]
    VerificationRejected(String),

    /// Durable write failed; in-memory state has already advanced
    #[error("Persistence failed: {0}")]
    Persistence(#[from] auth_storage::StoreError),

    /// No event arrived within the configured deadline
    #[error("Handshake timed out")]
    HandshakeTimeout,

    /// A handshake is already in flight (strict single-flight policy)
    #[error("A handshake is already in progress")]
    HandshakeInProgress,

    /// Invalid transition in the handshake FSM
    #[error("Invalid handshake state transition: {0}")]
    InvalidStateTransition(String),

    /// Email precondition failed
    #[error("Email must be a non-empty, plausible address")]
    InvalidEmail,

    /// The channel delivered something outside the protocol
    #[error("Protocol violation: {0}")]
    ProtocolViolation(String),

    /// The event stream ended before an outcome arrived
    #[error("Channel closed before an outcome arrived")]
    ChannelClosed,
}

impl AuthError {
    /// Returns true if re-invoking the failed operation can succeed.
    ///
    /// Join failures, timeouts and dropped channels are transport
    /// hiccups; each retry opens a brand-new channel, so nothing is
    /// poisoned. A rejected verification is terminal for that link:
    /// the user must restart from email submission.
    pub fn is_recoverable(&self) -> bool {
        matches!(
            self,
            AuthError::ChannelJoin(_)
                | AuthError::HandshakeTimeout
                | AuthError::HandshakeInProgress
                | AuthError::ChannelClosed
                | AuthError::Persistence(_)
        )
    }
}

/// Result type alias using AuthError.
pub type AuthResult<T> = Result<T, AuthError>;
