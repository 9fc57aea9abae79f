//! Error types for courier.

use thiserror::Error;

/// Errors that can occur while building or delivering a message.
#[derive(Debug, Clone, Error)]
pub enum MailError {
    /// Configuration error (missing env var, invalid value, etc.)
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// No sender address available from the message or the configuration.
    #[error("No sender address configured (set FROM_EMAIL or ADMIN_EMAIL)")]
    MissingSender,

    /// Invalid email address format.
    #[error("Invalid email address: {0}")]
    InvalidAddress(String),

    /// No deliverable recipient left after dropping blank entries.
    #[error("Recipient list is empty")]
    EmptyRecipients,

    /// Failed to read a path-based attachment.
    #[error("Failed to read attachment: {0}")]
    AttachmentRead(String),

    /// Connection-level transport fault. Retried with backoff.
    #[error("Transient transport failure: {0}")]
    TransientTransport(String),

    /// Protocol, authentication or unexpected transport fault. Never retried.
    #[error("Transport failure: {0}")]
    FatalTransport(String),
}

impl MailError {
    /// Whether the retry loop may re-attempt delivery after this error.
    pub fn is_transient(&self) -> bool {
        matches!(self, Self::TransientTransport(_))
    }
}

impl From<lettre::error::Error> for MailError {
    fn from(err: lettre::error::Error) -> Self {
        Self::FatalTransport(err.to_string())
    }
}

impl From<lettre::address::AddressError> for MailError {
    fn from(err: lettre::address::AddressError) -> Self {
        Self::InvalidAddress(err.to_string())
    }
}

impl From<lettre::transport::smtp::Error> for MailError {
    fn from(err: lettre::transport::smtp::Error) -> Self {
        // 4xx/5xx replies, malformed responses, client-side and TLS faults
        // are protocol-semantic: a retry would replay the same rejection.
        // What remains is connection-layer (connect, disconnect, I/O) and
        // timeouts, which the retry loop is allowed to resolve.
        let protocol = err.is_response()
            || err.is_transient()
            || err.is_permanent()
            || err.is_client()
            || err.is_tls();
        if protocol && !err.is_timeout() {
            Self::FatalTransport(err.to_string())
        } else {
            Self::TransientTransport(err.to_string())
        }
    }
}
