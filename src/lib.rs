//! # Courier
//!
//! Build and deliver outbound email over SMTP.
//!
//! Courier assembles a well-formed MIME message from raw inputs, validates
//! and normalizes every address (internationalized domains are
//! IDNA-encoded), and submits over an implicit-TLS or STARTTLS connection
//! with bounded retry-with-backoff on transient network faults. A dry-run
//! mode logs the would-be send without touching the network.
//!
//! ## Quick start
//!
//! Set environment variables:
//! ```bash
//! SMTP_HOST=smtp.example.com
//! SMTP_USER=mailer
//! SMTP_PASS=secret
//! FROM_EMAIL=noreply@example.com
//! ```
//!
//! Then send from anywhere:
//! ```rust,ignore
//! use courier::{send, Message};
//!
//! let ok = send(&Message::new()
//!     .to("user@example.com")
//!     .subject("Welcome!")
//!     .text_body("Hello"))
//!     .await;
//! ```
//!
//! ## Explicit configuration and diagnostics
//!
//! ```rust,ignore
//! use courier::{send_detailed_with, Message, SmtpConfig};
//!
//! let config = SmtpConfig::new("smtp.example.com")
//!     .port(587) // implies STARTTLS
//!     .credentials("mailer", "secret")
//!     .from_email("noreply@example.com");
//!
//! let (ok, error) = send_detailed_with(&message, &config).await;
//! if !ok {
//!     eprintln!("delivery failed: {}", error.unwrap_or_default());
//! }
//! ```
//!
//! ## Environment variables
//!
//! | Variable | Description |
//! |----------|-------------|
//! | `SMTP_HOST` | SMTP server host (required) |
//! | `SMTP_PORT` | SMTP server port (default: 465; 587 implies STARTTLS) |
//! | `SMTP_USER` / `SMTP_PASS` | Optional credentials |
//! | `FROM_EMAIL` | Sender address (`ADMIN_EMAIL` as fallback) |
//! | `SMTP_TIMEOUT` | Connection timeout in seconds (default: 10) |
//! | `SMTP_RETRIES` | Retry budget for transient failures (default: 1) |
//! | `SMTP_STARTTLS` | Force STARTTLS regardless of port |
//! | `MAIL_DRY_RUN` | Log instead of sending |

/// The version of the courier crate.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

mod address;
mod attachment;
mod config;
mod deliver;
mod error;
mod message;
mod transport;

use parking_lot::RwLock;
use std::sync::Arc;

// Re-exports
pub use address::{normalize, normalize_many, Recipients};
pub use attachment::{Attachment, AttachmentContent};
pub use config::{SmtpConfig, TransportMode, DEFAULT_PORT, SUBMISSION_PORT};
pub use deliver::{deliver, deliver_with};
pub use error::MailError;
pub use message::{Message, OutboundMessage};
pub use transport::{SmtpChannel, Transport};

// ============================================================================
// Process-wide default configuration
// ============================================================================

/// Default config - read from the environment once, swappable for testing.
static CONFIG: RwLock<Option<Arc<SmtpConfig>>> = RwLock::new(None);

/// Install a process-wide default configuration used by [`send`] and
/// [`send_detailed`]. Later calls replace the previous config.
pub fn configure(config: SmtpConfig) {
    let mut guard = CONFIG.write();
    *guard = Some(Arc::new(config));
}

/// Drop the process-wide configuration. The next [`send`] re-reads the
/// environment. Useful for tests.
pub fn reset() {
    let mut guard = CONFIG.write();
    *guard = None;
}

/// Get or initialize the process-wide configuration.
fn default_config() -> Result<Arc<SmtpConfig>, MailError> {
    // Fast path: already configured
    {
        let guard = CONFIG.read();
        if let Some(config) = &*guard {
            return Ok(Arc::clone(config));
        }
    }

    let config = Arc::new(SmtpConfig::from_env()?);
    let mut guard = CONFIG.write();

    // Double-check after acquiring the write lock
    if guard.is_none() {
        *guard = Some(Arc::clone(&config));
    }

    Ok(guard.as_ref().unwrap().clone())
}

// ============================================================================
// Public facade
// ============================================================================

/// Send a message using the process-wide configuration.
///
/// Returns `true` on success. Failures are logged and folded into `false`;
/// use [`send_detailed`] when the caller needs the reason.
pub async fn send(message: &Message) -> bool {
    send_detailed(message).await.0
}

/// Like [`send`], but also returns the failure text for callers that show
/// a reason to the user. Always returns; never panics or propagates.
pub async fn send_detailed(message: &Message) -> (bool, Option<String>) {
    match default_config() {
        Ok(config) => send_detailed_with(message, &config).await,
        Err(e) => {
            tracing::error!(error = %e, "mail configuration unavailable");
            (false, Some(e.to_string()))
        }
    }
}

/// Send a message with an explicit configuration.
pub async fn send_with(message: &Message, config: &SmtpConfig) -> bool {
    send_detailed_with(message, config).await.0
}

/// Like [`send_with`], but also returns the failure text.
pub async fn send_detailed_with(message: &Message, config: &SmtpConfig) -> (bool, Option<String>) {
    match deliver(message, config).await {
        Ok(()) => (true, None),
        Err(e) => {
            tracing::error!(error = %e, "send failed");
            (false, Some(e.to_string()))
        }
    }
}

/// Prelude module for convenient imports.
pub mod prelude {
    pub use crate::Attachment;
    pub use crate::MailError;
    pub use crate::Message;
    pub use crate::Recipients;
    pub use crate::SmtpConfig;
    pub use crate::Transport;
    pub use crate::{configure, deliver, deliver_with, send, send_detailed, send_with};
}
