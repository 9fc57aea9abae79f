//! SMTP configuration.
//!
//! A [`SmtpConfig`] is immutable once constructed and covers everything one
//! delivery needs: endpoint, credentials, sender, timeout, retry budget and
//! transport mode. It can be built explicitly or read from the environment.
//!
//! | Variable | Effect |
//! |----------|--------|
//! | `SMTP_HOST` | server hostname (required) |
//! | `SMTP_PORT` | server port (default 465; 587 implies STARTTLS) |
//! | `SMTP_USER` / `SMTP_PASS` | optional credentials |
//! | `FROM_EMAIL` / `ADMIN_EMAIL` | sender address (fallback order) |
//! | `SMTP_TIMEOUT` | connection timeout, seconds (default 10) |
//! | `SMTP_RETRIES` | retry budget for transient failures (default 1) |
//! | `SMTP_STARTTLS` | force the STARTTLS transport regardless of port |
//! | `MAIL_DRY_RUN` | log instead of sending |

use serde::{Deserialize, Serialize};
use std::env;
use std::time::Duration;

use crate::error::MailError;

/// TLS strategy for the SMTP session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TransportMode {
    /// Encrypted from the first byte (historically port 465).
    Implicit,
    /// Plaintext handshake upgraded mid-session (historically port 587).
    StartTls,
}

/// Default SMTP submission-over-TLS port.
pub const DEFAULT_PORT: u16 = 465;
/// Standard mail-submission port; implies STARTTLS unless overridden.
pub const SUBMISSION_PORT: u16 = 587;

const DEFAULT_TIMEOUT: Duration = Duration::from_secs(10);
const DEFAULT_BACKOFF: Duration = Duration::from_millis(1500);
const DEFAULT_RETRIES: u32 = 1;

/// Immutable settings for outbound delivery.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SmtpConfig {
    /// SMTP server hostname.
    pub host: String,
    /// SMTP server port.
    pub port: u16,
    /// Username; authentication only happens when both user and password
    /// are non-empty.
    pub user: String,
    /// Password.
    pub password: String,
    /// Sender address. Must be non-empty by the time a message is built.
    pub from_email: String,
    /// Per-connection network timeout.
    pub timeout: Duration,
    /// How many transient failures to retry before giving up.
    pub retries: u32,
    /// Initial backoff delay; doubles after every transient retry.
    pub backoff: Duration,
    /// When set, log the would-be send and skip all network activity.
    pub dry_run: bool,
    /// Force the STARTTLS transport regardless of port.
    pub starttls: bool,
}

impl SmtpConfig {
    /// Create a config for `host` with library defaults: port 465, no
    /// credentials, 10 s timeout, one retry, 1.5 s initial backoff.
    pub fn new(host: impl Into<String>) -> Self {
        Self {
            host: host.into(),
            port: DEFAULT_PORT,
            user: String::new(),
            password: String::new(),
            from_email: String::new(),
            timeout: DEFAULT_TIMEOUT,
            retries: DEFAULT_RETRIES,
            backoff: DEFAULT_BACKOFF,
            dry_run: false,
            starttls: false,
        }
    }

    /// Read the configuration from the environment.
    ///
    /// `SMTP_HOST` is required; everything else falls back to the defaults
    /// listed in the module docs. Malformed numeric values fall back rather
    /// than erroring, so a stray `SMTP_PORT=abc` degrades to 465.
    pub fn from_env() -> Result<Self, MailError> {
        let host = env::var("SMTP_HOST")
            .map_err(|_| MailError::Configuration("SMTP_HOST not set".into()))?;

        let mut config = Self::new(host);
        if let Some(port) = env::var("SMTP_PORT").ok().and_then(|p| p.parse().ok()) {
            config.port = port;
        }
        config.user = env::var("SMTP_USER").unwrap_or_default();
        config.password = env::var("SMTP_PASS").unwrap_or_default();
        config.from_email = env::var("FROM_EMAIL")
            .or_else(|_| env::var("ADMIN_EMAIL"))
            .unwrap_or_default();
        if let Some(secs) = env::var("SMTP_TIMEOUT")
            .ok()
            .and_then(|t| t.parse::<f64>().ok())
            .filter(|s| s.is_finite() && *s > 0.0)
        {
            config.timeout = Duration::from_secs_f64(secs);
        }
        if let Some(retries) = env::var("SMTP_RETRIES").ok().and_then(|r| r.parse().ok()) {
            config.retries = retries;
        }
        config.dry_run = env::var("MAIL_DRY_RUN").map(|v| flag(&v)).unwrap_or(false);
        config.starttls = env::var("SMTP_STARTTLS").map(|v| flag(&v)).unwrap_or(false);
        Ok(config)
    }

    /// Set port.
    pub fn port(mut self, port: u16) -> Self {
        self.port = port;
        self
    }

    /// Set authentication credentials.
    pub fn credentials(mut self, user: impl Into<String>, password: impl Into<String>) -> Self {
        self.user = user.into();
        self.password = password.into();
        self
    }

    /// Set the sender address.
    pub fn from_email(mut self, from: impl Into<String>) -> Self {
        self.from_email = from.into();
        self
    }

    /// Set the connection timeout.
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Set the retry budget for transient failures.
    pub fn retries(mut self, retries: u32) -> Self {
        self.retries = retries;
        self
    }

    /// Set the initial backoff delay.
    pub fn backoff(mut self, backoff: Duration) -> Self {
        self.backoff = backoff;
        self
    }

    /// Enable or disable dry-run mode.
    pub fn dry_run(mut self, dry_run: bool) -> Self {
        self.dry_run = dry_run;
        self
    }

    /// Force the STARTTLS transport.
    pub fn starttls(mut self, starttls: bool) -> Self {
        self.starttls = starttls;
        self
    }

    /// The transport variant this config selects: STARTTLS when requested
    /// explicitly or implied by the submission port, implicit TLS otherwise.
    pub fn mode(&self) -> TransportMode {
        if self.starttls || self.port == SUBMISSION_PORT {
            TransportMode::StartTls
        } else {
            TransportMode::Implicit
        }
    }

    /// Whether authentication should be attempted. Unauthenticated
    /// submission is legitimate for relays trusting the network position.
    pub fn has_credentials(&self) -> bool {
        !self.user.is_empty() && !self.password.is_empty()
    }
}

fn flag(value: &str) -> bool {
    matches!(
        value.trim().to_ascii_lowercase().as_str(),
        "1" | "true" | "yes"
    )
}
