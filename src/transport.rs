//! SMTP transport selection and submission.
//!
//! [`Transport`] is the seam between the delivery engine and the network:
//! the engine hands it a rendered message plus an envelope, and it reports
//! the outcome as a [`MailError`] already classified as transient or fatal.
//! Tests inject stubs here; production uses [`SmtpChannel`] backed by
//! lettre.

use async_trait::async_trait;
use lettre::{
    address::Envelope, transport::smtp::authentication::Credentials, AsyncSmtpTransport,
    AsyncTransport, Tokio1Executor,
};

use crate::config::{SmtpConfig, TransportMode};
use crate::error::MailError;

/// One SMTP submission channel.
///
/// A submission carries the message to every envelope recipient in a single
/// transaction; there is no partial-recipient retry.
#[async_trait]
pub trait Transport: Send + Sync {
    async fn submit(&self, envelope: &Envelope, raw: &[u8]) -> Result<(), MailError>;
}

/// Transport backed by lettre's SMTP client.
///
/// Each submission opens a fresh connection, runs the handshake (with a
/// STARTTLS upgrade when the config selects it), authenticates when
/// credentials are present, submits, and quits. The connection is closed on
/// every exit path; nothing is pooled across attempts.
pub struct SmtpChannel {
    inner: AsyncSmtpTransport<Tokio1Executor>,
}

impl SmtpChannel {
    /// Configure the channel. No network activity happens here; the
    /// connection is opened per submission.
    pub fn open(config: &SmtpConfig) -> Result<Self, MailError> {
        let builder = match config.mode() {
            TransportMode::StartTls => {
                AsyncSmtpTransport::<Tokio1Executor>::starttls_relay(&config.host)?
            }
            TransportMode::Implicit => AsyncSmtpTransport::<Tokio1Executor>::relay(&config.host)?,
        };
        let mut builder = builder.port(config.port).timeout(Some(config.timeout));
        if config.has_credentials() {
            builder = builder.credentials(Credentials::new(
                config.user.clone(),
                config.password.clone(),
            ));
        }
        Ok(Self {
            inner: builder.build(),
        })
    }
}

#[async_trait]
impl Transport for SmtpChannel {
    async fn submit(&self, envelope: &Envelope, raw: &[u8]) -> Result<(), MailError> {
        self.inner
            .send_raw(envelope, raw)
            .await
            .map(|_| ())
            .map_err(MailError::from)
    }
}
