//! Delivery engine: dry-run short-circuit and retry with exponential
//! backoff.
//!
//! Retry progress is an explicit state machine so every transition can be
//! tested without real network timing. Only connection-level faults are
//! retried; protocol rejections (bad auth, refused recipients) fail at
//! once. The backoff delay starts at the configured seed and doubles after
//! every transient failure, with no upper cap - callers wanting one should
//! set a small retry budget.

use std::time::Duration;

use async_trait::async_trait;

use crate::config::SmtpConfig;
use crate::error::MailError;
use crate::message::{Message, OutboundMessage};
use crate::transport::{SmtpChannel, Transport};

/// Deliver `message` over SMTP per `config`.
///
/// Construction errors (invalid address, empty recipients, missing sender,
/// unreadable attachment) surface before any connection is opened. In
/// dry-run mode the would-be send is logged and reported successful with no
/// network activity at all.
pub async fn deliver(message: &Message, config: &SmtpConfig) -> Result<(), MailError> {
    let outbound = message.build(&config.from_email)?;
    if config.dry_run {
        log_dry_run(&outbound);
        return Ok(());
    }
    let channel = SmtpChannel::open(config)?;
    drive(&channel, &outbound, config, &TokioSleeper).await
}

/// Same as [`deliver`], but submitting over a caller-provided transport.
pub async fn deliver_with<T: Transport>(
    message: &Message,
    transport: &T,
    config: &SmtpConfig,
) -> Result<(), MailError> {
    let outbound = message.build(&config.from_email)?;
    if config.dry_run {
        log_dry_run(&outbound);
        return Ok(());
    }
    drive(transport, &outbound, config, &TokioSleeper).await
}

fn log_dry_run(outbound: &OutboundMessage) {
    tracing::info!(
        to = ?outbound.envelope_recipients(),
        subject = %outbound.subject(),
        "dry run, delivery skipped"
    );
}

/// Pause between attempts. Abstracted so tests can record delays instead of
/// waiting for them.
#[async_trait]
pub(crate) trait Sleeper: Send + Sync {
    async fn pause(&self, delay: Duration);
}

pub(crate) struct TokioSleeper;

#[async_trait]
impl Sleeper for TokioSleeper {
    async fn pause(&self, delay: Duration) {
        tokio::time::sleep(delay).await;
    }
}

/// Retry progress for one delivery.
///
/// `Success` and `FatalFailure` are terminal. `TransientFailure` always
/// leads back to `Attempting` once the backoff pause has elapsed.
#[derive(Debug)]
enum DeliveryState {
    Attempting {
        attempt: u32,
        delay: Duration,
    },
    TransientFailure {
        attempt: u32,
        delay: Duration,
        error: MailError,
    },
    Success,
    FatalFailure(MailError),
}

impl DeliveryState {
    fn start(backoff: Duration) -> Self {
        Self::Attempting {
            attempt: 0,
            delay: backoff,
        }
    }

    /// Transition out of `Attempting` given a submission outcome. A
    /// transient error within budget schedules a retry; past the budget it
    /// becomes the final failure. Anything non-transient is fatal at once.
    fn after_attempt(
        attempt: u32,
        delay: Duration,
        outcome: Result<(), MailError>,
        budget: u32,
    ) -> Self {
        match outcome {
            Ok(()) => Self::Success,
            Err(error) if error.is_transient() => {
                let attempt = attempt + 1;
                if attempt > budget {
                    Self::FatalFailure(error)
                } else {
                    Self::TransientFailure {
                        attempt,
                        delay,
                        error,
                    }
                }
            }
            Err(error) => Self::FatalFailure(error),
        }
    }

    /// Transition out of `TransientFailure` after the pause: same attempt
    /// counter, doubled delay for the next pause.
    fn resume(attempt: u32, delay: Duration) -> Self {
        Self::Attempting {
            attempt,
            delay: delay * 2,
        }
    }
}

async fn drive<T: Transport + ?Sized>(
    transport: &T,
    outbound: &OutboundMessage,
    config: &SmtpConfig,
    sleeper: &dyn Sleeper,
) -> Result<(), MailError> {
    let envelope = outbound.envelope()?;
    let raw = outbound.to_mime()?.formatted();

    let mut state = DeliveryState::start(config.backoff);
    loop {
        state = match state {
            DeliveryState::Attempting { attempt, delay } => {
                let outcome = transport.submit(&envelope, &raw).await;
                DeliveryState::after_attempt(attempt, delay, outcome, config.retries)
            }
            DeliveryState::TransientFailure {
                attempt,
                delay,
                error,
            } => {
                tracing::warn!(
                    error = %error,
                    delay_secs = delay.as_secs_f64(),
                    attempt,
                    budget = config.retries,
                    "transient failure, retrying after backoff"
                );
                sleeper.pause(delay).await;
                DeliveryState::resume(attempt, delay)
            }
            DeliveryState::Success => {
                tracing::info!(
                    to = ?outbound.envelope_recipients(),
                    subject = %outbound.subject(),
                    "message delivered"
                );
                return Ok(());
            }
            // final error logging happens at the boolean facade
            DeliveryState::FatalFailure(error) => return Err(error),
        };
    }
}
