//! Delivery engine tests over stub transports.
//!
//! Timing-sensitive tests run under tokio's paused clock, so backoff
//! sleeps complete instantly while still exercising the real engine.

use std::sync::atomic::{AtomicU32, Ordering};

use async_trait::async_trait;
use courier::{
    configure, deliver, deliver_with, reset, send, send_detailed_with, MailError, Message,
    SmtpConfig, Transport, TransportMode,
};
use lettre::address::Envelope;

/// Stub transport: fails the first `failures` submissions with the given
/// error, then succeeds. Counts every call.
struct StubTransport {
    calls: AtomicU32,
    failures: u32,
    error: fn() -> MailError,
}

impl StubTransport {
    fn succeeding() -> Self {
        Self::failing(0, || unreachable!())
    }

    fn failing(failures: u32, error: fn() -> MailError) -> Self {
        Self {
            calls: AtomicU32::new(0),
            failures,
            error,
        }
    }

    fn calls(&self) -> u32 {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl Transport for StubTransport {
    async fn submit(&self, _envelope: &Envelope, _raw: &[u8]) -> Result<(), MailError> {
        let call = self.calls.fetch_add(1, Ordering::SeqCst);
        if call < self.failures {
            Err((self.error)())
        } else {
            Ok(())
        }
    }
}

fn disconnect() -> MailError {
    MailError::TransientTransport("connection closed before greeting".into())
}

fn auth_rejected() -> MailError {
    MailError::FatalTransport("535 5.7.8 authentication credentials invalid".into())
}

fn config() -> SmtpConfig {
    SmtpConfig::new("smtp.example.com").from_email("sender@example.com")
}

fn message() -> Message {
    Message::new()
        .to("user@example.com")
        .subject("hello")
        .text_body("world")
}

#[tokio::test(start_paused = true)]
async fn budget_of_two_makes_three_attempts_then_reports_last_error() {
    let transport = StubTransport::failing(u32::MAX, disconnect);

    let err = deliver_with(&message(), &transport, &config().retries(2))
        .await
        .unwrap_err();

    assert_eq!(transport.calls(), 3);
    assert!(err.is_transient());
    assert!(err.to_string().contains("connection closed before greeting"));
}

#[tokio::test(start_paused = true)]
async fn transient_failure_recovers_within_budget() {
    let transport = StubTransport::failing(2, disconnect);

    deliver_with(&message(), &transport, &config().retries(2))
        .await
        .unwrap();

    assert_eq!(transport.calls(), 3);
}

#[tokio::test]
async fn auth_rejection_fails_after_exactly_one_attempt() {
    let transport = StubTransport::failing(u32::MAX, auth_rejected);

    let err = deliver_with(&message(), &transport, &config().retries(5))
        .await
        .unwrap_err();

    assert_eq!(transport.calls(), 1);
    assert!(!err.is_transient());
    assert!(err.to_string().contains("535"));
}

#[tokio::test]
async fn dry_run_never_touches_the_transport() {
    let transport = StubTransport::failing(u32::MAX, disconnect);

    deliver_with(&message(), &transport, &config().dry_run(true))
        .await
        .unwrap();

    assert_eq!(transport.calls(), 0);
}

#[tokio::test]
async fn dry_run_still_validates_the_message() {
    let transport = StubTransport::succeeding();
    let bad = Message::new().to("not-an-address");

    let err = deliver_with(&bad, &transport, &config().dry_run(true))
        .await
        .unwrap_err();

    assert!(matches!(err, MailError::InvalidAddress(_)));
    assert_eq!(transport.calls(), 0);
}

#[tokio::test]
async fn construction_errors_abort_before_any_attempt() {
    let transport = StubTransport::succeeding();

    let err = deliver_with(&Message::new(), &transport, &config())
        .await
        .unwrap_err();

    assert!(matches!(err, MailError::EmptyRecipients));
    assert_eq!(transport.calls(), 0);
}

#[tokio::test]
async fn starttls_submission_with_cyrillic_recipient_succeeds_cleanly() {
    let transport = StubTransport::succeeding();
    let config = config().port(587);
    assert_eq!(config.mode(), TransportMode::StartTls);

    let message = Message::new()
        .to("a@тест.рф")
        .subject("Тест")
        .text_body("Привет");

    deliver_with(&message, &transport, &config).await.unwrap();
    assert_eq!(transport.calls(), 1);
}

#[tokio::test]
async fn detailed_facade_folds_failures_into_false_plus_reason() {
    // dry-run exercises the facade without a network
    let (ok, error) = send_detailed_with(&message(), &config().dry_run(true)).await;
    assert!(ok);
    assert_eq!(error, None);

    let (ok, error) = send_detailed_with(&Message::new(), &config().dry_run(true)).await;
    assert!(!ok);
    assert!(error.unwrap().contains("empty"));
}

#[tokio::test]
async fn facade_send_uses_the_configured_defaults() {
    configure(config().dry_run(true));

    assert!(send(&message()).await);

    reset();
}

#[tokio::test]
async fn deliver_reports_missing_sender_before_connecting() {
    // from_email left empty; host intentionally unreachable to prove no
    // connection is needed to fail
    let config = SmtpConfig::new("smtp.invalid").retries(0);
    let err = deliver(&message(), &config).await.unwrap_err();
    assert!(matches!(err, MailError::MissingSender));
}
