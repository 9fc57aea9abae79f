//! Message construction and MIME rendering.
//!
//! A [`Message`] collects raw inputs with a builder. [`Message::build`]
//! normalizes every address, resolves path-based attachments and returns an
//! immutable [`OutboundMessage`] ready for submission; all construction
//! failures surface there, before any network activity.

use lettre::message::{
    header::ContentType, Attachment as MimeAttachment, Mailbox, MultiPart, SinglePart,
};
use serde::{Deserialize, Serialize};

use crate::address::{self, Recipients};
use crate::attachment::Attachment;
use crate::error::MailError;

/// Raw message inputs.
///
/// ```
/// use courier::Message;
///
/// let message = Message::new()
///     .to(vec!["user@example.com", "boss@example.com"])
///     .cc("audit@example.com")
///     .subject("Weekly report")
///     .text_body("All green.")
///     .html_body("<p>All <b>green</b>.</p>");
/// ```
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Message {
    /// Sender override; when unset, the configured sender is used.
    pub from: Option<String>,
    /// Primary recipients.
    pub to: Vec<String>,
    /// Carbon-copy recipients.
    pub cc: Vec<String>,
    /// Blind-carbon-copy recipients. Delivered to, never rendered into a
    /// header.
    pub bcc: Vec<String>,
    /// Reply-To address.
    pub reply_to: Option<String>,
    /// Subject line (UTF-8; encoded for transport when rendered).
    pub subject: String,
    /// Plain-text body.
    pub text: Option<String>,
    /// HTML alternative body.
    pub html: Option<String>,
    /// Binary attachments.
    pub attachments: Vec<Attachment>,
}

impl Message {
    /// Create an empty message.
    pub fn new() -> Self {
        Self::default()
    }

    /// Override the sender for this message only.
    pub fn from(mut self, addr: impl Into<String>) -> Self {
        self.from = Some(addr.into());
        self
    }

    /// Add recipients: a single address or a collection.
    pub fn to(mut self, addrs: impl Recipients) -> Self {
        self.to.extend(addrs.into_list());
        self
    }

    /// Add CC recipients.
    pub fn cc(mut self, addrs: impl Recipients) -> Self {
        self.cc.extend(addrs.into_list());
        self
    }

    /// Add BCC recipients.
    pub fn bcc(mut self, addrs: impl Recipients) -> Self {
        self.bcc.extend(addrs.into_list());
        self
    }

    /// Set the Reply-To address.
    pub fn reply_to(mut self, addr: impl Into<String>) -> Self {
        self.reply_to = Some(addr.into());
        self
    }

    /// Set the subject line.
    pub fn subject(mut self, subject: impl Into<String>) -> Self {
        self.subject = subject.into();
        self
    }

    /// Set the plain-text body.
    pub fn text_body(mut self, body: impl Into<String>) -> Self {
        self.text = Some(body.into());
        self
    }

    /// Set the HTML alternative body.
    pub fn html_body(mut self, body: impl Into<String>) -> Self {
        self.html = Some(body.into());
        self
    }

    /// Add an attachment.
    pub fn attachment(mut self, attachment: Attachment) -> Self {
        self.attachments.push(attachment);
        self
    }

    /// Normalize addresses and resolve attachments into a transport-ready
    /// message.
    ///
    /// `from` is the configured sender; a per-message [`Message::from`]
    /// override wins. Fails with [`MailError::MissingSender`] when both are
    /// empty, [`MailError::EmptyRecipients`] when no To recipient survives
    /// blank filtering, [`MailError::InvalidAddress`] for any malformed
    /// address, and [`MailError::AttachmentRead`] for an unreadable
    /// path-based attachment.
    pub fn build(&self, from: &str) -> Result<OutboundMessage, MailError> {
        let sender = self.from.as_deref().unwrap_or(from);
        if sender.trim().is_empty() {
            return Err(MailError::MissingSender);
        }
        let from = address::normalize(sender)?;

        let to = address::normalize_many(&self.to)?;
        if to.is_empty() {
            return Err(MailError::EmptyRecipients);
        }
        let cc = address::normalize_many(&self.cc)?;
        let bcc = address::normalize_many(&self.bcc)?;
        let reply_to = match self.reply_to.as_deref() {
            Some(addr) if !addr.trim().is_empty() => Some(address::normalize(addr)?),
            _ => None,
        };

        let mut attachments = Vec::with_capacity(self.attachments.len());
        for attachment in &self.attachments {
            attachments.push(ResolvedAttachment {
                filename: attachment.filename.clone(),
                content_type: attachment.mime(),
                data: attachment.resolve()?,
            });
        }

        Ok(OutboundMessage {
            from,
            to,
            cc,
            bcc,
            reply_to,
            subject: self.subject.clone(),
            text: self.text.clone().unwrap_or_default(),
            html: self.html.clone(),
            attachments,
        })
    }
}

/// An attachment with its payload loaded and its MIME type normalized.
#[derive(Debug, Clone)]
struct ResolvedAttachment {
    filename: String,
    content_type: String,
    data: Vec<u8>,
}

/// A fully normalized message. Immutable; discarded after one send.
#[derive(Debug, Clone)]
pub struct OutboundMessage {
    from: String,
    to: Vec<String>,
    cc: Vec<String>,
    bcc: Vec<String>,
    reply_to: Option<String>,
    subject: String,
    text: String,
    html: Option<String>,
    attachments: Vec<ResolvedAttachment>,
}

impl OutboundMessage {
    /// The normalized sender address.
    pub fn sender(&self) -> &str {
        &self.from
    }

    /// The subject line.
    pub fn subject(&self) -> &str {
        &self.subject
    }

    /// The plain-text body (empty string when none was supplied).
    pub fn text(&self) -> &str {
        &self.text
    }

    /// The HTML alternative body, if any.
    pub fn html(&self) -> Option<&str> {
        self.html.as_deref()
    }

    /// Everyone the message is delivered to: To, Cc and Bcc in order,
    /// duplicates preserved. This is the SMTP envelope recipient list; Bcc
    /// entries appear here and nowhere else.
    pub fn envelope_recipients(&self) -> Vec<&str> {
        self.to
            .iter()
            .chain(&self.cc)
            .chain(&self.bcc)
            .map(String::as_str)
            .collect()
    }

    /// The SMTP envelope: sender plus every delivery recipient.
    pub fn envelope(&self) -> Result<lettre::address::Envelope, MailError> {
        let from = self.from.parse::<lettre::Address>()?;
        let mut recipients = Vec::with_capacity(self.to.len() + self.cc.len() + self.bcc.len());
        for addr in self.envelope_recipients() {
            recipients.push(addr.parse::<lettre::Address>()?);
        }
        lettre::address::Envelope::new(Some(from), recipients).map_err(MailError::from)
    }

    /// Render the MIME document.
    ///
    /// Non-ASCII subjects become RFC 2047 encoded words. With an HTML body
    /// the text and HTML parts form a `multipart/alternative`; attachments
    /// wrap the body in `multipart/mixed`. Bcc recipients are never written
    /// into a header.
    pub fn to_mime(&self) -> Result<lettre::Message, MailError> {
        let mut builder = lettre::Message::builder()
            .from(mailbox(&self.from)?)
            .subject(&self.subject);
        for to in &self.to {
            builder = builder.to(mailbox(to)?);
        }
        for cc in &self.cc {
            builder = builder.cc(mailbox(cc)?);
        }
        if let Some(reply_to) = &self.reply_to {
            builder = builder.reply_to(mailbox(reply_to)?);
        }

        let message = if self.attachments.is_empty() {
            match &self.html {
                Some(html) => builder.multipart(MultiPart::alternative_plain_html(
                    self.text.clone(),
                    html.clone(),
                ))?,
                None => builder
                    .header(ContentType::TEXT_PLAIN)
                    .body(self.text.clone())?,
            }
        } else {
            let mut mixed = match &self.html {
                Some(html) => MultiPart::mixed().multipart(MultiPart::alternative_plain_html(
                    self.text.clone(),
                    html.clone(),
                )),
                None => MultiPart::mixed().singlepart(
                    SinglePart::builder()
                        .header(ContentType::TEXT_PLAIN)
                        .body(self.text.clone()),
                ),
            };
            for attachment in &self.attachments {
                let content_type = attachment
                    .content_type
                    .parse::<ContentType>()
                    .unwrap_or(ContentType::TEXT_PLAIN);
                mixed = mixed.singlepart(
                    MimeAttachment::new(attachment.filename.clone())
                        .body(attachment.data.clone(), content_type),
                );
            }
            builder.multipart(mixed)?
        };

        Ok(message)
    }
}

fn mailbox(addr: &str) -> Result<Mailbox, MailError> {
    Ok(Mailbox::new(None, addr.parse::<lettre::Address>()?))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::attachment::Attachment;

    #[test]
    fn builder_collects_fields() {
        let message = Message::new()
            .to("one@example.com")
            .to(vec!["two@example.com", "three@example.com"])
            .cc("cc@example.com")
            .bcc("hidden@example.com")
            .reply_to("replies@example.com")
            .subject("Hello")
            .text_body("Hi");

        assert_eq!(message.to.len(), 3);
        assert_eq!(message.cc.len(), 1);
        assert_eq!(message.bcc.len(), 1);
        assert_eq!(message.reply_to.as_deref(), Some("replies@example.com"));
        assert_eq!(message.subject, "Hello");
    }

    #[test]
    fn build_fails_without_recipients() {
        let err = Message::new().subject("x").build("sender@example.com");
        assert!(matches!(err.unwrap_err(), MailError::EmptyRecipients));
    }

    #[test]
    fn build_fails_when_all_recipients_are_blank() {
        let err = Message::new()
            .to(vec!["", "   "])
            .build("sender@example.com");
        assert!(matches!(err.unwrap_err(), MailError::EmptyRecipients));
    }

    #[test]
    fn build_fails_without_sender() {
        let err = Message::new().to("user@example.com").build("");
        assert!(matches!(err.unwrap_err(), MailError::MissingSender));
    }

    #[test]
    fn message_sender_override_wins() {
        let built = Message::new()
            .from("other@example.com")
            .to("user@example.com")
            .build("config@example.com")
            .unwrap();
        assert_eq!(built.sender(), "other@example.com");
    }

    #[test]
    fn build_normalizes_every_address_list() {
        let built = Message::new()
            .to("user@тест.рф")
            .cc("cc@тест.рф")
            .bcc("bcc@тест.рф")
            .reply_to("reply@тест.рф")
            .build("sender@example.com")
            .unwrap();

        assert_eq!(
            built.envelope_recipients(),
            vec![
                "user@xn--e1aybc.xn--p1ai",
                "cc@xn--e1aybc.xn--p1ai",
                "bcc@xn--e1aybc.xn--p1ai",
            ]
        );
    }

    #[test]
    fn build_rejects_invalid_cc() {
        let err = Message::new()
            .to("user@example.com")
            .cc("not-an-address")
            .build("sender@example.com");
        assert!(matches!(err.unwrap_err(), MailError::InvalidAddress(_)));
    }

    #[test]
    fn missing_text_body_becomes_empty_string() {
        let built = Message::new()
            .to("user@example.com")
            .build("sender@example.com")
            .unwrap();
        assert_eq!(built.text(), "");
    }

    #[test]
    fn envelope_recipients_keep_order_and_duplicates() {
        let built = Message::new()
            .to(vec!["a@example.com", "b@example.com"])
            .cc("a@example.com")
            .bcc("c@example.com")
            .build("sender@example.com")
            .unwrap();
        assert_eq!(
            built.envelope_recipients(),
            vec!["a@example.com", "b@example.com", "a@example.com", "c@example.com"]
        );
    }

    #[test]
    fn build_fails_on_unreadable_attachment() {
        let err = Message::new()
            .to("user@example.com")
            .attachment(Attachment::from_path("/no/such/file.pdf"))
            .build("sender@example.com");
        assert!(matches!(err.unwrap_err(), MailError::AttachmentRead(_)));
    }

    #[test]
    fn rendered_headers_never_mention_bcc() {
        let built = Message::new()
            .to("visible@example.com")
            .bcc("hidden@example.com")
            .subject("secret")
            .text_body("body")
            .build("sender@example.com")
            .unwrap();

        let rendered = String::from_utf8(built.to_mime().unwrap().formatted()).unwrap();
        let headers = rendered.split("\r\n\r\n").next().unwrap();
        assert!(!headers.contains("Bcc"));
        assert!(!rendered.contains("hidden@example.com"));
        // but the envelope still delivers to it
        assert!(built.envelope_recipients().contains(&"hidden@example.com"));
    }

    #[test]
    fn envelope_covers_all_recipient_classes() {
        let built = Message::new()
            .to("a@example.com")
            .cc("b@example.com")
            .bcc("c@example.com")
            .build("sender@example.com")
            .unwrap();

        let envelope = built.envelope().unwrap();
        let to: Vec<String> = envelope.to().iter().map(|a| a.to_string()).collect();
        assert_eq!(to, vec!["a@example.com", "b@example.com", "c@example.com"]);
    }
}
