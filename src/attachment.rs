//! Binary attachments.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::error::MailError;

/// Attachment payload: bytes held in memory, or a filesystem path that is
/// read in full when the message is built.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum AttachmentContent {
    Bytes(Vec<u8>),
    Path(PathBuf),
}

/// A named binary part of a message.
///
/// # Examples
///
/// ```
/// use courier::Attachment;
///
/// // From bytes, content type guessed from the filename
/// let report = Attachment::from_bytes("report.pdf", b"%PDF-1.4".to_vec());
/// assert_eq!(report.content_type, "application/pdf");
///
/// // From a path, read when the message is built
/// let log = Attachment::from_path("/var/log/app.log").content_type("text/plain");
/// ```
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Attachment {
    /// Filename shown to the recipient.
    pub filename: String,
    /// Payload, embedded or deferred to build time.
    pub content: AttachmentContent,
    /// Declared MIME type ("type/subtype").
    pub content_type: String,
}

impl Attachment {
    /// Create an attachment from raw bytes. The content type is guessed
    /// from the filename extension, defaulting to `application/octet-stream`.
    pub fn from_bytes(filename: impl Into<String>, data: Vec<u8>) -> Self {
        let filename = filename.into();
        let content_type = mime_guess::from_path(&filename)
            .first_or_octet_stream()
            .to_string();
        Self {
            filename,
            content: AttachmentContent::Bytes(data),
            content_type,
        }
    }

    /// Create an attachment whose content is read from `path` at build
    /// time. An unreadable path fails message construction, before any
    /// network activity.
    pub fn from_path(path: impl AsRef<Path>) -> Self {
        let path = path.as_ref();
        let filename = path
            .file_name()
            .and_then(|n| n.to_str())
            .unwrap_or("attachment")
            .to_string();
        let content_type = mime_guess::from_path(path)
            .first_or_octet_stream()
            .to_string();
        Self {
            filename,
            content: AttachmentContent::Path(path.to_path_buf()),
            content_type,
        }
    }

    /// Override the declared MIME type.
    pub fn content_type(mut self, content_type: impl Into<String>) -> Self {
        self.content_type = content_type.into();
        self
    }

    /// Load the payload into memory. Bytes are returned as-is; paths are
    /// read in full.
    pub(crate) fn resolve(&self) -> Result<Vec<u8>, MailError> {
        match &self.content {
            AttachmentContent::Bytes(data) => Ok(data.clone()),
            AttachmentContent::Path(path) => std::fs::read(path)
                .map_err(|e| MailError::AttachmentRead(format!("{}: {}", path.display(), e))),
        }
    }

    /// The declared type in "type/subtype" form. A bare type without a `/`
    /// gets an `octet-stream` subtype.
    pub(crate) fn mime(&self) -> String {
        if self.content_type.contains('/') {
            self.content_type.clone()
        } else {
            format!("{}/octet-stream", self.content_type)
        }
    }
}
