use std::path::Path;

use lettre::{
    Message,
    message::{Attachment, Mailbox, MultiPart, header::ContentType},
};

use crate::domain::RecipientRecord;

const FALLBACK_CONTENT_TYPE: &str = "application/octet-stream";

/// A file shared by every message of a run, read from disk once.
#[derive(Debug, Clone)]
pub struct MessageAttachment {
    filename: String,
    content_type: ContentType,
    content: Vec<u8>,
}

impl MessageAttachment {
    pub fn new(filename: String, content_type: ContentType, content: Vec<u8>) -> Self {
        Self {
            filename,
            content_type,
            content,
        }
    }

    /// Returns `None` (and warns) when the file cannot be read, so the run
    /// goes ahead without an attachment.
    #[tracing::instrument(name = "Resolving the campaign attachment")]
    pub fn resolve(path: &Path) -> Option<Self> {
        let content = match std::fs::read(path) {
            Ok(content) => content,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                tracing::warn!(
                    path = %path.display(),
                    "Attachment not found. Sending without it."
                );
                return None;
            }
            Err(e) => {
                tracing::warn!(
                    path = %path.display(),
                    error = %e,
                    "Could not read the attachment. Sending without it."
                );
                return None;
            }
        };
        let filename = path
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_else(|| "attachment".to_string());

        Some(Self::new(filename, guess_content_type(path), content))
    }

    pub fn filename(&self) -> &str {
        &self.filename
    }

    pub fn content_type(&self) -> &ContentType {
        &self.content_type
    }
}

/// Best-effort guess from the file extension.
pub fn guess_content_type(path: &Path) -> ContentType {
    mime_guess::from_path(path)
        .first_raw()
        .and_then(|mime| ContentType::parse(mime).ok())
        .unwrap_or_else(|| {
            ContentType::parse(FALLBACK_CONTENT_TYPE).expect("Fallback content type is valid")
        })
}

#[derive(thiserror::Error, Debug)]
pub enum ComposeError {
    #[error("{address} is not a deliverable address, {source}")]
    Address {
        address: String,
        #[source]
        source: lettre::address::AddressError,
    },
    #[error("couldn't build the message, {0}")]
    Build(#[from] lettre::error::Error),
}

/// Everything a message needs besides the recipient.
pub struct MessageTemplate<'a> {
    pub sender: &'a Mailbox,
    pub subject: &'a str,
    pub plain_text_fallback: &'a str,
    pub attachment: Option<&'a MessageAttachment>,
}

impl MessageTemplate<'_> {
    /// Builds `multipart/mixed`: a plain-text/HTML alternative, followed by
    /// the attachment when there is one.
    pub fn compose(
        &self,
        record: &RecipientRecord,
        html_body: String,
    ) -> Result<Message, ComposeError> {
        let address = record
            .email()
            .as_ref()
            .parse()
            .map_err(|e: lettre::address::AddressError| ComposeError::Address {
                address: record.email().to_string(),
                source: e,
            })?;
        let recipient = Mailbox::new(record.display_name().map(str::to_owned), address);

        let mut body = MultiPart::mixed().multipart(MultiPart::alternative_plain_html(
            self.plain_text_fallback.to_owned(),
            html_body,
        ));
        if let Some(attachment) = self.attachment {
            body = body.singlepart(
                Attachment::new(attachment.filename.clone())
                    .body(attachment.content.clone(), attachment.content_type.clone()),
            );
        }

        let message = Message::builder()
            .from(self.sender.clone())
            .to(recipient)
            .subject(self.subject)
            .multipart(body)?;
        Ok(message)
    }
}
