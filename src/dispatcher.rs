use std::{num::NonZeroUsize, path::Path, slice::Chunks, time::Duration};

use lettre::message::Mailbox;
use uuid::Uuid;

use crate::{
    domain::{RecipientEmail, RecipientRecord, UniqueId},
    message::{ComposeError, MessageAttachment, MessageTemplate},
    renderer::{RenderBody, RenderError},
    transport::{SendError, Session, SessionError, Transport},
};

pub const DEFAULT_BATCH_SIZE: NonZeroUsize = NonZeroUsize::new(20).unwrap();
pub const DEFAULT_INTER_BATCH_DELAY: Duration = Duration::from_secs(10);
pub const DEFAULT_PLAIN_TEXT_FALLBACK: &str = "Hello,\n\n\
    This email was sent in HTML format. \
    Please view it in an email client that supports HTML.";

#[derive(Debug, Clone)]
pub struct DispatchOptions {
    /// Ceiling on successful sends for the run. Failed attempts do not count.
    pub max_total: Option<usize>,
    pub batch_size: NonZeroUsize,
    /// Pause between two batches, to stay under the provider's rate limits.
    pub inter_batch_delay: Duration,
}

impl Default for DispatchOptions {
    fn default() -> Self {
        Self {
            max_total: None,
            batch_size: DEFAULT_BATCH_SIZE,
            inter_batch_delay: DEFAULT_INTER_BATCH_DELAY,
        }
    }
}

/// Why one recipient did not get their message.
#[derive(thiserror::Error, Debug)]
pub enum DeliveryError {
    #[error(transparent)]
    Render(#[from] RenderError),
    #[error(transparent)]
    Compose(#[from] ComposeError),
    #[error(transparent)]
    Send(#[from] SendError),
}

#[derive(Debug)]
pub struct RecipientFailure {
    pub unique_id: UniqueId,
    pub email: RecipientEmail,
    pub error: DeliveryError,
}

#[derive(Debug, Default)]
pub struct DispatchReport {
    pub sent: usize,
    pub failed: usize,
    /// Batches that were started, including one cut short by the send ceiling.
    pub batches: usize,
    /// `true` when the ceiling stopped the run with recipients left over.
    pub limit_reached: bool,
    pub failures: Vec<RecipientFailure>,
}

impl DispatchReport {
    pub fn counts(&self) -> (usize, usize) {
        (self.sent, self.failed)
    }
}

#[derive(thiserror::Error, Debug)]
pub enum DispatchError {
    #[error("couldn't establish a mail session, nothing was sent: {0}")]
    Session(#[from] SessionError),
}

/// Consecutive batches of `batch_size`; only the last one may be shorter.
pub fn partition<T>(items: &[T], batch_size: NonZeroUsize) -> Chunks<'_, T> {
    items.chunks(batch_size.get())
}

pub fn batch_count(len: usize, batch_size: NonZeroUsize) -> usize {
    len.div_ceil(batch_size.get())
}

/// Sends one message per record through a single session, batch by batch.
///
/// A failure for one recipient is recorded and the run moves on; only a
/// failure to open the session ends the run early.
pub struct Dispatcher<T> {
    transport: T,
    sender: Mailbox,
    plain_text_fallback: String,
    options: DispatchOptions,
}

impl<T: Transport> Dispatcher<T> {
    pub fn new(transport: T, sender: Mailbox, options: DispatchOptions) -> Self {
        Self {
            transport,
            sender,
            plain_text_fallback: DEFAULT_PLAIN_TEXT_FALLBACK.to_string(),
            options,
        }
    }

    pub fn with_plain_text_fallback(mut self, plain_text_fallback: String) -> Self {
        self.plain_text_fallback = plain_text_fallback;
        self
    }

    #[tracing::instrument(
        name = "Dispatching a campaign",
        skip_all,
        fields(
            run_id = %Uuid::new_v4(),
            recipients = records.len(),
            batch_size = self.options.batch_size.get(),
            max_total = ?self.options.max_total,
        )
    )]
    pub async fn dispatch<R: RenderBody>(
        &self,
        records: &[RecipientRecord],
        subject: &str,
        renderer: &R,
        attachment: Option<&Path>,
    ) -> Result<DispatchReport, DispatchError> {
        if records.is_empty() {
            tracing::info!("No recipients to send to");
            return Ok(DispatchReport::default());
        }

        let attachment = attachment.and_then(MessageAttachment::resolve);
        let template = MessageTemplate {
            sender: &self.sender,
            subject,
            plain_text_fallback: &self.plain_text_fallback,
            attachment: attachment.as_ref(),
        };

        let mut session = self.transport.connect().await.map_err(|e| {
            tracing::error!(error = %e, "Couldn't open a mail session");
            DispatchError::Session(e)
        })?;

        let report = self
            .send_batches(&mut session, records, &template, renderer)
            .await;

        if let Err(e) = session.close().await {
            tracing::error!(error = %e, "Error while closing the mail session");
        }

        tracing::info!(
            sent = report.sent,
            failed = report.failed,
            limit_reached = report.limit_reached,
            "Dispatch finished"
        );
        Ok(report)
    }

    async fn send_batches<S: Session, R: RenderBody>(
        &self,
        session: &mut S,
        records: &[RecipientRecord],
        template: &MessageTemplate<'_>,
        renderer: &R,
    ) -> DispatchReport {
        let mut report = DispatchReport::default();
        let batch_size = self.options.batch_size;
        let total_batches = batch_count(records.len(), batch_size);
        let limit_hit =
            |report: &DispatchReport| self.options.max_total.is_some_and(|max| report.sent >= max);

        for (index, batch) in partition(records, batch_size).enumerate() {
            report.batches += 1;
            tracing::info!(
                batch = index + 1,
                total_batches,
                size = batch.len(),
                "Sending batch"
            );

            for record in batch {
                if limit_hit(&report) {
                    tracing::info!(sent = report.sent, "Send limit reached. Stopping.");
                    report.limit_reached = true;
                    return report;
                }

                match deliver(session, record, template, renderer).await {
                    Ok(()) => {
                        report.sent += 1;
                        tracing::info!(
                            recipient = %record.email(),
                            uid = %record.unique_id(),
                            "Sent email"
                        );
                    }
                    Err(error) => {
                        report.failed += 1;
                        tracing::error!(
                            recipient = %record.email(),
                            uid = %record.unique_id(),
                            error = %error,
                            "Failed to send email"
                        );
                        report.failures.push(RecipientFailure {
                            unique_id: record.unique_id().clone(),
                            email: record.email().clone(),
                            error,
                        });
                    }
                }
            }

            if index + 1 < total_batches {
                if limit_hit(&report) {
                    tracing::info!(sent = report.sent, "Send limit reached. Stopping.");
                    report.limit_reached = true;
                    return report;
                }
                tracing::info!(
                    delay_seconds = self.options.inter_batch_delay.as_secs_f64(),
                    "Sleeping before next batch"
                );
                tokio::time::sleep(self.options.inter_batch_delay).await;
            }
        }

        report
    }
}

async fn deliver<S: Session, R: RenderBody>(
    session: &mut S,
    record: &RecipientRecord,
    template: &MessageTemplate<'_>,
    renderer: &R,
) -> Result<(), DeliveryError> {
    let html_body = renderer.render(record)?;
    let message = template.compose(record, html_body)?;
    session.send(message).await?;
    Ok(())
}
