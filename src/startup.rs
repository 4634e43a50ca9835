use std::time::Duration;

use anyhow::Context;
use chrono::{DateTime, Utc};

use crate::{
    configuration::{CampaignSettings, Settings},
    dispatcher::{DispatchReport, Dispatcher},
    email_client::SmtpClient,
    loader::{LoadOutcome, load_from_path},
    renderer::TemplateRenderer,
    transport::Transport,
};

/// What a run reports once it is over, successful or not.
#[derive(Debug)]
pub struct RunSummary {
    pub total_rows: usize,
    pub skipped_rows: usize,
    pub processed: usize,
    pub sent: usize,
    pub failed: usize,
    pub elapsed: Duration,
}

impl RunSummary {
    pub fn new(
        load: &LoadOutcome,
        report: Option<&DispatchReport>,
        started_at: DateTime<Utc>,
    ) -> Self {
        let (sent, failed) = report.map(DispatchReport::counts).unwrap_or((0, 0));
        Self {
            total_rows: load.total_rows,
            skipped_rows: load.skipped.len(),
            processed: load.records.len(),
            sent,
            failed,
            elapsed: (Utc::now() - started_at).to_std().unwrap_or_default(),
        }
    }

    pub fn log(&self) {
        tracing::info!(
            total_rows = self.total_rows,
            skipped_rows = self.skipped_rows,
            processed = self.processed,
            sent = self.sent,
            failed = self.failed,
            elapsed_seconds = format!("{:.2}", self.elapsed.as_secs_f64()),
            "Summary report"
        );
    }
}

pub struct Application<T> {
    campaign: CampaignSettings,
    dispatcher: Dispatcher<T>,
    recipients: LoadOutcome,
}

impl Application<SmtpClient> {
    // Loading happens here so a bad recipients file stops the run before
    // any connection is made.
    pub fn build(configuration: Settings) -> anyhow::Result<Self> {
        let sender = configuration
            .smtp
            .sender()
            .context("Invalid sender email address.")?;
        let options = configuration
            .campaign
            .dispatch_options()
            .map_err(anyhow::Error::msg)?;
        let email_client = SmtpClient::from_settings(&configuration.smtp);
        let dispatcher = Dispatcher::new(email_client, sender, options)
            .with_plain_text_fallback(configuration.campaign.plain_text_fallback.clone());

        Self::with_dispatcher(configuration.campaign, dispatcher)
    }
}

impl<T: Transport> Application<T> {
    pub fn with_dispatcher(
        campaign: CampaignSettings,
        dispatcher: Dispatcher<T>,
    ) -> anyhow::Result<Self> {
        let recipients = load_from_path(&campaign.recipients_path, &campaign.load_defaults())
            .context("Failed to load recipients.")?;
        Ok(Self {
            campaign,
            dispatcher,
            recipients,
        })
    }

    /// Runs the campaign. The summary is logged even when the session could
    /// not be opened; the session error is then returned.
    pub async fn run(self) -> anyhow::Result<RunSummary> {
        let started_at = Utc::now();
        let renderer = TemplateRenderer::new(&self.campaign.template_path);

        let result = self
            .dispatcher
            .dispatch(
                &self.recipients.records,
                &self.campaign.subject,
                &renderer,
                self.campaign.attachment_path.as_deref(),
            )
            .await;

        let summary = RunSummary::new(&self.recipients, result.as_ref().ok(), started_at);
        summary.log();
        result.context("Campaign run failed.")?;
        Ok(summary)
    }
}
