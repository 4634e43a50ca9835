use std::path::{Path, PathBuf};

use minijinja::{Environment, ErrorKind};
use serde::Serialize;

use crate::domain::{DeliveryMode, MessageKind, RecipientRecord};

/// Produces the HTML body for one recipient.
pub trait RenderBody: Send + Sync {
    fn render(&self, record: &RecipientRecord) -> Result<String, RenderError>;
}

#[derive(thiserror::Error, Debug)]
pub enum RenderError {
    #[error("template {0} was not found")]
    TemplateNotFound(String),
    #[error("couldn't render template {name}, {source}")]
    Template {
        name: String,
        #[source]
        source: minijinja::Error,
    },
    #[error("couldn't render the message body, {0}")]
    Failed(String),
}

#[derive(Serialize)]
struct TemplateContext<'a> {
    recipient_email: &'a str,
    recipient_name: Option<&'a str>,
    campaign_id: u32,
    message_kind: MessageKind,
    delivery_mode: DeliveryMode,
}

impl<'a> From<&'a RecipientRecord> for TemplateContext<'a> {
    fn from(record: &'a RecipientRecord) -> Self {
        Self {
            recipient_email: record.email().as_ref(),
            recipient_name: record.display_name(),
            campaign_id: record.campaign_id(),
            message_kind: record.message_kind(),
            delivery_mode: record.delivery_mode(),
        }
    }
}

/// Jinja-style HTML template read from disk.
///
/// The template is looked up on every render, so a missing or broken file
/// shows up as a failure for each recipient rather than aborting the run.
pub struct TemplateRenderer {
    env: Environment<'static>,
    name: String,
}

impl TemplateRenderer {
    pub fn new(template_path: &Path) -> Self {
        let directory = template_path
            .parent()
            .filter(|parent| !parent.as_os_str().is_empty())
            .map(Path::to_path_buf)
            .unwrap_or_else(|| PathBuf::from("."));
        let name = template_path
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_default();

        let mut env = Environment::new();
        env.set_loader(minijinja::path_loader(directory));

        Self { env, name }
    }
}

impl RenderBody for TemplateRenderer {
    fn render(&self, record: &RecipientRecord) -> Result<String, RenderError> {
        let template = self.env.get_template(&self.name).map_err(|e| {
            if e.kind() == ErrorKind::TemplateNotFound {
                RenderError::TemplateNotFound(self.name.clone())
            } else {
                RenderError::Template {
                    name: self.name.clone(),
                    source: e,
                }
            }
        })?;
        template
            .render(TemplateContext::from(record))
            .map_err(|e| RenderError::Template {
                name: self.name.clone(),
                source: e,
            })
    }
}
