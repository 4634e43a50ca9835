use std::{num::NonZeroUsize, path::PathBuf, time::Duration};

use lettre::{Address, message::Mailbox};
use secrecy::SecretString;
use serde_aux::field_attributes::{
    deserialize_number_from_string, deserialize_option_number_from_string,
};

use crate::{
    dispatcher::DispatchOptions,
    domain::{DeliveryMode, MessageKind},
    loader::LoadDefaults,
};

#[derive(serde::Deserialize)]
pub struct Settings {
    pub smtp: SmtpSettings,
    pub campaign: CampaignSettings,
}

#[derive(serde::Deserialize)]
pub struct SmtpSettings {
    pub host: String,
    #[serde(deserialize_with = "deserialize_number_from_string")]
    pub port: u16,
    pub username: String,
    pub password: SecretString,
    /// Defaults to the login name, which is what most providers expect.
    pub sender: Option<String>,
    pub sender_name: Option<String>,
    pub hello_name: String,
    #[serde(deserialize_with = "deserialize_number_from_string")]
    pub timeout_milliseconds: u64,
}

impl SmtpSettings {
    pub fn sender(&self) -> Result<Mailbox, lettre::address::AddressError> {
        let address: Address = self.sender.as_deref().unwrap_or(&self.username).parse()?;
        Ok(Mailbox::new(self.sender_name.clone(), address))
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_milliseconds)
    }
}

#[derive(serde::Deserialize, Clone)]
pub struct CampaignSettings {
    pub subject: String,
    pub template_path: PathBuf,
    pub recipients_path: PathBuf,
    pub attachment_path: Option<PathBuf>,
    pub plain_text_fallback: String,
    #[serde(deserialize_with = "deserialize_number_from_string")]
    pub campaign_id: u32,
    pub message_kind: MessageKind,
    #[serde(default)]
    pub delivery_mode: DeliveryMode,
    #[serde(default, deserialize_with = "deserialize_option_number_from_string")]
    pub max_total: Option<usize>,
    #[serde(deserialize_with = "deserialize_number_from_string")]
    pub batch_size: usize,
    #[serde(deserialize_with = "deserialize_number_from_string")]
    pub inter_batch_delay_seconds: u64,
}

impl CampaignSettings {
    pub fn dispatch_options(&self) -> Result<DispatchOptions, String> {
        let batch_size = NonZeroUsize::new(self.batch_size)
            .ok_or_else(|| "batch_size must be at least 1.".to_string())?;
        Ok(DispatchOptions {
            max_total: self.max_total,
            batch_size,
            inter_batch_delay: Duration::from_secs(self.inter_batch_delay_seconds),
        })
    }

    pub fn load_defaults(&self) -> LoadDefaults {
        LoadDefaults {
            campaign_id: self.campaign_id,
            message_kind: self.message_kind,
            delivery_mode: self.delivery_mode,
        }
    }
}

pub fn get_configuration() -> Result<Settings, config::ConfigError> {
    let base_path = std::env::current_dir().expect("Failed to determine the current directory");
    let configuration_directory = base_path.join("configuration");

    // Detect the running environment.
    // Default to `local` if unspecified.
    let environment: Environment = std::env::var("APP_ENVIRONMENT")
        .unwrap_or_else(|_| "local".into())
        .try_into()
        .expect("Failed to parse APP_ENVIRONMENT.");
    let environment_filename = format!("{}.yaml", environment.as_str());

    let settings = config::Config::builder()
        .add_source(config::File::from(
            configuration_directory.join("base.yaml"),
        ))
        .add_source(config::File::from(
            configuration_directory.join(environment_filename),
        ))
        // Add in settings from environment variables (with a prefix of APP and '__' as separator)
        // E.g. `APP_SMTP__PASSWORD=...` would set `Settings.smtp.password`
        .add_source(
            config::Environment::with_prefix("APP")
                .prefix_separator("_")
                .separator("__"),
        )
        .build()?;

    settings.try_deserialize::<Settings>()
}

/// The possible runtime environment for our application.
pub enum Environment {
    Local,
    Production,
}

impl Environment {
    pub fn as_str(&self) -> &'static str {
        match self {
            Environment::Local => "local",
            Environment::Production => "production",
        }
    }
}

impl TryFrom<String> for Environment {
    type Error = String;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        match s.to_lowercase().as_str() {
            "local" => Ok(Self::Local),
            "production" => Ok(Self::Production),
            other => Err(format!(
                "{} is not a supported environment. Use either `local` or `production`.",
                other
            )),
        }
    }
}
