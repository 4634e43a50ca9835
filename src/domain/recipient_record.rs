use rand::Rng;

use super::{DeliveryMode, MessageKind, RecipientEmail, UniqueId};

/// Unvalidated fields for one recipient, as they come out of a loader.
#[derive(Debug, Clone)]
pub struct NewRecipientRecord {
    pub email: String,
    pub display_name: Option<String>,
    pub campaign_id: u32,
    pub message_kind: MessageKind,
    pub delivery_mode: DeliveryMode,
    pub unique_id: Option<String>,
}

/// A recipient that passed validation. Fields are private so the record
/// cannot change once the pipeline holds it.
#[derive(Debug, Clone)]
pub struct RecipientRecord {
    email: RecipientEmail,
    display_name: Option<String>,
    campaign_id: u32,
    message_kind: MessageKind,
    delivery_mode: DeliveryMode,
    unique_id: UniqueId,
}

impl RecipientRecord {
    pub fn new<R: Rng>(fields: NewRecipientRecord, rng: &mut R) -> Result<Self, String> {
        let email = RecipientEmail::parse(fields.email)?;
        let display_name = fields
            .display_name
            .map(|name| name.trim().to_owned())
            .filter(|name| !name.is_empty());
        let unique_id = match fields.unique_id {
            Some(id) => UniqueId::existing(id)?,
            None => UniqueId::generate(
                fields.delivery_mode,
                fields.campaign_id,
                fields.message_kind,
                rng,
            ),
        };

        Ok(Self {
            email,
            display_name,
            campaign_id: fields.campaign_id,
            message_kind: fields.message_kind,
            delivery_mode: fields.delivery_mode,
            unique_id,
        })
    }

    pub fn email(&self) -> &RecipientEmail {
        &self.email
    }

    pub fn display_name(&self) -> Option<&str> {
        self.display_name.as_deref()
    }

    pub fn campaign_id(&self) -> u32 {
        self.campaign_id
    }

    pub fn message_kind(&self) -> MessageKind {
        self.message_kind
    }

    pub fn delivery_mode(&self) -> DeliveryMode {
        self.delivery_mode
    }

    pub fn unique_id(&self) -> &UniqueId {
        &self.unique_id
    }
}
