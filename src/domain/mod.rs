mod delivery_mode;
mod message_kind;
mod recipient_email;
mod recipient_record;
mod unique_id;

pub use delivery_mode::DeliveryMode;
pub use message_kind::MessageKind;
pub use recipient_email::RecipientEmail;
pub use recipient_record::{NewRecipientRecord, RecipientRecord};
pub use unique_id::UniqueId;
