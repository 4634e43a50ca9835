use std::fmt;

use rand::Rng;

use super::{DeliveryMode, MessageKind};

/// Correlation id attached to a record for log lines. The random suffix is
/// only 16 bits wide, so two ids can collide; nothing relies on uniqueness.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UniqueId(String);

impl UniqueId {
    /// Builds `{mode}{campaign_id:04}_{kind}_{suffix}`, e.g. `camp1001_introduction_9f3a`.
    pub fn generate<R: Rng>(
        mode: DeliveryMode,
        campaign_id: u32,
        kind: MessageKind,
        rng: &mut R,
    ) -> Self {
        let suffix: u16 = rng.random();
        Self(format!(
            "{}{:04}_{}_{:04x}",
            mode.as_str(),
            campaign_id,
            kind.as_str(),
            suffix
        ))
    }

    /// Wraps an id assigned earlier so it survives reconstruction unchanged.
    pub fn existing(id: String) -> Result<Self, String> {
        if id.trim().is_empty() {
            Err("a unique id cannot be blank.".to_string())
        } else {
            Ok(Self(id))
        }
    }
}

impl AsRef<str> for UniqueId {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for UniqueId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}
