use std::{fmt, str::FromStr};

use serde::{Deserialize, Serialize};

/// Where a message sits in the conversation with a recipient.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MessageKind {
    #[serde(alias = "intro")]
    Introduction,
    #[serde(alias = "follow_up", alias = "follow-up")]
    FollowUp,
    Reply,
}

impl MessageKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            MessageKind::Introduction => "introduction",
            MessageKind::FollowUp => "followup",
            MessageKind::Reply => "reply",
        }
    }
}

impl fmt::Display for MessageKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for MessageKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "introduction" | "intro" => Ok(MessageKind::Introduction),
            "followup" | "follow_up" | "follow-up" => Ok(MessageKind::FollowUp),
            "reply" => Ok(MessageKind::Reply),
            other => Err(format!(
                "{} is not a supported message kind. Use either `introduction`, `followup` or `reply`.",
                other
            )),
        }
    }
}
