use std::{fmt, str::FromStr};

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DeliveryMode {
    #[default]
    #[serde(rename = "camp", alias = "campaign")]
    Campaign,
    Lead,
    Client,
    #[serde(rename = "adhoc", alias = "ad-hoc", alias = "ad_hoc")]
    AdHoc,
}

impl DeliveryMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            DeliveryMode::Campaign => "camp",
            DeliveryMode::Lead => "lead",
            DeliveryMode::Client => "client",
            DeliveryMode::AdHoc => "adhoc",
        }
    }
}

impl fmt::Display for DeliveryMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for DeliveryMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "camp" | "campaign" => Ok(DeliveryMode::Campaign),
            "lead" => Ok(DeliveryMode::Lead),
            "client" => Ok(DeliveryMode::Client),
            "adhoc" | "ad-hoc" | "ad_hoc" => Ok(DeliveryMode::AdHoc),
            other => Err(format!(
                "{} is not a supported delivery mode. Use either `camp`, `lead`, `client` or `adhoc`.",
                other
            )),
        }
    }
}
