use serde::{Deserialize, Serialize};

use crate::address::Address;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AnonymityMode {
    Full,
    Semi,
    None,
}

/// A room as observed by the crawler.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RoomRecord {
    pub address: Address,
    #[serde(default)]
    pub nusers: Option<u32>,
    #[serde(default)]
    pub nusers_moving_average: Option<f64>,
    pub is_open: bool,
    #[serde(default)]
    pub is_hidden: bool,
    #[serde(default)]
    pub anonymity_mode: Option<AnonymityMode>,
}

impl RoomRecord {
    pub fn new(address: Address) -> Self {
        RoomRecord {
            address,
            nusers: None,
            nusers_moving_average: None,
            is_open: true,
            is_hidden: false,
            anonymity_mode: None,
        }
    }

    /// Occupants are visible to each other unless the room says otherwise.
    pub fn is_non_anonymous(&self) -> bool {
        matches!(self.anonymity_mode, None | Some(AnonymityMode::None))
    }
}

/// Disco#info projection of a publicly listed room.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PublicInfo {
    pub name: Option<String>,
    pub description: Option<String>,
    pub subject: Option<String>,
    pub language: Option<String>,
    pub web_chat_url: Option<String>,
    pub http_logs_url: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RenderOptions {
    pub keywords: Vec<String>,
    pub has_avatar: bool,
}

impl RenderOptions {
    pub fn with_keywords<I, S>(keywords: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        RenderOptions {
            keywords: keywords.into_iter().map(Into::into).collect(),
            has_avatar: false,
        }
    }
}

/// Treats empty strings like missing values.
pub(crate) fn non_empty(value: Option<&String>) -> Option<&str> {
    value.map(String::as_str).filter(|s| !s.is_empty())
}
